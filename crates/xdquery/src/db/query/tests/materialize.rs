use super::seeded;
use crate::{
    db::{query::OptionalQueryExt, source::Source},
    error::{ErrorClass, ErrorOrigin, InternalError},
    test_fixtures::{Issue, Tracker},
    traits::EntityKind,
    types::Record,
};

#[test]
fn first_family_distinguishes_empty_from_failure() {
    let (t, [a, _, _]) = seeded();

    assert_eq!(t.db.query_of([&a]).first().unwrap(), a);
    assert_eq!(t.db.empty_query::<Issue>().first_or_none().unwrap(), None);

    let err = t.db.empty_query::<Issue>().first().unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.origin, ErrorOrigin::Response);
}

#[test]
fn single_family_requires_uniqueness() {
    let (t, [a, b, _]) = seeded();

    assert_eq!(t.db.query_of([&a]).single().unwrap(), a);
    assert_eq!(t.db.query_of([&a]).single_or_none().unwrap(), Some(a));
    assert_eq!(t.db.empty_query::<Issue>().single_or_none().unwrap(), None);

    assert!(t.db.empty_query::<Issue>().single().unwrap_err().is_not_found());
    assert!(t.db.query_of([&a, &b]).single().unwrap_err().is_not_unique());
    assert!(
        t.db.query_of([&a, &b])
            .single_or_none()
            .unwrap_err()
            .is_not_unique()
    );
}

#[test]
fn predicate_variants_pre_filter() {
    let (t, [a, b, c]) = seeded();
    let all = t.db.all::<Issue>();

    assert!(all.any_where(Issue::PRIORITY.gte(3)).unwrap());
    assert!(all.none_where(Issue::PRIORITY.gt(3)).unwrap());
    assert_eq!(all.first_where(Issue::PRIORITY.gt(1)).unwrap(), b);
    assert_eq!(all.first_or_none_where(Issue::PRIORITY.gt(5)).unwrap(), None);
    assert_eq!(all.single_where(Issue::TITLE.eq("c")).unwrap(), c);
    assert_eq!(
        all.single_or_none_where(Issue::TITLE.eq("a")).unwrap(),
        Some(a)
    );
    assert!(all.single_where(Issue::PRIORITY.lt(3)).is_err());
    assert_eq!(all.size_where(Issue::PRIORITY.ne(2)).unwrap(), 2);
}

#[test]
fn index_of_and_contains_cover_every_shape() {
    let (t, [a, b, c]) = seeded();
    let draft = t.issue("draft", None);

    let native = t.db.all::<Issue>();
    assert_eq!(native.index_of(Some(&c)).unwrap(), Some(2));
    assert_eq!(native.index_of(Some(&draft)).unwrap(), None);
    assert_eq!(native.index_of(None).unwrap(), None);
    assert!(native.contains(Some(&b)).unwrap());
    assert!(!native.contains(None).unwrap());

    let collection = t
        .db
        .query_from_records::<Issue>([draft.record(), b.record()]);
    assert!(collection.contains(Some(&draft)).unwrap());
    assert!(!collection.contains(Some(&a)).unwrap());
    assert_eq!(collection.index_of(Some(&b)).unwrap(), Some(1));

    let sequence = collection.drop(1);
    assert!(sequence.contains(Some(&b)).unwrap());
    assert!(!sequence.contains(Some(&draft)).unwrap());
    assert!(sequence.contains_record(Some(b.record())).unwrap());
}

#[test]
fn element_at_reads_by_position() {
    let (t, [a, _, c]) = seeded();
    let draft = t.issue("draft", None);

    assert_eq!(t.db.all::<Issue>().element_at(2).unwrap(), c);

    let ad_hoc = t
        .db
        .query_from_records::<Issue>([draft.record(), a.record()]);
    assert_eq!(ad_hoc.element_at(1).unwrap(), a);

    let err = ad_hoc.element_at(2).unwrap_err();
    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert_eq!(err.origin, ErrorOrigin::Query);
}

#[test]
fn sizes_agree_across_shapes() {
    let (t, [a, b, c]) = seeded();
    let draft = t.issue("draft", None);

    let native = t.db.all::<Issue>();
    assert_eq!(native.size().unwrap(), 3);
    assert_eq!(native.rough_size().unwrap(), 3);

    let collection = t
        .db
        .query_from_records::<Issue>([a.record(), draft.record(), a.record()]);
    assert_eq!(collection.size().unwrap(), 3);
    assert_eq!(collection.rough_size().unwrap(), 3);

    let sequence = collection.distinct();
    assert_eq!(sequence.size().unwrap(), 2);
    assert_eq!(sequence.rough_size().unwrap(), 2);

    let empty = t.db.query_from_records::<Issue>([]);
    assert!(empty.is_empty().unwrap());
    assert!(!t.db.query_of([&b, &c]).is_empty().unwrap());
    assert!(sequence.is_not_empty().unwrap());
}

#[test]
fn absent_queries_read_as_empty() {
    let (t, _) = seeded();
    let none: Option<&crate::db::query::TypedQuery<Issue>> = None;

    assert_eq!(none.size().unwrap(), 0);
    assert_eq!(none.rough_size().unwrap(), 0);
    assert!(none.is_empty().unwrap());
    assert!(!none.is_not_empty().unwrap());

    let all = t.db.all::<Issue>();
    assert_eq!(Some(&all).size().unwrap(), 3);
    assert!(Some(&all).is_not_empty().unwrap());
}

#[test]
fn collections_materialize_in_traversal_order() {
    let (t, [a, b, c]) = seeded();
    let query = t
        .db
        .query_from_records::<Issue>([c.record(), a.record(), b.record()]);

    assert_eq!(query.to_vec().unwrap(), vec![c, a, b]);
    assert_eq!(
        query
            .to_sorted_vec_by(|x, y| x.record().cmp(&y.record()))
            .unwrap(),
        vec![a, b, c]
    );

    let response = query.load().unwrap();
    assert_eq!(response.count(), 3);
    assert_eq!(response.first(), Some(c));

    let mut seen = Vec::new();
    for issue in &query {
        seen.push(issue.unwrap());
    }
    assert_eq!(seen, vec![c, a, b]);
}

#[test]
fn traversals_restart_against_current_state() {
    let (t, _) = seeded();
    let all = t.db.all::<Issue>();
    assert_eq!(all.size().unwrap(), 3);

    t.issue("late", None);
    t.store.flush();

    assert_eq!(all.size().unwrap(), 4);
    assert_eq!(all.to_vec().unwrap().len(), 4);
}

#[test]
fn engine_failures_pass_through_unchanged() {
    let t = Tracker::new();
    let failing = Source::sequence(|| {
        let items: Vec<Result<Record, InternalError>> = vec![
            Ok(Record::from_u128(1)),
            Err(InternalError::store_not_found("boom")),
        ];
        Box::new(items.into_iter())
    });
    let query = t.db.as_query::<Issue>(Some(failing));

    let err = query.size().unwrap_err();
    assert_eq!(err.class, ErrorClass::NotFound);
    assert_eq!(err.origin, ErrorOrigin::Store);
    assert!(!err.is_not_found());

    assert!(query.to_vec().is_err());
    assert!(query.rough_size().is_err());
    assert!(query.single().is_err());
    assert_eq!(query.first().unwrap().record(), Record::from_u128(1));
}
