use super::{seeded, titles};
use crate::{
    db::{query::predicate::Predicate, source::SourceKind},
    test_fixtures::{Bug, Issue, Project, Tracker},
    traits::EntityKind,
};
use std::collections::HashSet;

fn set(issues: Vec<Issue>) -> HashSet<Issue> {
    issues.into_iter().collect()
}

#[test]
fn union_and_exclude_follow_set_semantics() {
    let (t, [a, b, c]) = seeded();

    let union = t.db.query_of([&a, &b]).union(&t.db.query_of([&b, &c]));
    assert_eq!(union.size().unwrap(), 3);
    assert_eq!(union.to_set().unwrap(), set(vec![a, b, c]));

    let excluded = t.db.query_of([&a, &b]).exclude(&t.db.query_of([&b]));
    assert_eq!(excluded.to_vec().unwrap(), vec![a]);
}

#[test]
fn intersect_keeps_shared_records() {
    let (t, [a, b, c]) = seeded();

    let both = t.db.query_of([&a, &b]).intersect(&t.db.query_of([&b, &c]));
    assert_eq!(both.to_vec().unwrap(), vec![b]);
}

#[test]
fn query_of_collapses_duplicates_in_first_occurrence_order() {
    let (t, [a, b, _]) = seeded();

    let query = t.db.query_of([&a, &b, &b]).distinct();
    assert_eq!(query.to_vec().unwrap(), vec![a, b]);
}

#[test]
fn query_of_stays_flat_for_large_inputs() {
    const COUNT: usize = 50_000;

    let t = Tracker::new();
    let issues: Vec<Issue> = (0..COUNT)
        .map(|_| t.store.create::<Issue>().unwrap())
        .collect();
    t.store.flush();

    let durable = t.db.query_of(issues.iter().chain(issues.iter()));
    assert_eq!(durable.kind(), SourceKind::Native);
    assert_eq!(durable.size().unwrap(), COUNT);
    assert_eq!(durable.explain(), format!("tracker::Issue: Records({COUNT})"));

    let drafts: Vec<Issue> = (0..3).map(|i| t.issue(&format!("draft-{i}"), None)).collect();
    let mixed = t.db.query_of(issues.iter().chain(&drafts).chain(&drafts));
    assert_eq!(mixed.kind(), SourceKind::AdHoc);
    assert_eq!(mixed.size().unwrap(), COUNT + drafts.len());
    assert_eq!(mixed.first().unwrap(), issues[0]);
}

#[test]
fn concat_retains_duplicates_and_operand_order() {
    let (t, [a, b, c]) = seeded();
    let left = t.db.query_from_records::<Issue>([c.record(), a.record()]);
    let right = t.db.query_of([&a, &b]);

    let joined = left.concat(&right);
    assert_eq!(joined.to_vec().unwrap(), vec![c, a, a, b]);
    assert_eq!(joined.size().unwrap(), 4);

    let added = &left + &right;
    assert_eq!(added.to_vec().unwrap(), joined.to_vec().unwrap());
}

#[test]
fn single_element_variants_treat_none_as_identity() {
    let (t, [a, b, _]) = seeded();
    let base = t.db.query_of([&a]);

    assert_eq!(base.union_one(None).to_vec().unwrap(), vec![a]);
    assert_eq!(base.union_one(Some(&b)).to_vec().unwrap(), vec![a, b]);
    assert_eq!(base.exclude_one(None).to_vec().unwrap(), vec![a]);
    assert!(base.exclude_one(Some(&a)).is_empty().unwrap());
    assert_eq!(base.concat_one(Some(&a)).to_vec().unwrap(), vec![a, a]);
}

#[test]
fn unflushed_records_compose_through_ad_hoc_sources() {
    let (t, [a, _, _]) = seeded();
    let draft = t.issue("draft", Some(9));

    let union = t.db.query_of([&a, &draft]);
    assert_eq!(union.kind(), SourceKind::AdHoc);
    assert_eq!(union.to_set().unwrap(), set(vec![a, draft]));

    let high = union.filter(Issue::PRIORITY.gt(5));
    assert_eq!(high.to_vec().unwrap(), vec![draft]);

    let without = union.exclude(&t.db.query_of([&draft]));
    assert_eq!(without.to_vec().unwrap(), vec![a]);

    let shared = union.intersect(&t.db.all::<Issue>());
    assert_eq!(shared.to_vec().unwrap(), vec![a]);
}

#[test]
fn instance_filters_narrow_and_exclude_subtypes() {
    let t = Tracker::new();
    let issue = t.issue("plain", None);
    let bug = t.bug("crash");
    t.store.flush();

    let bugs = t.db.all::<Issue>().filter_is_instance::<Bug>();
    assert_eq!(bugs.to_vec().unwrap(), vec![bug]);
    assert_eq!(bugs.entity_type().physical_name(), "Bug");

    t.store.set(&bug, Bug::SEVERITY, 3).unwrap();
    assert_eq!(bugs.size_where(Bug::SEVERITY.gte(2)).unwrap(), 1);
    assert_eq!(bugs.size_where(Bug::TITLE.eq("plain")).unwrap(), 0);

    let plain = t.db.all::<Issue>().filter_is_not_instance::<Bug>();
    assert_eq!(plain.to_vec().unwrap(), vec![issue]);
}

#[test]
fn filters_combine_predicates() {
    let (t, [a, _, c]) = seeded();

    let query = t
        .db
        .query::<Issue>(Issue::PRIORITY.lt(2) | Issue::TITLE.eq("c"));
    assert_eq!(query.to_vec().unwrap(), vec![a, c]);

    let none = t.db.query::<Issue>(Issue::PRIORITY.gt(1) & Issue::TITLE.eq("a"));
    assert!(none.none().unwrap());

    let listed = t.db.query::<Issue>(Issue::PRIORITY.in_list([3, 1]));
    assert_eq!(listed.size().unwrap(), 2);
}

#[test]
fn sort_is_stable_with_nulls_last_both_ways() {
    let t = Tracker::new();
    t.issue("n1", None);
    t.issue("low", Some(1));
    t.issue("tie1", Some(2));
    t.issue("n2", None);
    t.issue("tie2", Some(2));
    t.store.flush();

    let asc = t.db.all::<Issue>().sorted_by(Issue::PRIORITY, true);
    assert_eq!(titles(&t, &asc), ["low", "tie1", "tie2", "n1", "n2"]);

    let desc = t.db.all::<Issue>().sorted_by(Issue::PRIORITY, false);
    assert_eq!(titles(&t, &desc), ["tie1", "tie2", "low", "n1", "n2"]);
}

#[test]
fn ad_hoc_sort_keeps_nulls_last_both_ways() {
    let t = Tracker::new();
    let n1 = t.issue("n1", None);
    let low = t.issue("low", Some(1));
    t.store.flush();
    let tie1 = t.issue("tie1", Some(2));
    let n2 = t.issue("n2", None);
    let tie2 = t.issue("tie2", Some(2));

    let drafts = t.db.query_from_records::<Issue>(
        [n1, low, tie1, n2, tie2].iter().map(EntityKind::record),
    );

    let asc = drafts.sorted_by(Issue::PRIORITY, true);
    assert_eq!(asc.kind(), SourceKind::AdHoc);
    assert_eq!(titles(&t, &asc), ["low", "tie1", "tie2", "n1", "n2"]);

    let desc = drafts.sorted_by(Issue::PRIORITY, false);
    assert_eq!(desc.kind(), SourceKind::AdHoc);
    assert_eq!(titles(&t, &desc), ["tie1", "tie2", "low", "n1", "n2"]);
}

#[test]
fn link_sort_orders_by_target_property() {
    let t = Tracker::new();
    let zed = t.project("zed");
    let alpha = t.project("alpha");
    let first = t.issue("first", None);
    let second = t.issue("second", None);
    let orphan = t.issue("orphan", None);
    t.store.set_link(&first, Issue::PROJECT, Some(&zed)).unwrap();
    t.store.set_link(&second, Issue::PROJECT, Some(&alpha)).unwrap();
    t.store.flush();

    let asc = t
        .db
        .all::<Issue>()
        .sorted_by_link(Issue::PROJECT, Project::NAME, true);
    assert_eq!(asc.to_vec().unwrap(), vec![second, first, orphan]);

    let desc = t
        .db
        .all::<Issue>()
        .sorted_by_link(Issue::PROJECT, Project::NAME, false);
    assert_eq!(desc.to_vec().unwrap(), vec![first, second, orphan]);
}

#[test]
fn slicing_works_on_both_shapes() {
    let (t, [a, b, c]) = seeded();

    let native = t.db.all::<Issue>();
    assert_eq!(native.drop(1).take(1).to_vec().unwrap(), vec![b]);
    assert_eq!(native.drop(1).kind(), SourceKind::Native);
    assert!(native.take(0).is_empty().unwrap());
    assert!(native.drop(3).is_empty().unwrap());

    let draft = t.issue("draft", None);
    let ad_hoc = t
        .db
        .query_from_records::<Issue>([c.record(), draft.record(), a.record()]);
    assert_eq!(ad_hoc.drop(1).kind(), SourceKind::AdHoc);
    assert_eq!(ad_hoc.drop(1).to_vec().unwrap(), vec![draft, a]);
    assert_eq!(ad_hoc.take(2).to_vec().unwrap(), vec![c, draft]);
    assert!(ad_hoc.drop(10).is_empty().unwrap());
}

#[test]
fn ad_hoc_distinct_keeps_first_occurrences() {
    let (t, [a, b, _]) = seeded();
    let draft = t.issue("draft", None);

    let query = t.db.query_from_records::<Issue>([
        draft.record(),
        b.record(),
        draft.record(),
        a.record(),
        b.record(),
    ]);
    assert_eq!(query.distinct().to_vec().unwrap(), vec![draft, b, a]);
}

#[test]
fn durable_collections_use_native_operators() {
    let (t, [a, b, _]) = seeded();

    let query = t
        .db
        .query_from_records::<Issue>([b.record(), a.record(), b.record()]);
    assert_eq!(query.kind(), SourceKind::AdHoc);

    let distinct = query.distinct();
    assert_eq!(distinct.kind(), SourceKind::Native);
    assert_eq!(distinct.to_vec().unwrap(), vec![b, a]);
}

#[test]
fn composition_never_touches_the_store() {
    let (t, _) = seeded();

    // Unknown fields only fail once evaluated.
    let query = t
        .db
        .all::<Issue>()
        .filter(Predicate::is_null("missing"))
        .drop(2)
        .distinct();

    assert!(query.to_vec().is_err());
}
