use crate::{
    db::mutation::MutableQuery,
    error::ErrorClass,
    test_fixtures::{Issue, Tracker, User},
    traits::EntityKind,
    types::Record,
};

fn ghost() -> User {
    User::from_record(Record::from_u128(9_999))
}

#[test]
fn add_all_and_remove_all_apply_in_order() {
    let t = Tracker::new();
    let issue = t.issue("one", None);
    let ann = t.user("ann");
    let bob = t.user("bob");
    let cid = t.user("cid");
    let watchers = t.store.link_set(&issue, Issue::WATCHERS);

    watchers.add_all([cid, ann, bob, ann]).unwrap();
    assert_eq!(watchers.targets().unwrap(), vec![cid, ann, bob]);

    watchers.remove_all([ann, cid]).unwrap();
    assert_eq!(watchers.targets().unwrap(), vec![bob]);

    watchers.add_all([]).unwrap();
    watchers.remove_all([]).unwrap();
    assert_eq!(watchers.targets().unwrap(), vec![bob]);
}

#[test]
fn failed_add_keeps_earlier_elements() {
    let t = Tracker::new();
    let issue = t.issue("one", None);
    let ann = t.user("ann");
    let bob = t.user("bob");
    let watchers = t.store.link_set(&issue, Issue::WATCHERS);

    let err = watchers.add_all([ann, ghost(), bob]).unwrap_err();
    assert_eq!(err.class, ErrorClass::NotFound);
    assert_eq!(watchers.targets().unwrap(), vec![ann]);
}

#[test]
fn query_driven_edits_pull_lazily() {
    let t = Tracker::new();
    let issue = t.issue("one", None);
    let ann = t.user("ann");
    let bob = t.user("bob");
    let cid = t.user("cid");
    t.store.flush();
    let watchers = t.store.link_set(&issue, Issue::WATCHERS);

    watchers.add_all_query(&t.db.all::<User>()).unwrap();
    assert_eq!(watchers.targets().unwrap(), vec![ann, bob, cid]);

    let named = t.db.query::<User>(User::NAME.ne("bob"));
    watchers.remove_all_query(&named).unwrap();
    assert_eq!(watchers.targets().unwrap(), vec![bob]);

    watchers.add_all_query(&t.db.empty_query()).unwrap();
    assert_eq!(watchers.targets().unwrap(), vec![bob]);
}

#[test]
fn query_over_the_edited_link_sees_each_traversal_fresh() {
    let t = Tracker::new();
    let owner = t.issue("owner", None);
    let other = t.issue("other", None);
    let ann = t.user("ann");
    let bob = t.user("bob");
    t.store.flush();

    t.store
        .link_set(&owner, Issue::WATCHERS)
        .add_all([ann, bob])
        .unwrap();

    // Copy owner's watchers onto other through a lazy projection.
    let source = t.db.query_of([&owner]).flat_map_distinct(Issue::WATCHERS);
    let target = t.store.link_set(&other, Issue::WATCHERS);
    target.add_all_query(&source).unwrap();

    assert_eq!(target.targets().unwrap(), vec![ann, bob]);
}

#[test]
fn traversal_failures_abort_query_edits() {
    let t = Tracker::new();
    let issue = t.issue("one", None);
    let ann = t.user("ann");
    t.store.flush();

    let with_ghost = t
        .db
        .query_from_records::<User>([ann.record(), ghost().record()]);
    let watchers = t.store.link_set(&issue, Issue::WATCHERS);

    assert!(watchers.add_all_query(&with_ghost).is_err());
    assert_eq!(watchers.targets().unwrap(), vec![ann]);
}
