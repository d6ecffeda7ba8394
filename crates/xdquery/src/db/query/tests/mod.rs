mod algebra;
mod materialize;
mod mutation;

use crate::{
    db::query::TypedQuery,
    test_fixtures::{Issue, Tracker},
};

/// Three flushed issues `a`, `b`, `c` with priorities 1..=3.
fn seeded() -> (Tracker, [Issue; 3]) {
    let t = Tracker::new();
    let a = t.issue("a", Some(1));
    let b = t.issue("b", Some(2));
    let c = t.issue("c", Some(3));
    t.store.flush();

    (t, [a, b, c])
}

fn titles(t: &Tracker, query: &TypedQuery<Issue>) -> Vec<String> {
    query
        .to_vec()
        .expect("traversal")
        .iter()
        .map(|issue| {
            t.store
                .get(issue, Issue::TITLE)
                .expect("read title")
                .unwrap_or_default()
        })
        .collect()
}
