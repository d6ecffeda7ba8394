//! `QueryEngine` for `MemoryStore`.
//!
//! Operands that are (or coerce to) this store's native iterables combine
//! into native plans. Anything else falls back to restartable sequences
//! that evaluate when traversed.

use crate::{
    db::{
        engine::QueryEngine,
        memory::{
            MemoryStore,
            iterable::{MemoryIterable, MemoryProjection},
            plan::{self, Plan},
        },
        query::predicate::QueryNode,
        source::{
            AdHoc, Projection, ProjectionFn, ProjectionIter, RecordIter, Source, distinct_iter,
        },
    },
    error::InternalError,
    types::Record,
};
use std::{collections::HashSet, iter, rc::Rc};

impl MemoryStore {
    /// Plan behind `source`, when it is native to this store or a
    /// collection of durable records.
    fn native_plan(&self, source: &Source) -> Option<Rc<Plan>> {
        match source {
            Source::Native(handle) => handle
                .as_any()
                .downcast_ref::<MemoryIterable>()
                .filter(|iterable| iterable.belongs_to(self))
                .map(|iterable| Rc::clone(iterable.plan())),
            Source::AdHoc(AdHoc::Collection(records)) => {
                let state = self.state();
                records
                    .iter()
                    .all(|record| state.is_durable(*record))
                    .then(|| Rc::new(Plan::Records(Rc::clone(records))))
            }
            Source::AdHoc(AdHoc::Sequence(_)) => None,
        }
    }

    fn native_pair(&self, left: &Source, right: &Source) -> Option<(Rc<Plan>, Rc<Plan>)> {
        Some((self.native_plan(left)?, self.native_plan(right)?))
    }

    fn collect(source: &Source) -> Result<Vec<Record>, InternalError> {
        source.iter().collect()
    }
}

impl QueryEngine for MemoryStore {
    fn union(&self, left: &Source, right: &Source) -> Source {
        if let Some((l, r)) = self.native_pair(left, right) {
            return self.native(Plan::Union(l, r));
        }

        let (left, right) = (left.clone(), right.clone());
        Source::sequence(move || Box::new(distinct_iter(left.iter().chain(right.iter()))))
    }

    fn intersect(&self, left: &Source, right: &Source) -> Source {
        if let Some((l, r)) = self.native_pair(left, right) {
            return self.native(Plan::Intersect(l, r));
        }

        filter_against(left, right, true)
    }

    fn exclude(&self, left: &Source, right: &Source) -> Source {
        if let Some((l, r)) = self.native_pair(left, right) {
            return self.native(Plan::Exclude(l, r));
        }

        filter_against(left, right, false)
    }

    fn concat(&self, left: &Source, right: &Source) -> Source {
        if let Some((l, r)) = self.native_pair(left, right) {
            return self.native(Plan::Concat(l, r));
        }

        let (left, right) = (left.clone(), right.clone());
        Source::sequence(move || Box::new(left.iter().chain(right.iter())))
    }

    fn select_distinct(&self, source: &Source, link: &str) -> Projection {
        self.project(source, link)
    }

    // Link sets and single links share storage; only cardinality differs.
    fn select_many_distinct(&self, source: &Source, link: &str) -> Projection {
        self.project(source, link)
    }

    fn query(&self, source: &Source, entity_name: &str, node: &QueryNode) -> Source {
        if let Some(input) = self.native_plan(source) {
            return self.native(Plan::Node {
                input,
                entity: entity_name.to_string(),
                node: node.clone(),
            });
        }

        let store = self.clone();
        let source = source.clone();
        let entity = entity_name.to_string();
        let node = node.clone();

        Source::sequence(move || {
            let result = Self::collect(&source).and_then(|records| {
                plan::apply_node(&store.state(), store.registry(), &entity, &node, records)
            });
            plan::into_record_iter(result)
        })
    }

    fn to_native_or_passthrough(&self, source: &Source) -> Source {
        match (source, self.native_plan(source)) {
            (Source::AdHoc(_), Some(plan)) => self.native_rc(plan),
            _ => source.clone(),
        }
    }
}

impl MemoryStore {
    fn project(&self, source: &Source, link: &str) -> Projection {
        if let Some(input) = self.native_plan(source) {
            return Projection::Native(Rc::new(MemoryProjection::new(
                self.clone(),
                input,
                link.to_string(),
            )));
        }

        let store = self.clone();
        let source = source.clone();
        let link = link.to_string();

        Projection::AdHoc(ProjectionFn::new(move || -> ProjectionIter {
            let projected = Self::collect(&source)
                .and_then(|records| plan::project(&store.state(), &records, &link));

            match projected {
                Ok(targets) => Box::new(targets.into_iter().map(Ok::<_, InternalError>)),
                Err(err) => Box::new(iter::once(Err(err))),
            }
        }))
    }
}

// Distinct records of `left` whose membership in `right` equals `keep`.
fn filter_against(left: &Source, right: &Source, keep: bool) -> Source {
    let (left, right) = (left.clone(), right.clone());

    Source::sequence(move || -> RecordIter {
        let other: HashSet<Record> = match MemoryStore::collect(&right) {
            Ok(records) => records.into_iter().collect(),
            Err(err) => return Box::new(iter::once(Err(err))),
        };

        Box::new(distinct_iter(left.iter().filter(move |item| match item {
            Ok(record) => other.contains(record) == keep,
            Err(_) => true,
        })))
    })
}
