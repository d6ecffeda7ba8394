//! Terminal calls: the only place a query touches the store.
//!
//! Emptiness is a value here, never an error: only `first`, `single`,
//! and `element_at` fail on shape, and engine failures pass through as-is.

use crate::{
    db::{
        query::{QueryIter, TypedQuery, predicate::QueryNode},
        response::{Response, ResponseError},
        source::{AdHoc, Source},
    },
    error::InternalError,
    obs::sink::{self, MaterializeKind, MetricsEvent},
    traits::EntityKind,
    types::Record,
};
use std::{cmp::Ordering, collections::HashSet};

impl<E: EntityKind> TypedQuery<E> {
    // Record one terminal call against `source`.
    fn observe(&self, kind: MaterializeKind, source: &Source) {
        let shape = self.db.engine().classify(source);
        sink::record(MetricsEvent::Materialize {
            kind,
            shape,
            entity_path: self.entity_type.path(),
        });

        if self.db.is_debug() {
            self.db.debug_log(format!(
                "{kind:?} {shape:?} {} plan={} fp={}",
                self.entity_type.path(),
                source.explain(),
                self.fingerprint(),
            ));
        }
    }

    fn native_or_passthrough(&self) -> Source {
        self.db.engine().to_native_or_passthrough(&self.source)
    }

    // Full traversal count for sources without index support.
    fn brute_force_count(&self, source: &Source) -> Result<usize, InternalError> {
        let mut rows = 0usize;
        for item in source.iter() {
            item?;
            rows += 1;
        }

        sink::record(MetricsEvent::BruteForceCount {
            entity_path: self.entity_type.path(),
            rows: u64::try_from(rows).unwrap_or(u64::MAX),
        });
        self.db
            .debug_log(format!("brute force count of {}: {rows}", self.entity_type.path()));

        Ok(rows)
    }

    //
    // Enumeration
    //

    /// Lazy traversal; each call starts over against the current store.
    #[must_use]
    pub fn iter(&self) -> QueryIter<E> {
        self.observe(MaterializeKind::Enumerate, &self.source);

        QueryIter::new(self.source.iter())
    }

    pub fn to_vec(&self) -> Result<Vec<E>, InternalError> {
        self.iter().collect()
    }

    pub fn to_set(&self) -> Result<HashSet<E>, InternalError> {
        self.iter().collect()
    }

    pub fn to_sorted_vec_by(
        &self,
        compare: impl FnMut(&E, &E) -> Ordering,
    ) -> Result<Vec<E>, InternalError> {
        let mut entities = self.to_vec()?;
        entities.sort_by(compare);

        Ok(entities)
    }

    /// Materialize into a `Response`.
    pub fn load(&self) -> Result<Response<E>, InternalError> {
        Ok(Response::new(self.to_vec()?))
    }

    //
    // Cardinality
    //

    /// Exact size: native index size, collection length, or full traversal.
    pub fn size(&self) -> Result<usize, InternalError> {
        self.observe(MaterializeKind::Size, &self.source);

        match &self.source {
            Source::Native(native) => native.size(),
            Source::AdHoc(AdHoc::Collection(records)) => Ok(records.len()),
            seq @ Source::AdHoc(AdHoc::Sequence(_)) => self.brute_force_count(seq),
        }
    }

    pub fn size_where(&self, node: impl Into<QueryNode>) -> Result<usize, InternalError> {
        self.filter(node).size()
    }

    /// Cheap estimate for display purposes; native sizes may be stale.
    pub fn rough_size(&self) -> Result<usize, InternalError> {
        let source = self.native_or_passthrough();
        self.observe(MaterializeKind::RoughSize, &source);

        match &source {
            Source::Native(native) => Ok(native.rough_size()),
            Source::AdHoc(AdHoc::Collection(records)) => Ok(records.len()),
            seq @ Source::AdHoc(AdHoc::Sequence(_)) => self.brute_force_count(seq),
        }
    }

    pub fn is_empty(&self) -> Result<bool, InternalError> {
        if let Source::AdHoc(AdHoc::Collection(records)) = &self.source {
            self.observe(MaterializeKind::IsEmpty, &self.source);
            return Ok(records.is_empty());
        }

        let source = self.native_or_passthrough();
        self.observe(MaterializeKind::IsEmpty, &source);

        match &source {
            Source::Native(native) => native.is_empty(),
            ad_hoc @ Source::AdHoc(_) => Ok(ad_hoc.iter().next().transpose()?.is_none()),
        }
    }

    pub fn is_not_empty(&self) -> Result<bool, InternalError> {
        Ok(!self.is_empty()?)
    }

    //
    // Membership
    //

    /// Position of `entity`; `None` when absent or when no entity is given.
    pub fn index_of(&self, entity: Option<&E>) -> Result<Option<usize>, InternalError> {
        self.index_of_record(entity.map(E::record))
    }

    pub fn index_of_record(&self, record: Option<Record>) -> Result<Option<usize>, InternalError> {
        let Some(record) = record else {
            return Ok(None);
        };

        let source = self.native_or_passthrough();
        self.observe(MaterializeKind::IndexOf, &source);

        match &source {
            Source::Native(native) => native.index_of(record),
            ad_hoc @ Source::AdHoc(_) => {
                for (i, item) in ad_hoc.iter().enumerate() {
                    if item? == record {
                        return Ok(Some(i));
                    }
                }
                Ok(None)
            }
        }
    }

    pub fn contains(&self, entity: Option<&E>) -> Result<bool, InternalError> {
        self.contains_record(entity.map(E::record))
    }

    pub fn contains_record(&self, record: Option<Record>) -> Result<bool, InternalError> {
        if let Source::AdHoc(AdHoc::Collection(records)) = &self.source {
            return Ok(record.is_some_and(|record| records.contains(&record)));
        }

        Ok(self.index_of_record(record)?.is_some())
    }

    /// Element at `index`; slow outside native sources.
    pub fn element_at(&self, index: usize) -> Result<E, InternalError> {
        sink::record(MetricsEvent::SlowElementAccess {
            entity_path: self.entity_type.path(),
            index: u64::try_from(index).unwrap_or(u64::MAX),
        });

        let source = self.native_or_passthrough();
        self.observe(MaterializeKind::ElementAt, &source);

        let found = match &source {
            Source::Native(native) => native.skip(index).first()?,
            ad_hoc @ Source::AdHoc(_) => ad_hoc.iter().nth(index).transpose()?,
        };

        found.map(E::from_record).ok_or_else(|| {
            InternalError::query_invariant(format!(
                "element index {index} out of bounds for {}",
                self.entity_type.path()
            ))
        })
    }

    //
    // First / single
    //

    /// First element; fails with `NotFound` when empty.
    pub fn first(&self) -> Result<E, InternalError> {
        self.first_or_none()?.ok_or_else(|| {
            ResponseError::NotFound {
                entity: self.entity_type.path(),
            }
            .into()
        })
    }

    pub fn first_or_none(&self) -> Result<Option<E>, InternalError> {
        let source = self.native_or_passthrough();
        self.observe(MaterializeKind::First, &source);

        let first = match &source {
            Source::Native(native) => native.first()?,
            ad_hoc @ Source::AdHoc(_) => ad_hoc.iter().next().transpose()?,
        };

        Ok(first.map(E::from_record))
    }

    /// Exactly one element; `NotFound` on zero, `NotUnique` on more.
    pub fn single(&self) -> Result<E, InternalError> {
        self.single_or_none()?.ok_or_else(|| {
            ResponseError::NotFound {
                entity: self.entity_type.path(),
            }
            .into()
        })
    }

    /// At most one element; `NotUnique` on more.
    pub fn single_or_none(&self) -> Result<Option<E>, InternalError> {
        let mut iter = self.iter();
        let Some(first) = iter.next().transpose()? else {
            return Ok(None);
        };
        if iter.next().transpose()?.is_some() {
            return Err(ResponseError::NotUnique {
                entity: self.entity_type.path(),
            }
            .into());
        }

        Ok(Some(first))
    }

    //
    // Quantifiers
    //

    pub fn any(&self) -> Result<bool, InternalError> {
        self.is_not_empty()
    }

    pub fn none(&self) -> Result<bool, InternalError> {
        self.is_empty()
    }

    //
    // Predicate-qualified variants
    //

    pub fn any_where(&self, node: impl Into<QueryNode>) -> Result<bool, InternalError> {
        self.filter(node).any()
    }

    pub fn none_where(&self, node: impl Into<QueryNode>) -> Result<bool, InternalError> {
        self.filter(node).none()
    }

    pub fn first_where(&self, node: impl Into<QueryNode>) -> Result<E, InternalError> {
        self.filter(node).first()
    }

    pub fn first_or_none_where(
        &self,
        node: impl Into<QueryNode>,
    ) -> Result<Option<E>, InternalError> {
        self.filter(node).first_or_none()
    }

    pub fn single_where(&self, node: impl Into<QueryNode>) -> Result<E, InternalError> {
        self.filter(node).single()
    }

    pub fn single_or_none_where(
        &self,
        node: impl Into<QueryNode>,
    ) -> Result<Option<E>, InternalError> {
        self.filter(node).single_or_none()
    }
}

///
/// OptionalQueryExt
///
/// Cardinality helpers on a possibly absent query; absence reads as empty.
///

pub trait OptionalQueryExt {
    fn size(self) -> Result<usize, InternalError>;
    fn rough_size(self) -> Result<usize, InternalError>;
    fn is_empty(self) -> Result<bool, InternalError>;
    fn is_not_empty(self) -> Result<bool, InternalError>;
}

impl<E: EntityKind> OptionalQueryExt for Option<&TypedQuery<E>> {
    fn size(self) -> Result<usize, InternalError> {
        self.map_or(Ok(0), TypedQuery::size)
    }

    fn rough_size(self) -> Result<usize, InternalError> {
        self.map_or(Ok(0), TypedQuery::rough_size)
    }

    fn is_empty(self) -> Result<bool, InternalError> {
        self.map_or(Ok(true), TypedQuery::is_empty)
    }

    fn is_not_empty(self) -> Result<bool, InternalError> {
        Ok(!OptionalQueryExt::is_empty(self)?)
    }
}
