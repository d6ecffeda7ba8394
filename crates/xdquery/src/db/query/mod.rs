//! Typed, lazy queries.
//!
//! A `TypedQuery<E>` pairs an entity type with an unevaluated source.
//! Operators (`ops`) build new queries without touching the store;
//! terminal calls (`materialize`) evaluate against the current store state.

pub mod field;
mod materialize;
mod ops;
pub mod predicate;

#[cfg(test)]
mod tests;

use crate::{
    db::{
        Db,
        registry::EntityType,
        source::{RecordIter, Source, SourceKind},
    },
    error::InternalError,
    traits::EntityKind,
};
use sha2::{Digest, Sha256};
use std::{fmt, marker::PhantomData};

// re-exports
pub use field::{Field, Link, LinkMany};
pub use materialize::OptionalQueryExt;
pub use predicate::{CompareOp, ComparePredicate, Predicate, QueryNode, Row};

///
/// TypedQuery
///
/// Immutable query value. The entity type never changes across an operator
/// chain except through explicit retyping operators; the source is replaced
/// wholesale by every operator.
///

#[derive(Clone)]
pub struct TypedQuery<E: EntityKind> {
    db: Db,
    entity_type: EntityType<E>,
    source: Source,
}

impl<E: EntityKind> fmt::Debug for TypedQuery<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedQuery")
            .field("entity_type", &self.entity_type)
            .field("source", &self.source.explain())
            .finish()
    }
}

impl<E: EntityKind> TypedQuery<E> {
    pub(crate) const fn new(db: Db, entity_type: EntityType<E>, source: Source) -> Self {
        Self {
            db,
            entity_type,
            source,
        }
    }

    #[must_use]
    pub const fn db(&self) -> &Db {
        &self.db
    }

    #[must_use]
    pub const fn entity_type(&self) -> EntityType<E> {
        self.entity_type
    }

    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    /// Shape of the source as classified by the engine.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.db.engine().classify(&self.source)
    }

    #[must_use]
    pub fn explain(&self) -> String {
        format!("{}: {}", self.entity_type.path(), self.source.explain())
    }

    /// Stable fingerprint of the plan shape, for correlating debug output.
    #[must_use]
    pub fn fingerprint(&self) -> PlanFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(b"queryfp:v1");
        hasher.update(self.explain().as_bytes());

        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);

        PlanFingerprint(out)
    }
}

///
/// PlanFingerprint
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PlanFingerprint([u8; 32]);

impl PlanFingerprint {
    #[must_use]
    pub fn as_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            use std::fmt::Write as _;
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Display for PlanFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}

///
/// QueryIter
///
/// Lazy traversal wrapping every produced record into `E`.
///

pub struct QueryIter<E> {
    inner: RecordIter,
    _marker: PhantomData<fn() -> E>,
}

impl<E> QueryIter<E> {
    pub(crate) fn new(inner: RecordIter) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<E: EntityKind> Iterator for QueryIter<E> {
    type Item = Result<E, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| item.map(E::from_record))
    }
}

impl<E: EntityKind> IntoIterator for &TypedQuery<E> {
    type Item = Result<E, InternalError>;
    type IntoIter = QueryIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
