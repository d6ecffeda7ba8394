use crate::{error::InternalError, traits::EntityKind, types::Record};
use derive_more::{Deref, IntoIterator};
use thiserror::Error as ThisError;

///
/// ResponseError
/// Errors related to interpreting a materialized result.
///

#[derive(Debug, ThisError)]
pub enum ResponseError {
    #[error("expected at least one row, found 0 (entity {entity})")]
    NotFound { entity: &'static str },

    #[error("expected exactly one row, found more (entity {entity})")]
    NotUnique { entity: &'static str },
}

///
/// Response
/// Materialized query result in traversal order.
///

#[derive(Debug, Deref, IntoIterator)]
pub struct Response<E: EntityKind>(#[into_iterator(owned, ref)] Vec<E>);

impl<E: EntityKind> Response<E> {
    #[must_use]
    pub const fn new(entities: Vec<E>) -> Self {
        Self(entities)
    }

    //
    // Cardinality
    //

    #[must_use]
    pub const fn count(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    //
    // Exact cardinality helpers
    //

    /// Require exactly one entity.
    pub fn one(self) -> Result<E, InternalError> {
        self.one_opt()?
            .ok_or_else(|| ResponseError::NotFound { entity: E::PATH }.into())
    }

    /// Require at most one entity.
    pub fn one_opt(self) -> Result<Option<E>, InternalError> {
        let mut iter = self.0.into_iter();
        match (iter.next(), iter.next()) {
            (first, None) => Ok(first),
            (_, Some(_)) => {
                Err(ResponseError::NotUnique { entity: E::PATH }.into())
            }
        }
    }

    //
    // Entities
    //

    #[must_use]
    /// Consume the response and return the first entity, if any.
    pub fn first(self) -> Option<E> {
        self.0.into_iter().next()
    }

    #[must_use]
    pub fn entities(self) -> Vec<E> {
        self.0
    }

    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.0.iter().map(E::record).collect()
    }

    #[must_use]
    pub fn contains(&self, entity: &E) -> bool {
        self.0.contains(entity)
    }
}
