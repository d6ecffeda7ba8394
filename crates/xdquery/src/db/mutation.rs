//! Bulk edits over single-element mutable collections.
//!
//! Bulk calls apply one element at a time in source order. There is no
//! batching and no rollback: the first failure aborts the loop and every
//! element applied before it stays applied.

use crate::{
    db::query::TypedQuery,
    error::InternalError,
    obs::sink::{self, MetricsEvent, MutationKind},
    traits::EntityKind,
};

///
/// MutableQuery
///
/// A mutable collection or link set of `E` exposing single-element edits.
///

pub trait MutableQuery<E: EntityKind> {
    fn add(&self, element: &E) -> Result<(), InternalError>;

    fn remove(&self, element: &E) -> Result<(), InternalError>;

    /// Add every element, stopping at the first failure.
    fn add_all(&self, elements: impl IntoIterator<Item = E>) -> Result<(), InternalError>
    where
        Self: Sized,
    {
        for element in elements {
            self.add(&element)?;
            sink::record(MetricsEvent::Mutation {
                kind: MutationKind::Add,
                entity_path: E::PATH,
            });
        }

        Ok(())
    }

    /// Remove every element, stopping at the first failure.
    fn remove_all(&self, elements: impl IntoIterator<Item = E>) -> Result<(), InternalError>
    where
        Self: Sized,
    {
        for element in elements {
            self.remove(&element)?;
            sink::record(MetricsEvent::Mutation {
                kind: MutationKind::Remove,
                entity_path: E::PATH,
            });
        }

        Ok(())
    }

    /// Add the lazily produced results of `query`.
    ///
    /// Elements are pulled one at a time; a traversal failure aborts the
    /// same way a failed `add` does.
    fn add_all_query(&self, query: &TypedQuery<E>) -> Result<(), InternalError>
    where
        Self: Sized,
    {
        apply_each(query, |element| self.add(element), MutationKind::Add)
    }

    fn remove_all_query(&self, query: &TypedQuery<E>) -> Result<(), InternalError>
    where
        Self: Sized,
    {
        apply_each(query, |element| self.remove(element), MutationKind::Remove)
    }
}

fn apply_each<E: EntityKind>(
    query: &TypedQuery<E>,
    mut apply: impl FnMut(&E) -> Result<(), InternalError>,
    kind: MutationKind,
) -> Result<(), InternalError> {
    for element in query {
        apply(&element?)?;
        sink::record(MetricsEvent::Mutation {
            kind,
            entity_path: E::PATH,
        });
    }

    Ok(())
}
