//! Collaborator boundaries consumed by the query layer.
//!
//! The query algebra never touches storage itself; it composes sources
//! through a `QueryEngine` and asks a `Store` for base iterables.

use crate::{
    db::{
        query::predicate::QueryNode,
        source::{Projection, Source, SourceKind},
    },
    types::Record,
};

///
/// QueryEngine
///
/// Set and sequence combinators over sources.
/// Composition is pure and infallible; failures only surface when a
/// composed source is traversed or sized.
///

pub trait QueryEngine {
    /// Set union over record identity.
    fn union(&self, left: &Source, right: &Source) -> Source;

    /// Set intersection over record identity.
    fn intersect(&self, left: &Source, right: &Source) -> Source;

    /// Records of `left` not present in `right`.
    fn exclude(&self, left: &Source, right: &Source) -> Source;

    /// Ordered concatenation; duplicates retained.
    fn concat(&self, left: &Source, right: &Source) -> Source;

    /// Distinct targets of a single-valued link.
    fn select_distinct(&self, source: &Source, link: &str) -> Projection;

    /// Distinct targets of a multi-valued link.
    fn select_many_distinct(&self, source: &Source, link: &str) -> Projection;

    /// Apply a structured filter or sort node to `source`.
    fn query(&self, source: &Source, entity_name: &str, node: &QueryNode) -> Source;

    /// Coerce an ad hoc source into native form when every record it
    /// holds is durably indexed; otherwise return it unchanged.
    fn to_native_or_passthrough(&self, source: &Source) -> Source;

    fn classify(&self, source: &Source) -> SourceKind {
        source.kind()
    }
}

///
/// Store
///
/// Base iterables and record state.
///

pub trait Store {
    fn empty_iterable(&self) -> Source;

    /// A native single-record source for a durably indexed record.
    fn singleton_iterable(&self, record: Record) -> Source;

    /// Every record of `entity_name`, subtypes included, in index order.
    fn all_of(&self, entity_name: &str) -> Source;

    /// True when `record` is not yet durably indexed.
    fn is_new(&self, record: Record) -> bool;
}
