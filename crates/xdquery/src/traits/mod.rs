use crate::{model::entity::EntityModel, types::Record};
use std::{fmt::Debug, hash::Hash};

///
/// Path
/// Fully-qualified schema path.
///

pub trait Path {
    const PATH: &'static str;
}

///
/// EntityKind
///
/// A domain type backed by one stored record.
///
/// ## Semantics
/// - `MODEL` names the physical collection and declares fields
/// - `from_record` wraps a raw record, `record` unwraps it again
/// - wrapping is cheap and infallible; field reads go through the store
///

pub trait EntityKind: Path + Clone + Debug + Eq + Hash + 'static {
    const MODEL: &'static EntityModel;

    fn from_record(record: Record) -> Self;

    fn record(&self) -> Record;
}
