use crate::types::Record;

///
/// EntityListener
///
/// Synchronous hooks invoked by `MemoryStore` after a write commits.
/// Only durable (flushed) records report `updated`.
///

pub trait EntityListener {
    /// A record became durable on flush.
    fn added(&self, _record: Record, _entity: &'static str) {}

    fn updated(&self, _record: Record, _entity: &'static str) {}

    fn removed(&self, _record: Record, _entity: &'static str) {}
}
