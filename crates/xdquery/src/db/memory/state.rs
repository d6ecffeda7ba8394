use crate::{
    db::{query::predicate::Row, registry::EntityTypeRegistry},
    error::InternalError,
    model::field::{EntityFieldKind, LinkCardinality},
    types::Record,
    value::Value,
};
use std::collections::{BTreeMap, BTreeSet};

///
/// StoredRecord
///
/// One record's type tag, property values, and link targets.
/// Keys are physical field names.
///

#[derive(Debug)]
pub(crate) struct StoredRecord {
    pub(crate) entity: &'static str,
    pub(crate) flushed: bool,
    properties: BTreeMap<String, Value>,
    links: BTreeMap<String, Vec<Record>>,
}

impl StoredRecord {
    const fn new(entity: &'static str) -> Self {
        Self {
            entity,
            flushed: false,
            properties: BTreeMap::new(),
            links: BTreeMap::new(),
        }
    }

    pub(crate) fn property(&self, db_name: &str) -> Value {
        self.properties.get(db_name).cloned().unwrap_or(Value::Null)
    }

    /// Returns true when the stored value changed. `Null` clears.
    pub(crate) fn set_property(&mut self, db_name: &str, value: Value) -> bool {
        if value.is_null() {
            return self.properties.remove(db_name).is_some();
        }

        self.properties.insert(db_name.to_string(), value.clone()) != Some(value)
    }

    pub(crate) fn link_targets(&self, db_name: &str) -> &[Record] {
        self.links.get(db_name).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn set_link(&mut self, db_name: &str, target: Option<Record>) -> bool {
        let next: Vec<Record> = target.into_iter().collect();
        if self.link_targets(db_name) == next.as_slice() {
            return false;
        }

        if next.is_empty() {
            self.links.remove(db_name);
        } else {
            self.links.insert(db_name.to_string(), next);
        }

        true
    }

    /// Link sets keep insertion order and never hold a target twice.
    pub(crate) fn add_link(&mut self, db_name: &str, target: Record) -> bool {
        let targets = self.links.entry(db_name.to_string()).or_default();
        if targets.contains(&target) {
            return false;
        }
        targets.push(target);

        true
    }

    pub(crate) fn remove_link(&mut self, db_name: &str, target: Record) -> bool {
        let Some(targets) = self.links.get_mut(db_name) else {
            return false;
        };
        let before = targets.len();
        targets.retain(|t| *t != target);
        let changed = targets.len() != before;

        if targets.is_empty() {
            self.links.remove(db_name);
        }

        changed
    }
}

///
/// StoreState
///
/// Record table plus a per-entity index of flushed records. Identities are
/// handed out from a counter, so index order is creation order.
///

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    last_id: u128,
    records: BTreeMap<Record, StoredRecord>,
    index: BTreeMap<&'static str, BTreeSet<Record>>,
}

impl StoreState {
    pub(crate) fn create(&mut self, entity: &'static str) -> Record {
        self.last_id += 1;
        let record = Record::from_u128(self.last_id);
        self.records.insert(record, StoredRecord::new(entity));

        record
    }

    pub(crate) fn get(&self, record: Record) -> Result<&StoredRecord, InternalError> {
        self.records
            .get(&record)
            .ok_or_else(|| InternalError::store_not_found(record.to_string()))
    }

    pub(crate) fn get_mut(&mut self, record: Record) -> Result<&mut StoredRecord, InternalError> {
        self.records
            .get_mut(&record)
            .ok_or_else(|| InternalError::store_not_found(record.to_string()))
    }

    pub(crate) fn is_new(&self, record: Record) -> bool {
        self.records.get(&record).is_some_and(|stored| !stored.flushed)
    }

    pub(crate) fn is_durable(&self, record: Record) -> bool {
        self.records.get(&record).is_some_and(|stored| stored.flushed)
    }

    /// Index every unflushed record; returns what was indexed.
    pub(crate) fn flush(&mut self) -> Vec<(Record, &'static str)> {
        let mut flushed = Vec::new();
        for (record, stored) in &mut self.records {
            if !stored.flushed {
                stored.flushed = true;
                self.index.entry(stored.entity).or_default().insert(*record);
                flushed.push((*record, stored.entity));
            }
        }

        flushed
    }

    /// Delete a record. Inbound links are left dangling.
    pub(crate) fn delete(&mut self, record: Record) -> Result<StoredRecord, InternalError> {
        let stored = self
            .records
            .remove(&record)
            .ok_or_else(|| InternalError::store_not_found(record.to_string()))?;

        if let Some(set) = self.index.get_mut(stored.entity) {
            set.remove(&record);
        }

        Ok(stored)
    }

    /// Flushed records of the given entity names, merged into id order.
    pub(crate) fn indexed(&self, entities: &[&str]) -> Vec<Record> {
        let merged: BTreeSet<Record> = entities
            .iter()
            .filter_map(|entity| self.index.get(entity))
            .flatten()
            .copied()
            .collect();

        merged.into_iter().collect()
    }

    pub(crate) fn indexed_count(&self, entities: &[&str]) -> usize {
        entities
            .iter()
            .filter_map(|entity| self.index.get(entity))
            .map(BTreeSet::len)
            .sum()
    }
}

///
/// RecordRow
///
/// Predicate view over one stored record, resolving physical field names
/// against `entity`'s schema (supertypes included).
///

pub(crate) struct RecordRow<'a> {
    pub(crate) registry: &'a EntityTypeRegistry,
    pub(crate) entity: &'a str,
    pub(crate) stored: &'a StoredRecord,
}

impl Row for RecordRow<'_> {
    fn field(&self, db_name: &str) -> Result<Value, InternalError> {
        let field = self.registry.field(self.entity, db_name)?;

        let value = match field.kind {
            EntityFieldKind::Property => self.stored.property(db_name),
            EntityFieldKind::Link {
                cardinality: LinkCardinality::One,
                ..
            } => self
                .stored
                .link_targets(db_name)
                .first()
                .map_or(Value::Null, |target| Value::Record(*target)),
            EntityFieldKind::Link {
                cardinality: LinkCardinality::Many,
                ..
            } => Value::List(
                self.stored
                    .link_targets(db_name)
                    .iter()
                    .copied()
                    .map(Value::Record)
                    .collect(),
            ),
        };

        Ok(value)
    }
}
