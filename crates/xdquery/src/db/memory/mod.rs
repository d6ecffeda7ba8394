//! In-memory store and query engine.
//!
//! Records are created "new" and only become visible to index-backed
//! iterables (`all_of`, native singletons) after `flush`. New records can
//! still be read and queried through ad hoc sources.

mod engine;
mod iterable;
mod link;
mod listener;
mod plan;
mod state;


use crate::{
    db::{
        Db,
        engine::Store,
        memory::{
            iterable::MemoryIterable,
            plan::Plan,
            state::{StoreState, StoredRecord},
        },
        query::field::{Field, Link, LinkMany},
        registry::{EntityType, EntityTypeRegistry},
        source::Source,
    },
    error::InternalError,
    traits::EntityKind,
    types::Record,
    value::FieldValue,
};
use std::{
    cell::{Ref, RefCell},
    fmt,
    rc::Rc,
};

// re-exports
pub use link::MemoryLinkSet;
pub use listener::EntityListener;

///
/// MemoryStore
///
/// Cheap, clonable handle; clones share one store.
///

#[derive(Clone)]
pub struct MemoryStore {
    inner: Rc<Inner>,
}

struct Inner {
    state: RefCell<StoreState>,
    registry: Rc<EntityTypeRegistry>,
    listeners: RefCell<Vec<Rc<dyn EntityListener>>>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("state", &self.inner.state)
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new(registry: EntityTypeRegistry) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(StoreState::default()),
                registry: Rc::new(registry),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// A `Db` using this store as both store and engine.
    #[must_use]
    pub fn db(&self) -> Db {
        Db::new(
            Rc::new(self.clone()),
            Rc::new(self.clone()),
            Rc::clone(&self.inner.registry),
        )
    }

    #[must_use]
    pub fn registry(&self) -> &EntityTypeRegistry {
        &self.inner.registry
    }

    pub fn add_listener(&self, listener: Rc<dyn EntityListener>) {
        self.inner.listeners.borrow_mut().push(listener);
    }

    pub(crate) fn state(&self) -> Ref<'_, StoreState> {
        self.inner.state.borrow()
    }

    pub(crate) fn same_store(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn native(&self, plan: Plan) -> Source {
        self.native_rc(Rc::new(plan))
    }

    pub(crate) fn native_rc(&self, plan: Rc<Plan>) -> Source {
        Source::Native(Rc::new(MemoryIterable::new(self.clone(), plan)))
    }

    //
    // Lifecycle
    //

    /// Create a new, not yet flushed record of `E`.
    pub fn create<E: EntityKind>(&self) -> Result<E, InternalError> {
        let entity = EntityType::<E>::new().physical_name();
        self.registry().model(entity)?;

        let record = self.inner.state.borrow_mut().create(entity);

        Ok(E::from_record(record))
    }

    /// Make every new record durable; returns how many were flushed.
    pub fn flush(&self) -> usize {
        let flushed = self.inner.state.borrow_mut().flush();
        for &(record, entity) in &flushed {
            self.notify(|listener| listener.added(record, entity));
        }

        flushed.len()
    }

    /// Delete a record. Links pointing at it are left in place and fail
    /// with a store `NotFound` when followed.
    pub fn delete<E: EntityKind>(&self, entity: &E) -> Result<(), InternalError> {
        let record = entity.record();
        let stored = self.inner.state.borrow_mut().delete(record)?;
        self.notify(|listener| listener.removed(record, stored.entity));

        Ok(())
    }

    //
    // Fields
    //

    pub fn set<E: EntityKind, V: FieldValue>(
        &self,
        entity: &E,
        field: Field<E, V>,
        value: V,
    ) -> Result<(), InternalError> {
        let value = value.to_value();

        self.update(
            entity.record(),
            |stored| Ok(stored.set_property(field.db_name(), value)),
            None,
        )
    }

    /// Read a property; `None` when unset.
    pub fn get<E: EntityKind, V: FieldValue>(
        &self,
        entity: &E,
        field: Field<E, V>,
    ) -> Result<Option<V>, InternalError> {
        let value = self.state().get(entity.record())?.property(field.db_name());
        if value.is_null() {
            return Ok(None);
        }

        V::from_value(&value).map(Some).ok_or_else(|| {
            InternalError::store_invariant(format!(
                "field '{}' on {} holds {value:?}",
                field.name(),
                entity.record()
            ))
        })
    }

    pub fn set_link<E: EntityKind, T: EntityKind>(
        &self,
        entity: &E,
        link: Link<E, T>,
        target: Option<&T>,
    ) -> Result<(), InternalError> {
        let target = target.map(T::record);

        self.update(
            entity.record(),
            |stored| Ok(stored.set_link(link.db_name(), target)),
            target,
        )
    }

    pub fn get_link<E: EntityKind, T: EntityKind>(
        &self,
        entity: &E,
        link: Link<E, T>,
    ) -> Result<Option<T>, InternalError> {
        let state = self.state();
        let target = state
            .get(entity.record())?
            .link_targets(link.db_name())
            .first()
            .copied();

        match target {
            Some(target) => {
                state.get(target)?;
                Ok(Some(T::from_record(target)))
            }
            None => Ok(None),
        }
    }

    /// Mutable view of a multi-valued link.
    #[must_use]
    pub fn link_set<E: EntityKind, T: EntityKind>(
        &self,
        entity: &E,
        link: LinkMany<E, T>,
    ) -> MemoryLinkSet<T> {
        MemoryLinkSet::new(self.clone(), entity.record(), link.db_name())
    }

    // Apply one write to `record`; `target` must exist when given.
    // Listeners run after the state borrow is released.
    pub(crate) fn update(
        &self,
        record: Record,
        write: impl FnOnce(&mut StoredRecord) -> Result<bool, InternalError>,
        target: Option<Record>,
    ) -> Result<(), InternalError> {
        let changed = {
            let mut state = self.inner.state.borrow_mut();
            if let Some(target) = target {
                state.get(target)?;
            }

            let stored = state.get_mut(record)?;
            let changed = write(stored)?;

            (changed && stored.flushed).then_some(stored.entity)
        };

        if let Some(entity) = changed {
            self.notify(|listener| listener.updated(record, entity));
        }

        Ok(())
    }

    fn notify(&self, f: impl Fn(&dyn EntityListener)) {
        let listeners = self.inner.listeners.borrow().clone();
        for listener in &listeners {
            f(listener.as_ref());
        }
    }
}

impl Store for MemoryStore {
    fn empty_iterable(&self) -> Source {
        self.native(Plan::Empty)
    }

    fn singleton_iterable(&self, record: Record) -> Source {
        self.native(Plan::Records(Rc::from(vec![record])))
    }

    fn all_of(&self, entity_name: &str) -> Source {
        self.native(Plan::All(entity_name.to_string()))
    }

    fn is_new(&self, record: Record) -> bool {
        self.state().is_new(record)
    }
}
