use crate::{
    db::{memory::MemoryStore, mutation::MutableQuery},
    error::InternalError,
    traits::EntityKind,
    types::Record,
};
use std::marker::PhantomData;

///
/// MemoryLinkSet
///
/// Mutable view of one record's multi-valued link to `T`.
/// Adding a present target or removing an absent one is a no-op.
///

pub struct MemoryLinkSet<T> {
    store: MemoryStore,
    owner: Record,
    link: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: EntityKind> MemoryLinkSet<T> {
    pub(crate) const fn new(store: MemoryStore, owner: Record, link: &'static str) -> Self {
        Self {
            store,
            owner,
            link,
            _marker: PhantomData,
        }
    }

    /// Current targets in insertion order.
    pub fn targets(&self) -> Result<Vec<T>, InternalError> {
        let state = self.store.state();
        let targets = state.get(self.owner)?.link_targets(self.link);

        Ok(targets.iter().copied().map(T::from_record).collect())
    }
}

impl<T: EntityKind> MutableQuery<T> for MemoryLinkSet<T> {
    fn add(&self, element: &T) -> Result<(), InternalError> {
        let target = element.record();
        self.store
            .update(self.owner, |stored| Ok(stored.add_link(self.link, target)), Some(target))
    }

    fn remove(&self, element: &T) -> Result<(), InternalError> {
        let target = element.record();
        self.store
            .update(self.owner, |stored| Ok(stored.remove_link(self.link, target)), None)
    }
}
