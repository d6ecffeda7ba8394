pub mod engine;
pub mod memory;
pub mod mutation;
pub mod query;
pub mod registry;
pub mod response;
pub mod source;

use crate::{
    db::{
        engine::{QueryEngine, Store},
        query::{TypedQuery, predicate::QueryNode},
        registry::{EntityType, EntityTypeRegistry},
        source::Source,
    },
    traits::EntityKind,
    types::Record,
};
use std::{collections::HashSet, fmt, rc::Rc};

///
/// Db
///
/// Entry point for building typed queries.
///
/// Bundles the store, the query engine, and the schema registry so every
/// `TypedQuery` can reach its collaborators without global state.
/// Cloning is cheap; all collaborators are shared.
///

#[derive(Clone)]
pub struct Db {
    store: Rc<dyn Store>,
    engine: Rc<dyn QueryEngine>,
    registry: Rc<EntityTypeRegistry>,
    debug: bool,
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("registry", &self.registry)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl Db {
    #[must_use]
    pub fn new(
        store: Rc<dyn Store>,
        engine: Rc<dyn QueryEngine>,
        registry: Rc<EntityTypeRegistry>,
    ) -> Self {
        Self {
            store,
            engine,
            registry,
            debug: false,
        }
    }

    /// Print `[debug]` lines for every terminal call.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    #[must_use]
    pub fn engine(&self) -> &dyn QueryEngine {
        self.engine.as_ref()
    }

    #[must_use]
    pub fn registry(&self) -> &EntityTypeRegistry {
        &self.registry
    }

    pub(crate) fn debug_log(&self, s: impl AsRef<str>) {
        if self.debug {
            println!("[debug] {}", s.as_ref());
        }
    }

    //
    // Entry points
    //

    /// Wrap an arbitrary source; `None` becomes the store's empty iterable.
    #[must_use]
    pub fn as_query<E: EntityKind>(&self, source: Option<Source>) -> TypedQuery<E> {
        let source = source.unwrap_or_else(|| self.store.empty_iterable());

        TypedQuery::new(self.clone(), EntityType::new(), source)
    }

    /// Every record of `E`, subtypes included.
    #[must_use]
    pub fn all<E: EntityKind>(&self) -> TypedQuery<E> {
        let source = self.store.all_of(EntityType::<E>::new().physical_name());

        self.as_query(Some(source))
    }

    #[must_use]
    pub fn empty_query<E: EntityKind>(&self) -> TypedQuery<E> {
        self.as_query(None)
    }

    /// Union of the given entities (duplicates collapse).
    ///
    /// Durable records form one native source and unflushed ones one
    /// collection, so the result is at most a single union.
    pub fn query_of<'a, E: EntityKind>(
        &self,
        elements: impl IntoIterator<Item = &'a E>,
    ) -> TypedQuery<E> {
        let mut seen = HashSet::new();
        let (mut durable, mut fresh) = (Vec::new(), Vec::new());
        for record in elements.into_iter().map(EntityKind::record) {
            if !seen.insert(record) {
                continue;
            }
            if self.store.is_new(record) {
                fresh.push(record);
            } else {
                durable.push(record);
            }
        }

        let source = match (durable.is_empty(), fresh.is_empty()) {
            (true, true) => self.store.empty_iterable(),
            (true, false) => Source::collection(fresh),
            (false, true) => self.durable_source(durable),
            (false, false) => self
                .engine
                .union(&self.durable_source(durable), &Source::collection(fresh)),
        };

        self.as_query(Some(source))
    }

    /// Ad hoc query over a concrete record list, order and duplicates kept.
    pub fn query_from_records<E: EntityKind>(
        &self,
        records: impl IntoIterator<Item = Record>,
    ) -> TypedQuery<E> {
        let records: Vec<Record> = records.into_iter().collect();

        self.as_query(Some(Source::collection(records)))
    }

    /// `all::<E>()` narrowed by `node`.
    pub fn query<E: EntityKind>(&self, node: impl Into<QueryNode>) -> TypedQuery<E> {
        self.all::<E>().filter(node)
    }

    // One native source over records the store already indexes.
    fn durable_source(&self, records: Vec<Record>) -> Source {
        match records.as_slice() {
            [record] => self.store.singleton_iterable(*record),
            _ => self
                .engine
                .to_native_or_passthrough(&Source::collection(records)),
        }
    }
}
