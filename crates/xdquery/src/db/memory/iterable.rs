use crate::{
    db::{
        memory::{
            MemoryStore,
            plan::{self, Plan},
        },
        source::{NativeHandle, NativeIterable, NativeProjection, ProjectionIter, RecordIter},
    },
    error::InternalError,
    types::Record,
};
use std::{any::Any, cell::Cell, fmt, iter, rc::Rc};

///
/// MemoryIterable
///
/// Native iterable over a plan. The rough size is computed once and then
/// served from cache, so it can lag behind later writes.
///

pub(crate) struct MemoryIterable {
    store: MemoryStore,
    plan: Rc<Plan>,
    rough_size: Cell<Option<usize>>,
}

impl MemoryIterable {
    pub(crate) const fn new(store: MemoryStore, plan: Rc<Plan>) -> Self {
        Self {
            store,
            plan,
            rough_size: Cell::new(None),
        }
    }

    pub(crate) const fn plan(&self) -> &Rc<Plan> {
        &self.plan
    }

    pub(crate) fn belongs_to(&self, store: &MemoryStore) -> bool {
        self.store.same_store(store)
    }

    fn eval(&self) -> Result<Vec<Record>, InternalError> {
        self.plan.eval(&self.store.state(), self.store.registry())
    }

    fn derive(&self, plan: Plan) -> NativeHandle {
        Rc::new(Self::new(self.store.clone(), Rc::new(plan)))
    }
}

impl fmt::Debug for MemoryIterable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryIterable({})", self.plan.explain())
    }
}

impl NativeIterable for MemoryIterable {
    fn iter(&self) -> RecordIter {
        plan::into_record_iter(self.eval())
    }

    fn size(&self) -> Result<usize, InternalError> {
        self.plan.size(&self.store.state(), self.store.registry())
    }

    // Failures read as zero; the estimate is display-only.
    fn rough_size(&self) -> usize {
        if let Some(cached) = self.rough_size.get() {
            return cached;
        }

        let size = self.size().unwrap_or_default();
        self.rough_size.set(Some(size));

        size
    }

    fn is_empty(&self) -> Result<bool, InternalError> {
        Ok(self.size()? == 0)
    }

    fn index_of(&self, record: Record) -> Result<Option<usize>, InternalError> {
        Ok(self.eval()?.iter().position(|r| *r == record))
    }

    fn first(&self) -> Result<Option<Record>, InternalError> {
        Ok(self.eval()?.first().copied())
    }

    fn skip(&self, n: usize) -> NativeHandle {
        self.derive(Plan::Skip(Rc::clone(&self.plan), n))
    }

    fn take(&self, n: usize) -> NativeHandle {
        self.derive(Plan::Take(Rc::clone(&self.plan), n))
    }

    fn distinct(&self) -> NativeHandle {
        self.derive(Plan::Distinct(Rc::clone(&self.plan)))
    }

    fn explain(&self) -> String {
        self.plan.explain()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

///
/// MemoryProjection
///

pub(crate) struct MemoryProjection {
    store: MemoryStore,
    input: Rc<Plan>,
    link: String,
}

impl MemoryProjection {
    pub(crate) const fn new(store: MemoryStore, input: Rc<Plan>, link: String) -> Self {
        Self { store, input, link }
    }
}

impl fmt::Debug for MemoryProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryProjection({}, {})", self.input.explain(), self.link)
    }
}

impl NativeProjection for MemoryProjection {
    fn iter(&self) -> ProjectionIter {
        let state = self.store.state();
        let projected = self
            .input
            .eval(&state, self.store.registry())
            .and_then(|records| plan::project(&state, &records, &self.link));

        match projected {
            Ok(targets) => Box::new(targets.into_iter().map(Ok::<_, InternalError>)),
            Err(err) => Box::new(iter::once(Err(err))),
        }
    }

    fn exclude_null(&self) -> NativeHandle {
        Rc::new(MemoryIterable::new(
            self.store.clone(),
            Rc::new(Plan::Project {
                input: Rc::clone(&self.input),
                link: self.link.clone(),
            }),
        ))
    }
}
