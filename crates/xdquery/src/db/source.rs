//! Iterable shapes a query can be backed by.
//!
//! Every `Source` is either engine-native (index-backed, cheap sizing and
//! positional lookup) or ad hoc (a plain restartable sequence). The tag is
//! explicit so operators dispatch by `match`, never by inspection.

use crate::{error::InternalError, types::Record};
use std::{any::Any, collections::HashSet, fmt, rc::Rc};

/// Lazily produced records; items fail when the backing store does.
pub type RecordIter = Box<dyn Iterator<Item = Result<Record, InternalError>>>;

/// Lazily produced link projections; `None` marks an unset link.
pub type ProjectionIter = Box<dyn Iterator<Item = Result<Option<Record>, InternalError>>>;

pub type NativeHandle = Rc<dyn NativeIterable>;

///
/// NativeIterable
///
/// Engine-recognized iterable backed by the store's physical index.
/// Every method evaluates against the store state visible at call time.
///

pub trait NativeIterable: fmt::Debug {
    fn iter(&self) -> RecordIter;

    /// Exact cardinality.
    fn size(&self) -> Result<usize, InternalError>;

    /// Cheap estimate; may be stale relative to concurrent mutation.
    fn rough_size(&self) -> usize;

    fn is_empty(&self) -> Result<bool, InternalError>;

    /// Position of `record`, if present.
    fn index_of(&self, record: Record) -> Result<Option<usize>, InternalError>;

    fn first(&self) -> Result<Option<Record>, InternalError>;

    fn skip(&self, n: usize) -> NativeHandle;

    fn take(&self, n: usize) -> NativeHandle;

    /// Identity distinct, keeping first occurrences in order.
    fn distinct(&self) -> NativeHandle;

    /// One-line plan description for diagnostics.
    fn explain(&self) -> String;

    /// Lets an engine recognize its own iterables.
    fn as_any(&self) -> &dyn Any;
}

///
/// NativeProjection
///
/// Engine-native result of projecting through a link field.
///

pub trait NativeProjection: fmt::Debug {
    fn iter(&self) -> ProjectionIter;

    /// Drop unset projections, yielding a native record iterable.
    fn exclude_null(&self) -> NativeHandle;
}

///
/// SourceKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceKind {
    Native,
    AdHoc,
}

///
/// SequenceFn
///
/// Restartable generator: every call starts a fresh traversal.
///

#[derive(Clone)]
pub struct SequenceFn(Rc<dyn Fn() -> RecordIter>);

impl SequenceFn {
    pub fn new(f: impl Fn() -> RecordIter + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[must_use]
    pub fn start(&self) -> RecordIter {
        (self.0)()
    }
}

impl fmt::Debug for SequenceFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SequenceFn")
    }
}

///
/// AdHoc
///

#[derive(Clone, Debug)]
pub enum AdHoc {
    /// Concrete in-memory records; supports direct membership tests.
    Collection(Rc<[Record]>),
    Sequence(SequenceFn),
}

///
/// Source
///

#[derive(Clone, Debug)]
pub enum Source {
    Native(NativeHandle),
    AdHoc(AdHoc),
}

impl Source {
    #[must_use]
    pub fn collection(records: impl Into<Rc<[Record]>>) -> Self {
        Self::AdHoc(AdHoc::Collection(records.into()))
    }

    pub fn sequence(f: impl Fn() -> RecordIter + 'static) -> Self {
        Self::AdHoc(AdHoc::Sequence(SequenceFn::new(f)))
    }

    #[must_use]
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Native(_) => SourceKind::Native,
            Self::AdHoc(_) => SourceKind::AdHoc,
        }
    }

    /// Start a fresh traversal.
    #[must_use]
    pub fn iter(&self) -> RecordIter {
        match self {
            Self::Native(native) => native.iter(),
            Self::AdHoc(AdHoc::Collection(records)) => {
                let records = Rc::clone(records);
                Box::new((0..records.len()).map(move |i| Ok::<_, InternalError>(records[i])))
            }
            Self::AdHoc(AdHoc::Sequence(seq)) => seq.start(),
        }
    }

    #[must_use]
    pub fn explain(&self) -> String {
        match self {
            Self::Native(native) => native.explain(),
            Self::AdHoc(AdHoc::Collection(records)) => format!("Collection({})", records.len()),
            Self::AdHoc(AdHoc::Sequence(_)) => "Sequence".to_string(),
        }
    }

    //
    // Sequence-level fallbacks
    //

    #[must_use]
    pub(crate) fn seq_skip(&self, n: usize) -> Self {
        let inner = self.clone();
        Self::sequence(move || Box::new(inner.iter().skip(n)))
    }

    #[must_use]
    pub(crate) fn seq_take(&self, n: usize) -> Self {
        let inner = self.clone();
        Self::sequence(move || Box::new(inner.iter().take(n)))
    }

    #[must_use]
    pub(crate) fn seq_distinct(&self) -> Self {
        let inner = self.clone();
        Self::sequence(move || Box::new(distinct_iter(inner.iter())))
    }
}

/// Identity distinct over a record stream, first occurrence wins.
/// Errors pass through untouched.
pub(crate) fn distinct_iter(
    iter: impl Iterator<Item = Result<Record, InternalError>>,
) -> impl Iterator<Item = Result<Record, InternalError>> {
    let mut seen = HashSet::new();
    iter.filter(move |item| match item {
        Ok(record) => seen.insert(*record),
        Err(_) => true,
    })
}

///
/// Projection
///
/// Output of `select_distinct` / `select_many_distinct`: distinct link
/// targets that may still contain one unset (`None`) entry.
///

#[derive(Clone, Debug)]
pub enum Projection {
    Native(Rc<dyn NativeProjection>),
    AdHoc(ProjectionFn),
}

///
/// ProjectionFn
///

#[derive(Clone)]
pub struct ProjectionFn(Rc<dyn Fn() -> ProjectionIter>);

impl ProjectionFn {
    pub fn new(f: impl Fn() -> ProjectionIter + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[must_use]
    pub fn start(&self) -> ProjectionIter {
        (self.0)()
    }
}

impl fmt::Debug for ProjectionFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProjectionFn")
    }
}

impl Projection {
    #[must_use]
    pub fn iter(&self) -> ProjectionIter {
        match self {
            Self::Native(native) => native.iter(),
            Self::AdHoc(f) => f.start(),
        }
    }

    /// Drop unset projections; the shape (native / ad hoc) is preserved.
    #[must_use]
    pub fn exclude_null(&self) -> Source {
        match self {
            Self::Native(native) => Source::Native(native.exclude_null()),
            Self::AdHoc(f) => {
                let f = f.clone();
                Source::sequence(move || {
                    Box::new(f.start().filter_map(|item| match item {
                        Ok(Some(record)) => Some(Ok(record)),
                        Ok(None) => None,
                        Err(err) => Some(Err(err)),
                    }))
                })
            }
        }
    }
}
