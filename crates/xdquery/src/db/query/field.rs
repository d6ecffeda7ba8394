use crate::{
    db::{
        query::predicate::{CompareOp, Predicate, QueryNode},
        registry::EntityType,
    },
    traits::EntityKind,
    value::{FieldValue, Value},
};
use std::{fmt, marker::PhantomData};

///
/// Field
///
/// Typed reference to a scalar property `V` of entity `E`.
///

pub struct Field<E, V> {
    name: &'static str,
    _marker: PhantomData<fn(E) -> V>,
}

impl<E, V> Clone for Field<E, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, V> Copy for Field<E, V> {}

impl<E, V> fmt::Debug for Field<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({})", self.name)
    }
}

impl<E: EntityKind, V: FieldValue> Field<E, V> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn db_name(&self) -> &'static str {
        EntityType::<E>::new().field_db_name(self.name)
    }

    #[must_use]
    pub fn eq(&self, value: impl Into<V>) -> Predicate {
        self.compare(CompareOp::Eq, value)
    }

    #[must_use]
    pub fn ne(&self, value: impl Into<V>) -> Predicate {
        self.compare(CompareOp::Ne, value)
    }

    #[must_use]
    pub fn lt(&self, value: impl Into<V>) -> Predicate {
        self.compare(CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(&self, value: impl Into<V>) -> Predicate {
        self.compare(CompareOp::Lte, value)
    }

    #[must_use]
    pub fn gt(&self, value: impl Into<V>) -> Predicate {
        self.compare(CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(&self, value: impl Into<V>) -> Predicate {
        self.compare(CompareOp::Gte, value)
    }

    #[must_use]
    pub fn in_list(&self, values: impl IntoIterator<Item = V>) -> Predicate {
        let values = values.into_iter().map(|v| v.to_value()).collect();

        Predicate::compare(self.db_name(), CompareOp::In, Value::List(values))
    }

    #[must_use]
    pub fn is_null(&self) -> Predicate {
        Predicate::is_null(self.db_name())
    }

    #[must_use]
    pub fn is_not_null(&self) -> Predicate {
        Predicate::is_not_null(self.db_name())
    }

    /// Sort node over this property.
    #[must_use]
    pub fn sort(&self, ascending: bool) -> QueryNode {
        QueryNode::SortBy {
            field: self.db_name().to_string(),
            ascending,
        }
    }

    fn compare(&self, op: CompareOp, value: impl Into<V>) -> Predicate {
        Predicate::compare(self.db_name(), op, value.into().to_value())
    }
}

///
/// Link
///
/// Typed reference to a single-valued link from `E` to `T`.
///

pub struct Link<E, T> {
    name: &'static str,
    _marker: PhantomData<fn(E) -> T>,
}

impl<E, T> Clone for Link<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Link<E, T> {}

impl<E, T> fmt::Debug for Link<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self.name)
    }
}

impl<E: EntityKind, T: EntityKind> Link<E, T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn db_name(&self) -> &'static str {
        EntityType::<E>::new().field_db_name(self.name)
    }

    /// Link points at `target`.
    #[must_use]
    pub fn eq(&self, target: &T) -> Predicate {
        Predicate::eq(self.db_name(), Value::Record(target.record()))
    }

    #[must_use]
    pub fn is_null(&self) -> Predicate {
        Predicate::is_null(self.db_name())
    }

    #[must_use]
    pub fn is_not_null(&self) -> Predicate {
        Predicate::is_not_null(self.db_name())
    }
}

///
/// LinkMany
///
/// Typed reference to a multi-valued link from `E` to `T`.
///

pub struct LinkMany<E, T> {
    name: &'static str,
    _marker: PhantomData<fn(E) -> T>,
}

impl<E, T> Clone for LinkMany<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for LinkMany<E, T> {}

impl<E, T> fmt::Debug for LinkMany<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LinkMany({})", self.name)
    }
}

impl<E: EntityKind, T: EntityKind> LinkMany<E, T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn db_name(&self) -> &'static str {
        EntityType::<E>::new().field_db_name(self.name)
    }

    /// Link set holds `target`.
    #[must_use]
    pub fn contains(&self, target: &T) -> Predicate {
        Predicate::compare(
            self.db_name(),
            CompareOp::Contains,
            Value::Record(target.record()),
        )
    }
}
