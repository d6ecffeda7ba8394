//! Query operators.
//!
//! Every operator returns a new, still unevaluated `TypedQuery`. Positional
//! operators (`drop`, `take`, `distinct`) first offer the source to the
//! engine for native coercion and fall back to sequence-level work.

use crate::{
    db::{
        engine::QueryEngine,
        query::{
            TypedQuery,
            field::{Field, Link, LinkMany},
            predicate::QueryNode,
        },
        registry::EntityType,
        source::{NativeHandle, Source},
    },
    traits::EntityKind,
    value::FieldValue,
};
use std::ops::Add;

impl<E: EntityKind> TypedQuery<E> {
    fn engine(&self) -> &dyn QueryEngine {
        self.db.engine()
    }

    fn with_source(&self, source: Source) -> Self {
        Self::new(self.db.clone(), self.entity_type, source)
    }

    fn retyped<T: EntityKind>(&self, source: Source) -> TypedQuery<T> {
        TypedQuery::new(self.db.clone(), EntityType::new(), source)
    }

    // Native coercion first; sequence fallback otherwise.
    fn operation(
        &self,
        if_native: impl FnOnce(&NativeHandle) -> NativeHandle,
        if_ad_hoc: impl FnOnce(&Source) -> Source,
    ) -> Self {
        let source = match self.engine().to_native_or_passthrough(&self.source) {
            Source::Native(native) => Source::Native(if_native(&native)),
            ad_hoc @ Source::AdHoc(_) => if_ad_hoc(&ad_hoc),
        };

        self.with_source(source)
    }

    //
    // Set algebra
    //

    /// Records in either query; order is engine-defined.
    #[must_use]
    pub fn union(&self, that: &Self) -> Self {
        self.with_source(self.engine().union(&self.source, &that.source))
    }

    #[must_use]
    pub fn union_one(&self, that: Option<&E>) -> Self {
        self.union(&self.db.query_of(that))
    }

    /// Records in both queries.
    #[must_use]
    pub fn intersect(&self, that: &Self) -> Self {
        self.with_source(self.engine().intersect(&self.source, &that.source))
    }

    /// Records of `self` not in `that`.
    #[must_use]
    pub fn exclude(&self, that: &Self) -> Self {
        self.with_source(self.engine().exclude(&self.source, &that.source))
    }

    #[must_use]
    pub fn exclude_one(&self, that: Option<&E>) -> Self {
        self.exclude(&self.db.query_of(that))
    }

    /// `self` followed by `that`, duplicates retained.
    #[must_use]
    pub fn concat(&self, that: &Self) -> Self {
        self.with_source(self.engine().concat(&self.source, &that.source))
    }

    #[must_use]
    pub fn concat_one(&self, that: Option<&E>) -> Self {
        self.concat(&self.db.query_of(that))
    }

    //
    // Engine nodes
    //

    /// Apply a filter predicate or sort node through the engine.
    #[must_use]
    pub fn filter(&self, node: impl Into<QueryNode>) -> Self {
        let node = node.into();
        let source = self
            .engine()
            .query(&self.source, self.entity_type.physical_name(), &node);

        self.with_source(source)
    }

    /// Narrow to records of `S`, retyped.
    #[must_use]
    pub fn filter_is_instance<S: EntityKind>(&self) -> TypedQuery<S> {
        let all_of_target = self
            .db
            .store()
            .all_of(EntityType::<S>::new().physical_name());
        let source = self.engine().intersect(&all_of_target, &self.source);

        self.retyped(source)
    }

    /// Drop records of `S`; the query keeps its own type.
    #[must_use]
    pub fn filter_is_not_instance<S: EntityKind>(&self) -> Self {
        let all_of_target = self
            .db
            .store()
            .all_of(EntityType::<S>::new().physical_name());

        self.with_source(self.engine().exclude(&self.source, &all_of_target))
    }

    /// Stable sort by a property; nulls last in both directions.
    #[must_use]
    pub fn sorted_by<V: FieldValue>(&self, field: Field<E, V>, ascending: bool) -> Self {
        self.filter(field.sort(ascending))
    }

    /// Stable sort by a property of the entity behind a single-valued link.
    /// Records with an unset link or unset property sort last.
    #[must_use]
    pub fn sorted_by_link<T: EntityKind, V: FieldValue>(
        &self,
        link: Link<E, T>,
        field: Field<T, V>,
        ascending: bool,
    ) -> Self {
        self.filter(QueryNode::SortByLink {
            link: link.db_name().to_string(),
            target_entity: EntityType::<T>::new().physical_name(),
            field: field.db_name().to_string(),
            ascending,
        })
    }

    //
    // Positional
    //

    /// Identity distinct, first occurrence wins.
    #[must_use]
    pub fn distinct(&self) -> Self {
        self.operation(|native| native.distinct(), Source::seq_distinct)
    }

    /// Skip the first `n` records.
    #[must_use]
    pub fn drop(&self, n: usize) -> Self {
        self.operation(|native| native.skip(n), |source| source.seq_skip(n))
    }

    /// Keep at most the first `n` records.
    #[must_use]
    pub fn take(&self, n: usize) -> Self {
        self.operation(|native| native.take(n), |source| source.seq_take(n))
    }

    //
    // Link projections
    //

    /// Distinct non-null targets of a single-valued link.
    #[must_use]
    pub fn map_distinct<T: EntityKind>(&self, link: Link<E, T>) -> TypedQuery<T> {
        self.map_distinct_by_name(link.db_name())
    }

    #[must_use]
    pub fn map_distinct_by_name<T: EntityKind>(&self, db_field_name: &str) -> TypedQuery<T> {
        let projection = self.engine().select_distinct(&self.source, db_field_name);

        self.retyped(projection.exclude_null())
    }

    /// Distinct non-null targets of a multi-valued link.
    #[must_use]
    pub fn flat_map_distinct<T: EntityKind>(&self, link: LinkMany<E, T>) -> TypedQuery<T> {
        self.flat_map_distinct_by_name(link.db_name())
    }

    #[must_use]
    pub fn flat_map_distinct_by_name<T: EntityKind>(&self, db_field_name: &str) -> TypedQuery<T> {
        let projection = self
            .engine()
            .select_many_distinct(&self.source, db_field_name);

        self.retyped(projection.exclude_null())
    }
}

impl<E: EntityKind> Add for TypedQuery<E> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.concat(&rhs)
    }
}

impl<E: EntityKind> Add<&TypedQuery<E>> for &TypedQuery<E> {
    type Output = TypedQuery<E>;

    fn add(self, rhs: &TypedQuery<E>) -> Self::Output {
        self.concat(rhs)
    }
}
