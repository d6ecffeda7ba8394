//! Lazy, composable typed queries over a collection-oriented entity store:
//! set algebra, ordering, slicing, link projections, and the terminal calls
//! that finally evaluate them.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod traits;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Query vocabulary only. Stores, engines, and metrics stay behind their
/// modules.
///

pub mod prelude {
    pub use crate::{
        db::{
            Db,
            mutation::MutableQuery,
            query::{Field, Link, LinkMany, OptionalQueryExt, Predicate, TypedQuery},
        },
        model::entity::EntityModel,
        traits::{EntityKind, Path},
        types::Record,
        value::Value,
    };
}
