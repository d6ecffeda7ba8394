///
/// EntityFieldModel
/// Runtime field metadata used by query planning and the store.
///

#[derive(Debug)]
pub struct EntityFieldModel {
    /// Field name as written in code.
    pub name: &'static str,
    /// Physical field name; differs from `name` only when renamed in storage.
    pub db_name: &'static str,
    pub kind: EntityFieldKind,
}

impl EntityFieldModel {
    #[must_use]
    pub const fn property(name: &'static str) -> Self {
        Self {
            name,
            db_name: name,
            kind: EntityFieldKind::Property,
        }
    }

    #[must_use]
    pub const fn link(name: &'static str, target: &'static str) -> Self {
        Self {
            name,
            db_name: name,
            kind: EntityFieldKind::Link {
                target,
                cardinality: LinkCardinality::One,
            },
        }
    }

    #[must_use]
    pub const fn link_many(name: &'static str, target: &'static str) -> Self {
        Self {
            name,
            db_name: name,
            kind: EntityFieldKind::Link {
                target,
                cardinality: LinkCardinality::Many,
            },
        }
    }

    /// Override the physical name.
    #[must_use]
    pub const fn stored_as(mut self, db_name: &'static str) -> Self {
        self.db_name = db_name;
        self
    }

    #[must_use]
    pub const fn is_link(&self) -> bool {
        matches!(self.kind, EntityFieldKind::Link { .. })
    }
}

///
/// EntityFieldKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityFieldKind {
    /// Scalar value stored inline.
    Property,
    /// Reference to records of `target` (physical entity name).
    Link {
        target: &'static str,
        cardinality: LinkCardinality,
    },
}

///
/// LinkCardinality
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkCardinality {
    One,
    Many,
}
