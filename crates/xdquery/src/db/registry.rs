use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{entity::EntityModel, field::EntityFieldModel},
    traits::EntityKind,
};
use std::{collections::BTreeMap, fmt, marker::PhantomData};
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("entity '{0}' not registered")]
    EntityNotFound(String),

    #[error("entity '{0}' already registered")]
    EntityAlreadyRegistered(String),

    #[error("entity '{entity}' declares unregistered supertype '{supertype}'")]
    UnknownSupertype {
        entity: &'static str,
        supertype: &'static str,
    },
}

impl RegistryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::EntityNotFound(_) => ErrorClass::Internal,
            Self::EntityAlreadyRegistered(_) | Self::UnknownSupertype { .. } => {
                ErrorClass::InvariantViolation
            }
        }
    }
}

impl From<RegistryError> for InternalError {
    fn from(err: RegistryError) -> Self {
        Self::new(err.class(), ErrorOrigin::Store, err.to_string())
    }
}

///
/// EntityTypeRegistry
///
/// Per-process schema registry keyed by physical entity name.
/// Supertypes must be registered before their subtypes.
///

#[derive(Debug, Default)]
pub struct EntityTypeRegistry {
    models: BTreeMap<&'static str, &'static EntityModel>,
}

impl EntityTypeRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// Register an entity type.
    pub fn register<E: EntityKind>(&mut self) -> Result<(), InternalError> {
        self.register_model(E::MODEL)
    }

    /// Builder-style `register`.
    pub fn with<E: EntityKind>(mut self) -> Result<Self, InternalError> {
        self.register::<E>()?;

        Ok(self)
    }

    fn register_model(&mut self, model: &'static EntityModel) -> Result<(), InternalError> {
        if self.models.contains_key(model.entity_name) {
            return Err(RegistryError::EntityAlreadyRegistered(model.entity_name.to_string()).into());
        }
        if let Some(supertype) = model.supertype
            && !self.models.contains_key(supertype)
        {
            return Err(RegistryError::UnknownSupertype {
                entity: model.entity_name,
                supertype,
            }
            .into());
        }

        self.models.insert(model.entity_name, model);

        Ok(())
    }

    pub fn model(&self, entity_name: &str) -> Result<&'static EntityModel, InternalError> {
        self.models
            .get(entity_name)
            .copied()
            .ok_or_else(|| RegistryError::EntityNotFound(entity_name.to_string()).into())
    }

    /// True when `entity_name` is `ancestor` or transitively extends it.
    #[must_use]
    pub fn is_subtype_of(&self, entity_name: &str, ancestor: &str) -> bool {
        let mut current = Some(entity_name);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self.models.get(name).and_then(|model| model.supertype);
        }

        false
    }

    /// Physical names of `ancestor` and all its registered subtypes.
    #[must_use]
    pub fn names_under(&self, ancestor: &str) -> Vec<&'static str> {
        self.models
            .keys()
            .copied()
            .filter(|name| self.is_subtype_of(name, ancestor))
            .collect()
    }

    /// Resolve a field by physical name, searching supertypes too.
    pub fn field(
        &self,
        entity_name: &str,
        db_name: &str,
    ) -> Result<&'static EntityFieldModel, InternalError> {
        let mut current = Some(self.model(entity_name)?);
        while let Some(model) = current {
            if let Some(field) = model.field_by_db_name(db_name) {
                return Ok(field);
            }
            current = match model.supertype {
                Some(supertype) => Some(self.model(supertype)?),
                None => None,
            };
        }

        Err(InternalError::unknown_field(entity_name, db_name))
    }

    #[must_use]
    pub const fn physical_name<E: EntityKind>(&self) -> &'static str {
        E::MODEL.entity_name
    }

    /// Physical name of a code-level field; unresolvable names map to themselves.
    #[must_use]
    pub fn field_db_name<'a, E: EntityKind>(&self, field: &'a str) -> &'a str {
        EntityType::<E>::new().field_db_name(field)
    }
}

///
/// EntityType
///
/// Zero-sized type descriptor: the domain type a query yields.
///

pub struct EntityType<E>(PhantomData<fn() -> E>);

impl<E> Clone for EntityType<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EntityType<E> {}

impl<E> Default for EntityType<E> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<E: EntityKind> fmt::Debug for EntityType<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", E::PATH)
    }
}

impl<E: EntityKind> EntityType<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }

    #[must_use]
    pub const fn model(self) -> &'static EntityModel {
        E::MODEL
    }

    #[must_use]
    pub const fn physical_name(self) -> &'static str {
        E::MODEL.entity_name
    }

    #[must_use]
    pub const fn path(self) -> &'static str {
        E::PATH
    }

    /// Physical name of a code-level field on this type.
    #[must_use]
    pub fn field_db_name<'a>(self, field: &'a str) -> &'a str {
        match E::MODEL.field(field) {
            Some(model) => model.db_name,
            None => field,
        }
    }
}
