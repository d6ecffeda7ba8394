use crate::model::field::EntityFieldModel;

///
/// EntityModel
/// Minimal runtime model for one entity type.
///

#[derive(Debug)]
pub struct EntityModel {
    /// Fully-qualified Rust type path (for dispatch and diagnostics).
    pub path: &'static str,
    /// Physical collection name used by the store.
    pub entity_name: &'static str,
    /// Physical name of the direct supertype, if any.
    pub supertype: Option<&'static str>,
    /// Ordered field list.
    pub fields: &'static [EntityFieldModel],
}

impl EntityModel {
    /// Look up a field by its code-level name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static EntityFieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Look up a field by its physical name.
    #[must_use]
    pub fn field_by_db_name(&self, db_name: &str) -> Option<&'static EntityFieldModel> {
        self.fields.iter().find(|field| field.db_name == db_name)
    }
}
