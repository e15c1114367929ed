//! The [`FormStore`] trait: the public API for schema persistence.
//!
//! Consumers depend on the trait rather than a concrete store so the
//! in-memory store can stand in for the file store in tests.

use chrono::{DateTime, Utc};
use forms_core::idgen::generate_form_id;
use forms_core::schema::FormSchema;

use crate::error::Result;

/// Persistence for saved form schemas.
pub trait FormStore {
    /// Stores a new schema and returns its id. A schema with an empty id
    /// gets a generated one.
    fn save(&self, schema: &FormSchema) -> Result<String>;

    /// Every stored schema, in save order.
    fn load_all(&self) -> Result<Vec<FormSchema>>;

    /// The schema with `id`.
    fn get(&self, id: &str) -> Result<FormSchema>;

    /// Replaces the schema with `id`; its `id` and `createdAt` are kept.
    fn update(&self, id: &str, schema: &FormSchema) -> Result<()>;

    /// Removes the schema with `id`.
    fn delete(&self, id: &str) -> Result<()>;
}

/// Gives `schema` an id that is not in `existing`, generating one when the
/// schema has none.
pub(crate) fn assign_id(schema: &FormSchema, existing: &[FormSchema], now: DateTime<Utc>) -> String {
    if !schema.id.is_empty() {
        return schema.id.clone();
    }
    let mut nonce = 0u32;
    loop {
        let candidate = generate_form_id(&schema.name, now, nonce);
        if !existing.iter().any(|s| s.id == candidate) {
            return candidate;
        }
        nonce += 1;
    }
}

/// Prepares a schema for insertion: id assigned, timestamps filled.
pub(crate) fn prepare_new(schema: &FormSchema, existing: &[FormSchema]) -> FormSchema {
    let now = Utc::now();
    let mut stored = schema.clone();
    stored.id = assign_id(schema, existing, now);
    if stored.created_at == DateTime::<Utc>::default() {
        stored.created_at = now;
    }
    stored.updated_at = now;
    stored
}

/// Applies an update onto the stored schema it replaces.
pub(crate) fn prepare_update(current: &FormSchema, schema: &FormSchema) -> FormSchema {
    let mut updated = current.clone();
    updated.apply_draft(schema.to_draft(), Utc::now());
    updated
}
