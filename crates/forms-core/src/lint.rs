//! Structural checks on fields and schemas, applied by the editor before save.

use std::collections::HashSet;

use crate::field::Field;
use crate::schema::FormSchema;

/// A structural problem with a field or schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("cannot save empty form")]
    EmptyForm,

    #[error("duplicate field id: {0}")]
    DuplicateFieldId(String),

    #[error("position {position} out of range for {len} fields")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("field {field}: label is required")]
    LabelRequired { field: String },

    #[error("field {field}: at least one option is required")]
    OptionsRequired { field: String },

    #[error("field {field}: derived fields must have parent fields")]
    DerivedWithoutParents { field: String },

    #[error("field {field}: derived fields must have a formula")]
    DerivedWithoutFormula { field: String },

    #[error("field {field}: marked derived but has no derived configuration")]
    MissingDerivedConfig { field: String },
}

/// Checks a single field. Returns every problem found.
pub fn lint_field(field: &Field) -> Vec<SchemaError> {
    let mut problems = Vec::new();
    let id = || field.id.clone();

    if field.label.trim().is_empty() {
        problems.push(SchemaError::LabelRequired { field: id() });
    }
    if field.field_type.needs_options()
        && field.options.as_ref().is_none_or(|o| o.is_empty())
    {
        problems.push(SchemaError::OptionsRequired { field: id() });
    }
    if field.is_derived {
        match &field.derived_config {
            None => problems.push(SchemaError::MissingDerivedConfig { field: id() }),
            Some(cfg) => {
                if cfg.parent_field_ids.is_empty() {
                    problems.push(SchemaError::DerivedWithoutParents { field: id() });
                }
                if cfg.formula.trim().is_empty() {
                    problems.push(SchemaError::DerivedWithoutFormula { field: id() });
                }
            }
        }
    }
    problems
}

/// Checks every field plus schema-wide invariants.
pub fn lint_schema(schema: &FormSchema) -> Vec<SchemaError> {
    let mut problems = Vec::new();
    if schema.fields.is_empty() {
        problems.push(SchemaError::EmptyForm);
    }
    let mut seen = HashSet::new();
    for field in &schema.fields {
        if !seen.insert(field.id.as_str()) {
            problems.push(SchemaError::DuplicateFieldId(field.id.clone()));
        }
        problems.extend(lint_field(field));
    }
    problems
}
