//! Form schemas, drafts, and the value/error maps exchanged with the engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field::Field;
use crate::idgen;
use crate::lint::SchemaError;

/// Field id -> current value. Missing keys mean "no value entered".
pub type ValueMap = BTreeMap<String, Value>;

/// Field id -> ordered validation messages. Absent key means no errors.
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// Returns `true` if any field has at least one message.
pub fn has_errors(errors: &ErrorMap) -> bool {
    errors.values().any(|messages| !messages.is_empty())
}

/// A saved form definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    /// Empty until the schema is first saved.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub fields: Vec<Field>,

    #[serde(default)]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl FormSchema {
    /// Looks up a field by id.
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Fields sorted by display position (ties keep declaration order).
    pub fn sorted_fields(&self) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.order);
        fields
    }

    pub fn derived_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_derived)
    }

    /// Opens the schema for editing.
    pub fn to_draft(&self) -> FormDraft {
        FormDraft {
            name: self.name.clone(),
            fields: self.fields.clone(),
        }
    }

    /// Replaces name and fields with an edited draft and bumps `updated_at`.
    pub fn apply_draft(&mut self, draft: FormDraft, now: DateTime<Utc>) {
        self.name = draft.name;
        self.fields = draft.fields;
        self.touch(now);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// The form currently being edited, before it is saved as a [`FormSchema`].
///
/// Every structural edit keeps `order` a dense `0..n-1` sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl FormDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field under a freshly generated id and returns that id.
    pub fn add_field(&mut self, mut field: Field) -> String {
        let now = Utc::now();
        let mut nonce = 0u32;
        let id = loop {
            let candidate =
                idgen::generate_field_id(&field.label, self.fields.len(), now, nonce);
            if !self.contains(&candidate) {
                break candidate;
            }
            nonce += 1;
        };
        field.id = id.clone();
        field.order = self.fields.len() as u32;
        self.fields.push(field);
        id
    }

    /// Appends a field keeping its id; fails if the id is taken.
    pub fn push_field(&mut self, mut field: Field) -> Result<(), SchemaError> {
        if self.contains(&field.id) {
            return Err(SchemaError::DuplicateFieldId(field.id));
        }
        field.order = self.fields.len() as u32;
        self.fields.push(field);
        Ok(())
    }

    /// Replaces the field with the same id. Returns `false` if none matched.
    pub fn update_field(&mut self, field: Field) -> bool {
        match self.fields.iter_mut().find(|f| f.id == field.id) {
            Some(slot) => {
                let order = slot.order;
                *slot = field;
                slot.order = order;
                true
            }
            None => false,
        }
    }

    /// Removes a field by id. Returns the removed field, if any.
    pub fn remove_field(&mut self, id: &str) -> Option<Field> {
        let idx = self.fields.iter().position(|f| f.id == id)?;
        let removed = self.fields.remove(idx);
        self.renumber();
        Some(removed)
    }

    /// Moves the field at `from` to position `to`.
    pub fn reorder_field(&mut self, from: usize, to: usize) -> Result<(), SchemaError> {
        let len = self.fields.len();
        if from >= len || to >= len {
            return Err(SchemaError::PositionOutOfRange {
                position: from.max(to),
                len,
            });
        }
        let moved = self.fields.remove(from);
        self.fields.insert(to, moved);
        self.renumber();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.fields.clear();
    }

    /// Turns the draft into a saved schema.
    pub fn finish(self, name: impl Into<String>, now: DateTime<Utc>) -> Result<FormSchema, SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::EmptyForm);
        }
        let name = name.into();
        Ok(FormSchema {
            id: idgen::generate_form_id(&name, now, 0),
            name,
            fields: self.fields,
            created_at: now,
            updated_at: now,
        })
    }

    fn contains(&self, id: &str) -> bool {
        self.fields.iter().any(|f| f.id == id)
    }

    fn renumber(&mut self) {
        for (i, f) in self.fields.iter_mut().enumerate() {
            f.order = i as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldBuilder;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 9, 30, 0).unwrap()
    }

    fn draft_abc() -> FormDraft {
        let mut d = FormDraft::new("Test");
        for id in ["a", "b", "c"] {
            d.push_field(FieldBuilder::new(id, id.to_uppercase()).build()).unwrap();
        }
        d
    }

    fn orders(d: &FormDraft) -> Vec<(String, u32)> {
        d.fields.iter().map(|f| (f.id.clone(), f.order)).collect()
    }

    #[test]
    fn add_field_assigns_id_and_order() {
        let mut d = FormDraft::new("Signup");
        let a = d.add_field(FieldBuilder::new("", "Name").build());
        let b = d.add_field(FieldBuilder::new("", "Name").build());
        assert_ne!(a, b);
        assert!(a.starts_with("fld-"));
        assert_eq!(d.fields[1].order, 1);
    }

    #[test]
    fn push_rejects_duplicate_ids() {
        let mut d = draft_abc();
        let err = d.push_field(FieldBuilder::new("b", "Again").build()).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateFieldId(id) if id == "b"));
    }

    #[test]
    fn remove_renumbers() {
        let mut d = draft_abc();
        let removed = d.remove_field("a").unwrap();
        assert_eq!(removed.id, "a");
        assert_eq!(orders(&d), vec![("b".into(), 0), ("c".into(), 1)]);
        assert!(d.remove_field("zzz").is_none());
    }

    #[test]
    fn reorder_moves_and_renumbers() {
        let mut d = draft_abc();
        d.reorder_field(0, 2).unwrap();
        assert_eq!(
            orders(&d),
            vec![("b".into(), 0), ("c".into(), 1), ("a".into(), 2)]
        );
        assert!(d.reorder_field(0, 3).is_err());
    }

    #[test]
    fn update_keeps_position() {
        let mut d = draft_abc();
        let replacement = FieldBuilder::new("b", "Renamed").order(99).build();
        assert!(d.update_field(replacement));
        assert_eq!(d.fields[1].label, "Renamed");
        assert_eq!(d.fields[1].order, 1);
        assert!(!d.update_field(FieldBuilder::new("nope", "X").build()));
    }

    #[test]
    fn finish_refuses_empty_form() {
        let d = FormDraft::new("Empty");
        assert!(matches!(d.finish("Empty", ts()), Err(SchemaError::EmptyForm)));
    }

    #[test]
    fn finish_builds_schema() {
        let schema = draft_abc().finish("Letters", ts()).unwrap();
        assert_eq!(schema.name, "Letters");
        assert_eq!(schema.created_at, ts());
        assert_eq!(schema.updated_at, ts());
        assert!(schema.id.starts_with("form-"));
        assert_eq!(schema.field("c").map(|f| f.label.as_str()), Some("C"));
    }

    #[test]
    fn editing_through_a_draft_keeps_identity() {
        let mut schema = draft_abc().finish("Letters", ts()).unwrap();
        let id = schema.id.clone();

        let mut draft = schema.to_draft();
        draft.name = "Two letters".into();
        draft.remove_field("a");

        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        schema.apply_draft(draft, later);
        assert_eq!(schema.id, id);
        assert_eq!(schema.name, "Two letters");
        assert_eq!(schema.created_at, ts());
        assert_eq!(schema.updated_at, later);
        let ids: Vec<&str> = schema.fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(schema.fields[0].order, 0);
    }

    #[test]
    fn sorted_fields_follow_order() {
        let mut schema = draft_abc().finish("Letters", ts()).unwrap();
        schema.fields[0].order = 5;
        let ids: Vec<&str> = schema.sorted_fields().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn schema_wire_shape_uses_camel_case() {
        let schema = draft_abc().finish("Letters", ts()).unwrap();
        let json = serde_json::to_value(&schema).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        let back: FormSchema = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn has_errors_ignores_empty_lists() {
        let mut errors = ErrorMap::new();
        assert!(!has_errors(&errors));
        errors.insert("a".into(), vec![]);
        assert!(!has_errors(&errors));
        errors.insert("b".into(), vec!["bad".into()]);
        assert!(has_errors(&errors));
    }
}
