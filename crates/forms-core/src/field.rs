//! Field struct -- one entry in a form schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::FieldType;
use crate::rule::Rule;

/// Helper for `skip_serializing_if` on `bool` fields.
fn is_false(b: &bool) -> bool {
    !b
}

/// A choice offered by select and radio fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// How a derived field computes its value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedConfig {
    /// Ordered, duplicate-free list of parent field ids.
    #[serde(default)]
    pub parent_field_ids: Vec<String>,

    /// Formula text in the expression language.
    #[serde(default)]
    pub formula: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DerivedConfig {
    pub fn new<I, S>(parents: I, formula: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parent_field_ids: Vec<String> = Vec::new();
        for p in parents {
            let p = p.into();
            if !parent_field_ids.contains(&p) {
                parent_field_ids.push(p);
            }
        }
        Self {
            parent_field_ids,
            formula: formula.into(),
            description: None,
        }
    }
}

/// A single form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Unique, stable identifier.
    pub id: String,

    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    #[serde(default)]
    pub validation_rules: Vec<Rule>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_derived: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_config: Option<DerivedConfig>,

    /// Display position; dense 0..n-1 within a schema.
    #[serde(default)]
    pub order: u32,
}

impl Field {
    /// Parent ids of a derived field; empty for regular fields.
    pub fn parent_ids(&self) -> &[String] {
        match (&self.is_derived, &self.derived_config) {
            (true, Some(cfg)) => &cfg.parent_field_ids,
            _ => &[],
        }
    }

    /// The formula of a derived field, if any.
    pub fn formula(&self) -> Option<&str> {
        if !self.is_derived {
            return None;
        }
        self.derived_config.as_ref().map(|c| c.formula.as_str())
    }
}

/// Builder for constructing [`Field`] instances.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Creates a new builder with the given id and label.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: Field {
                id: id.into(),
                field_type: FieldType::default(),
                label: label.into(),
                required: false,
                default_value: None,
                options: None,
                placeholder: None,
                min: None,
                max: None,
                step: None,
                validation_rules: Vec::new(),
                is_derived: false,
                derived_config: None,
                order: 0,
            },
        }
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field.field_type = field_type;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.field.required = required;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.field.default_value = Some(value);
        self
    }

    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.field
            .options
            .get_or_insert_with(Vec::new)
            .push(SelectOption::new(value, label));
        self
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>, step: Option<f64>) -> Self {
        self.field.min = min;
        self.field.max = max;
        self.field.step = step;
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.field.placeholder = Some(placeholder.into());
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.field.validation_rules.push(rule);
        self
    }

    /// Marks the field as derived from `parents` via `formula`.
    pub fn derived<I, S>(mut self, parents: I, formula: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field.is_derived = true;
        self.field.derived_config = Some(DerivedConfig::new(parents, formula));
        self
    }

    pub fn order(mut self, order: u32) -> Self {
        self.field.order = order;
        self
    }

    pub fn build(self) -> Field {
        self.field
    }
}
