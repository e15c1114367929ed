//! Variable binding for derived-field formulas.
//!
//! Each parent is visible under its raw id and under an alias made from
//! its label. Ids always win over aliases.

use std::collections::{BTreeMap, BTreeSet};

use forms_core::field::Field;
use forms_core::schema::ValueMap;
use forms_expr::Environment;
use serde_json::Value;

use crate::error::ResolveError;

/// Indexes fields by id. When ids repeat, the first field wins.
pub fn index_fields(fields: &[Field]) -> BTreeMap<&str, &Field> {
    let mut by_id = BTreeMap::new();
    for f in fields {
        by_id.entry(f.id.as_str()).or_insert(f);
    }
    by_id
}

/// Keeps ASCII letters and digits and lowercases them: `"Birth Date"`
/// becomes `birthdate`.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Alias a field binds, or `None` when its label has no usable characters.
pub fn alias_of(field: &Field) -> Option<String> {
    let alias = normalize_label(&field.label);
    (!alias.is_empty()).then_some(alias)
}

/// Name a formula should use for `field`: its alias, falling back to its id.
pub fn variable_name(field: &Field) -> String {
    alias_of(field).unwrap_or_else(|| field.id.clone())
}

/// Fails when two distinct parents of `field` normalize to the same alias.
pub fn check_aliases(
    field: &Field,
    by_id: &BTreeMap<&str, &Field>,
) -> Result<(), ResolveError> {
    let mut seen: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for parent_id in unique_parents(field) {
        if let Some(alias) = by_id.get(parent_id).and_then(|p| alias_of(p)) {
            seen.entry(alias).or_default().push(parent_id.to_string());
        }
    }
    match seen.into_iter().find(|(_, ids)| ids.len() > 1) {
        Some((name, parents)) => Err(ResolveError::DuplicateVariableName {
            field: field.id.clone(),
            name,
            parents,
        }),
        None => Ok(()),
    }
}

/// Every name a formula of `field` can read as a variable.
pub fn bound_names(field: &Field, by_id: &BTreeMap<&str, &Field>) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for parent_id in unique_parents(field) {
        if let Some(parent) = by_id.get(parent_id) {
            names.extend(alias_of(parent));
            names.insert(parent_id.to_string());
        }
    }
    names
}

/// Builds the formula environment of `field` from the working value map.
/// Parents without a value are bound to `null`.
pub fn environment(
    field: &Field,
    by_id: &BTreeMap<&str, &Field>,
    values: &ValueMap,
) -> Environment {
    let mut env = Environment::new();
    let parents: Vec<&Field> = unique_parents(field)
        .filter_map(|id| by_id.get(id).copied())
        .collect();
    for parent in &parents {
        if let Some(alias) = alias_of(parent) {
            env.insert(alias, value_of(values, &parent.id));
        }
    }
    for parent in &parents {
        env.insert(parent.id.clone(), value_of(values, &parent.id));
    }
    env
}

fn value_of(values: &ValueMap, id: &str) -> Value {
    values.get(id).cloned().unwrap_or(Value::Null)
}

fn unique_parents(field: &Field) -> impl Iterator<Item = &str> {
    let mut seen = BTreeSet::new();
    field
        .parent_ids()
        .iter()
        .map(String::as_str)
        .filter(move |id| seen.insert(*id))
}
