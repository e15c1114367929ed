//! Per-field validation rule pipeline.
//!
//! Rules run in declaration order and every failing rule contributes its
//! message; nothing short-circuits. Only `required` fails on a missing
//! value -- the length, email and password rules skip absent values so
//! presence has a single gate.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::enums::RuleType;
use crate::field::Field;
use crate::rule::Rule;
use crate::schema::{ErrorMap, ValueMap};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Minimum password length accepted by the `password` rule.
pub const PASSWORD_MIN_LEN: usize = 8;

/// A value counts as absent when it is missing, `null`, or an empty string.
pub fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Runs a single rule. Returns `true` when the rule is violated.
pub fn rule_fails(rule: &Rule, value: Option<&Value>) -> bool {
    match &rule.rule_type {
        RuleType::Required => {
            if !rule.is_enabled() {
                return false;
            }
            match value {
                // Only multi-select widgets produce arrays.
                Some(Value::Array(items)) => items.is_empty(),
                v => is_absent(v),
            }
        }
        RuleType::NotEmpty => matches!(
            value,
            Some(Value::String(s)) if !s.is_empty() && s.trim().is_empty()
        ),
        RuleType::MinLength => match (present_str(value), rule.length_param()) {
            (Some(s), Some(n)) => s.chars().count() < n,
            _ => false,
        },
        RuleType::MaxLength => match (present_str(value), rule.length_param()) {
            (Some(s), Some(n)) => s.chars().count() > n,
            _ => false,
        },
        RuleType::Email => present_str(value).is_some_and(|s| !EMAIL_RE.is_match(s)),
        RuleType::Password => present_str(value).is_some_and(|s| {
            s.chars().count() < PASSWORD_MIN_LEN || !s.chars().any(|c| c.is_ascii_digit())
        }),
        // Unknown rule kinds are carried through storage but never enforced.
        RuleType::Custom(_) => false,
    }
}

/// Collects the messages of every violated rule, in declaration order.
pub fn validate_field(field: &Field, value: Option<&Value>) -> Vec<String> {
    field
        .validation_rules
        .iter()
        .filter(|rule| rule_fails(rule, value))
        .map(|rule| rule.message.clone())
        .collect()
}

/// Validates every non-derived field; fields without errors are omitted.
pub fn validate_form(fields: &[Field], values: &ValueMap) -> ErrorMap {
    fields
        .iter()
        .filter(|f| !f.is_derived)
        .filter_map(|f| {
            let errors = validate_field(f, values.get(&f.id));
            (!errors.is_empty()).then(|| (f.id.clone(), errors))
        })
        .collect()
}

fn present_str(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}
