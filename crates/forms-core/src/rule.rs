//! Validation rule definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::RuleType;

/// A named check applied to one field's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "type")]
    pub rule_type: RuleType,

    /// Rule parameter: a length for `minLength`/`maxLength`, a flag for
    /// `required`. Unused by the other rule types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Message shown when the rule fails.
    #[serde(default)]
    pub message: String,
}

impl Rule {
    pub fn new(rule_type: RuleType, message: impl Into<String>) -> Self {
        Self {
            rule_type,
            value: None,
            message: message.into(),
        }
    }

    pub fn required(message: impl Into<String>) -> Self {
        Self::new(RuleType::Required, message).with_value(Value::Bool(true))
    }

    pub fn not_empty(message: impl Into<String>) -> Self {
        Self::new(RuleType::NotEmpty, message)
    }

    pub fn min_length(n: u64, message: impl Into<String>) -> Self {
        Self::new(RuleType::MinLength, message).with_value(Value::from(n))
    }

    pub fn max_length(n: u64, message: impl Into<String>) -> Self {
        Self::new(RuleType::MaxLength, message).with_value(Value::from(n))
    }

    pub fn email(message: impl Into<String>) -> Self {
        Self::new(RuleType::Email, message)
    }

    pub fn password(message: impl Into<String>) -> Self {
        Self::new(RuleType::Password, message)
    }

    /// Creates a rule carrying the stock message for its type.
    pub fn with_default_message(rule_type: RuleType, length: Option<u64>) -> Self {
        let message = rule_type.default_message(length);
        let rule = Self::new(rule_type.clone(), message);
        match (rule_type, length) {
            (t, Some(n)) if t.takes_length() => rule.with_value(Value::from(n)),
            (RuleType::Required, _) => rule.with_value(Value::Bool(true)),
            _ => rule,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// The numeric parameter, if present and a non-negative integer-ish number.
    pub fn length_param(&self) -> Option<usize> {
        let v = self.value.as_ref()?;
        if let Some(n) = v.as_u64() {
            return Some(n as usize);
        }
        match v.as_f64() {
            Some(f) if f.is_finite() && f >= 0.0 => Some(f as usize),
            _ => None,
        }
    }

    /// `false` only when the parameter explicitly disables the rule.
    pub fn is_enabled(&self) -> bool {
        !matches!(self.value, Some(Value::Bool(false)))
    }
}
