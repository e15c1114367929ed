//! Form evaluation: derivation and validation in one pass.
//!
//! [`Engine::evaluate`] resolves derived fields, computes them in
//! dependency order over a copy of the input values, then validates the
//! non-derived fields. Derived values present in the input are always
//! recomputed, so feeding the output back in yields the same output.

use std::collections::BTreeMap;
use std::sync::Arc;

use forms_core::field::Field;
use forms_core::schema::{ErrorMap, FormSchema, ValueMap};
use forms_core::validation::validate_form;
use forms_expr::{Clock, EvalError, Interpreter, Limits};
use serde_json::Value;
use tracing::{debug, info};

use crate::binding::{bound_names, environment, index_fields};
use crate::error::{DerivationError, ResolveError};
use crate::graph::{ResolvePolicy, resolve};

/// Value shown in place of a derived result that could not be computed.
pub const DEFAULT_ERROR_VALUE: &str = "Error in calculation";

/// Result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Input values with defaults applied and every derived field filled.
    pub values: ValueMap,
    /// Validation messages for non-derived fields.
    pub errors: ErrorMap,
    /// Derived fields that show the error value, and why.
    pub derivation_errors: BTreeMap<String, DerivationError>,
}

impl Evaluation {
    /// Only validation errors block submission.
    pub fn can_submit(&self) -> bool {
        self.errors.is_empty()
    }

    /// Derivation errors rendered as text, keyed by field id.
    pub fn derivation_messages(&self) -> BTreeMap<String, String> {
        self.derivation_errors
            .iter()
            .map(|(id, e)| (id.clone(), e.to_string()))
            .collect()
    }
}

/// Evaluates form schemas against raw input values.
#[derive(Debug, Clone)]
pub struct Engine {
    interpreter: Interpreter,
    policy: ResolvePolicy,
    error_value: Value,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
            policy: ResolvePolicy::default(),
            error_value: Value::String(DEFAULT_ERROR_VALUE.to_string()),
        }
    }

    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.interpreter = self.interpreter.with_clock(clock);
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.interpreter = self.interpreter.with_limits(limits);
        self
    }

    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_error_value(mut self, value: impl Into<String>) -> Self {
        self.error_value = Value::String(value.into());
        self
    }

    pub fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn evaluate(&self, schema: &FormSchema, raw: &ValueMap) -> Evaluation {
        self.evaluate_fields(&schema.fields, raw)
    }

    pub fn evaluate_fields(&self, fields: &[Field], raw: &ValueMap) -> Evaluation {
        let by_id = index_fields(fields);
        let mut values = with_defaults(fields, raw);
        let mut derivation_errors = BTreeMap::new();

        let resolution = resolve(fields, self.policy);
        for (id, err) in resolution.failures {
            values.insert(id.clone(), self.error_value.clone());
            derivation_errors.insert(id, DerivationError::Resolve(err));
        }

        for id in &resolution.order {
            let Some(field) = by_id.get(id.as_str()) else {
                continue;
            };
            let failed_parent = field
                .parent_ids()
                .iter()
                .find(|p| derivation_errors.contains_key(p.as_str()));
            let outcome = match failed_parent {
                Some(parent) => Err(DerivationError::Resolve(ResolveError::UpstreamFailed {
                    field: id.clone(),
                    parent: parent.clone(),
                })),
                None => self.derive(field, &by_id, &values),
            };
            match outcome {
                Ok(value) => {
                    values.insert(id.clone(), value);
                }
                Err(err) => {
                    debug!(field = %id, kind = err.kind(), "derivation failed: {}", err);
                    values.insert(id.clone(), self.error_value.clone());
                    derivation_errors.insert(id.clone(), err);
                }
            }
        }

        let errors = validate_form(fields, &values);
        info!(
            derived = resolution.order.len(),
            derivation_errors = derivation_errors.len(),
            invalid_fields = errors.len(),
            "form evaluated"
        );

        Evaluation {
            values,
            errors,
            derivation_errors,
        }
    }

    fn derive(
        &self,
        field: &Field,
        by_id: &BTreeMap<&str, &Field>,
        values: &ValueMap,
    ) -> Result<Value, DerivationError> {
        let formula = field.formula().unwrap_or_default();
        let env = environment(field, by_id, values);
        Ok(self.interpreter.evaluate(formula, &env)?)
    }

    /// Checks a derived field's formula without evaluating it: it must
    /// parse, read only bound names, and call only registered functions.
    pub fn check_formula(&self, field: &Field, fields: &[Field]) -> Result<(), DerivationError> {
        let Some(formula) = field.formula() else {
            return Ok(());
        };
        let expr = self.interpreter.parse(formula)?;
        let by_id = index_fields(fields);
        let bound = bound_names(field, &by_id);
        let registry = self.interpreter.functions();

        if let Some(name) = expr.identifiers().into_iter().find(|name| {
            !bound.contains(name) && !registry.get(name).is_some_and(|f| f.arity == 0)
        }) {
            return Err(EvalError::UnboundVariable(name).into());
        }
        if let Some(name) = expr
            .function_calls()
            .into_iter()
            .find(|name| registry.get(name).is_none())
        {
            return Err(EvalError::UnknownFunction(name).into());
        }
        Ok(())
    }
}

/// Copies `raw`, filling non-derived fields whose value is missing or null
/// with their default.
fn with_defaults(fields: &[Field], raw: &ValueMap) -> ValueMap {
    let mut values = raw.clone();
    for field in fields.iter().filter(|f| !f.is_derived) {
        let Some(default) = &field.default_value else {
            continue;
        };
        let missing = values.get(&field.id).is_none_or(Value::is_null);
        if missing {
            values.insert(field.id.clone(), default.clone());
        }
    }
    values
}

/// Evaluates with a default [`Engine`].
pub fn evaluate(schema: &FormSchema, raw: &ValueMap) -> Evaluation {
    Engine::new().evaluate(schema, raw)
}
