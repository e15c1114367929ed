//! Tree-walking evaluator.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{EvalError, Limit};
use crate::functions::{Clock, FunctionRegistry, SystemClock};
use crate::parser::{DEFAULT_MAX_DEPTH, parse_with_depth};
use crate::value::{as_number, loose_eq, number, stringify, truthy, type_name};

/// Variables visible to a formula.
pub type Environment = BTreeMap<String, Value>;

/// Resource caps applied to each formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_depth: usize,
    pub max_steps: usize,
    pub max_formula_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_steps: 10_000,
            max_formula_len: 4096,
        }
    }
}

/// Parses and evaluates formulas against a function registry and clock.
#[derive(Clone)]
pub struct Interpreter {
    functions: FunctionRegistry,
    clock: Arc<dyn Clock>,
    limits: Limits,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("functions", &self.functions)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    /// Builtin functions, the system clock and default limits.
    pub fn new() -> Self {
        Self {
            functions: FunctionRegistry::builtins(),
            clock: Arc::new(SystemClock),
            limits: Limits::default(),
        }
    }

    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Parses a formula under the configured length and depth caps.
    pub fn parse(&self, formula: &str) -> Result<Expr, EvalError> {
        if formula.len() > self.limits.max_formula_len {
            return Err(EvalError::EvaluationLimitExceeded(Limit::FormulaLength(
                self.limits.max_formula_len,
            )));
        }
        parse_with_depth(formula, self.limits.max_depth)
    }

    /// Parses and evaluates `formula` against `env`.
    pub fn evaluate(&self, formula: &str, env: &Environment) -> Result<Value, EvalError> {
        let expr = self.parse(formula)?;
        self.eval_expr(&expr, env)
    }

    /// Evaluates an already parsed expression.
    pub fn eval_expr(&self, expr: &Expr, env: &Environment) -> Result<Value, EvalError> {
        let mut frame = Frame {
            interp: self,
            env,
            steps: 0,
        };
        let result = frame.eval(expr);
        trace!(steps = frame.steps, ok = result.is_ok(), "formula evaluated");
        result
    }
}

struct Frame<'a> {
    interp: &'a Interpreter,
    env: &'a Environment,
    steps: usize,
}

impl Frame<'_> {
    fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        self.steps += 1;
        if self.steps > self.interp.limits.max_steps {
            return Err(EvalError::EvaluationLimitExceeded(Limit::Steps(
                self.interp.limits.max_steps,
            )));
        }

        match expr {
            Expr::Number(n) => number(*n),
            Expr::Str(s) => Ok(Value::String(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Ident { name, .. } => self.lookup(name),
            Expr::Unary { op, operand } => {
                let v = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!truthy(&v))),
                    UnaryOp::Neg => match as_number(&v) {
                        Some(n) => number(-n),
                        None => Err(EvalError::mismatch(format!(
                            "cannot negate {}",
                            type_name(&v)
                        ))),
                    },
                }
            }
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
            Expr::Conditional {
                cond,
                then,
                otherwise,
            } => {
                if truthy(&self.eval(cond)?) {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Call { name, args, .. } => {
                let function = self
                    .interp
                    .functions
                    .get(name)
                    .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
                let values = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>, _>>()?;
                function.call(&values, self.interp.clock.as_ref())
            }
        }
    }

    /// Bound variables win; zero-argument functions such as `today` are
    /// readable as bare names.
    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(v) = self.env.get(name) {
            return Ok(v.clone());
        }
        match self.interp.functions.get(name) {
            Some(f) if f.arity == 0 => f.call(&[], self.interp.clock.as_ref()),
            _ => Err(EvalError::UnboundVariable(name.to_string())),
        }
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, EvalError> {
        match op {
            BinaryOp::And => {
                let l = self.eval(lhs)?;
                return if truthy(&l) { self.eval(rhs) } else { Ok(l) };
            }
            BinaryOp::Or => {
                let l = self.eval(lhs)?;
                return if truthy(&l) { Ok(l) } else { self.eval(rhs) };
            }
            _ => {}
        }

        let l = self.eval(lhs)?;
        let r = self.eval(rhs)?;
        match op {
            BinaryOp::Eq => Ok(Value::Bool(loose_eq(&l, &r))),
            BinaryOp::NotEq => Ok(Value::Bool(!loose_eq(&l, &r))),
            BinaryOp::Add => match (&l, &r) {
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::String(stringify(&l) + &stringify(&r)))
                }
                _ => {
                    let (a, b) = numeric_operands(op, &l, &r)?;
                    number(a + b)
                }
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                let (a, b) = numeric_operands(op, &l, &r)?;
                match op {
                    BinaryOp::Sub => number(a - b),
                    BinaryOp::Mul => number(a * b),
                    _ if b == 0.0 => Err(EvalError::DivisionByZero),
                    BinaryOp::Div => number(a / b),
                    _ => number(a % b),
                }
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = match (&l, &r) {
                    (Value::Number(_), Value::Number(_)) => {
                        let (a, b) = numeric_operands(op, &l, &r)?;
                        a.partial_cmp(&b)
                    }
                    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                    _ => None,
                }
                .ok_or_else(|| mismatch(op, &l, &r))?;
                Ok(Value::Bool(match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            }
            BinaryOp::And => Ok(if truthy(&l) { r } else { l }),
            BinaryOp::Or => Ok(if truthy(&l) { l } else { r }),
        }
    }
}

fn numeric_operands(op: BinaryOp, l: &Value, r: &Value) -> Result<(f64, f64), EvalError> {
    match (as_number(l), as_number(r)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(mismatch(op, l, r)),
    }
}

fn mismatch(op: BinaryOp, l: &Value, r: &Value) -> EvalError {
    EvalError::mismatch(format!(
        "cannot apply '{}' to {} and {}",
        op,
        type_name(l),
        type_name(r)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{FixedClock, Function};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn interp() -> Interpreter {
        Interpreter::new().with_clock(Arc::new(FixedClock(
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        )))
    }

    fn env(pairs: &[(&str, Value)]) -> Environment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn eval(formula: &str, e: &Environment) -> Result<Value, EvalError> {
        interp().evaluate(formula, e)
    }

    #[test]
    fn numeric_product() {
        let e = env(&[("width", json!(4)), ("height", json!(5))]);
        assert_eq!(eval("width * height", &e), Ok(json!(20)));
        assert_eq!(eval("width / height", &e), Ok(json!(0.8)));
        assert_eq!(eval("height % width", &e), Ok(json!(1)));
        assert_eq!(eval("-(width - height) * 2", &e), Ok(json!(2)));
    }

    #[test]
    fn age_from_birthdate() {
        let e = env(&[("birthdate", json!("2000-06-15"))]);
        assert_eq!(eval("calculateAge(birthdate)", &e), Ok(json!(23)));
    }

    #[test]
    fn today_as_variable_and_call() {
        let empty = Environment::new();
        assert_eq!(eval("today", &empty), Ok(json!("2024-01-10")));
        assert_eq!(eval("today()", &empty), Ok(json!("2024-01-10")));
        assert_eq!(eval("calculateAge(today)", &empty), Ok(json!(0)));

        let shadowed = env(&[("today", json!("holiday"))]);
        assert_eq!(eval("today", &shadowed), Ok(json!("holiday")));
    }

    #[test]
    fn string_concatenation() {
        let e = env(&[("first", json!("Ada")), ("last", json!("Lovelace"))]);
        assert_eq!(eval("first + ' ' + last", &e), Ok(json!("Ada Lovelace")));
        assert_eq!(eval("'n=' + 3", &e), Ok(json!("n=3")));
        assert_eq!(eval("1 + 2 + 'x'", &e), Ok(json!("3x")));
        assert_eq!(eval("'x' + null", &e), Ok(json!("xnull")));
    }

    #[test]
    fn comparisons_and_logic() {
        let e = env(&[("age", json!(20)), ("name", json!(""))]);
        assert_eq!(eval("age >= 18 ? 'adult' : 'minor'", &e), Ok(json!("adult")));
        assert_eq!(eval("name || 'anonymous'", &e), Ok(json!("anonymous")));
        assert_eq!(eval("age && name", &e), Ok(json!("")));
        assert_eq!(eval("!name", &e), Ok(json!(true)));
        assert_eq!(eval("1 == '1'", &e), Ok(json!(false)));
        assert_eq!(eval("2 == 2.0", &e), Ok(json!(true)));
        assert_eq!(eval("'b' > 'a'", &e), Ok(json!(true)));
    }

    #[test]
    fn short_circuit_skips_errors() {
        let empty = Environment::new();
        assert_eq!(eval("false && missing", &empty), Ok(json!(false)));
        assert_eq!(eval("1 || missing", &empty), Ok(json!(1)));
        assert_eq!(eval("true ? 1 : missing", &empty), Ok(json!(1)));
    }

    #[test]
    fn typed_failures() {
        let e = env(&[("n", json!(null)), ("s", json!("x"))]);
        assert_eq!(
            eval("missing + 1", &e),
            Err(EvalError::UnboundVariable("missing".into()))
        );
        assert_eq!(
            eval("n * 5", &e),
            Err(EvalError::TypeMismatch(
                "cannot apply '*' to null and number".into()
            ))
        );
        assert_eq!(
            eval("s < 1", &e),
            Err(EvalError::TypeMismatch(
                "cannot apply '<' to string and number".into()
            ))
        );
        assert_eq!(
            eval("alert(1)", &e),
            Err(EvalError::UnknownFunction("alert".into()))
        );
        assert_eq!(eval("1 / 0", &e), Err(EvalError::DivisionByZero));
        assert_eq!(eval("1 % 0", &e), Err(EvalError::DivisionByZero));
        assert!(matches!(eval("s.length", &e), Err(EvalError::Syntax { .. })));
        assert!(matches!(eval("s = 1", &e), Err(EvalError::Syntax { .. })));
    }

    #[test]
    fn formula_length_is_capped() {
        let i = interp().with_limits(Limits {
            max_formula_len: 8,
            ..Limits::default()
        });
        assert_eq!(
            i.evaluate("1 + 2 + 3 + 4", &Environment::new()),
            Err(EvalError::EvaluationLimitExceeded(Limit::FormulaLength(8)))
        );
    }

    #[test]
    fn step_budget_is_capped() {
        let i = interp().with_limits(Limits {
            max_steps: 5,
            ..Limits::default()
        });
        assert_eq!(i.evaluate("1 + 1", &Environment::new()), Ok(json!(2)));
        assert_eq!(
            i.evaluate("1 + 1 + 1 + 1", &Environment::new()),
            Err(EvalError::EvaluationLimitExceeded(Limit::Steps(5)))
        );
    }

    #[test]
    fn flat_chain_within_length_limit_hits_depth_cap() {
        let formula = vec!["1"; 2048].join("+");
        assert!(formula.len() <= Limits::default().max_formula_len);
        assert_eq!(
            interp().evaluate(&formula, &Environment::new()),
            Err(EvalError::EvaluationLimitExceeded(Limit::Depth(
                Limits::default().max_depth
            )))
        );
        let short = vec!["1"; 50].join("+");
        assert_eq!(interp().evaluate(&short, &Environment::new()), Ok(json!(50)));
    }

    #[test]
    fn empty_registry_blocks_builtins() {
        let i = interp().with_functions(FunctionRegistry::empty());
        assert_eq!(
            i.evaluate("calculateAge('2000-01-01')", &Environment::new()),
            Err(EvalError::UnknownFunction("calculateAge".into()))
        );
        assert_eq!(
            i.evaluate("today", &Environment::new()),
            Err(EvalError::UnboundVariable("today".into()))
        );
    }

    #[test]
    fn registered_functions_are_callable() {
        let mut reg = FunctionRegistry::builtins();
        reg.register(Function::new("max", 2, |args, _| {
            let a = args[0].as_f64().unwrap_or(f64::NAN);
            let b = args[1].as_f64().unwrap_or(f64::NAN);
            number(a.max(b))
        }));
        let i = interp().with_functions(reg);
        assert_eq!(i.evaluate("max(3, 7) * 2", &Environment::new()), Ok(json!(14)));
    }
}
