//! Sandboxed formula language for derived form fields.
//!
//! Formulas are tokenized, parsed into an [`Expr`] and walked by the
//! [`Interpreter`]. The only things a formula can reach are the variables
//! in its [`Environment`] and the functions in its [`FunctionRegistry`].
//!
//! ```
//! use forms_expr::{Environment, FunctionRegistry, evaluate};
//! use serde_json::json;
//!
//! let mut env = Environment::new();
//! env.insert("width".into(), json!(4));
//! env.insert("height".into(), json!(5));
//! let area = evaluate("width * height", &env, &FunctionRegistry::builtins()).unwrap();
//! assert_eq!(area, json!(20));
//! ```

pub mod ast;
pub mod error;
pub mod eval;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use error::{EvalError, Limit};
pub use eval::{Environment, Interpreter, Limits};
pub use functions::{Clock, FixedClock, Function, FunctionRegistry, SystemClock};
pub use parser::parse;

use serde_json::Value;

/// One-shot evaluation with the system clock and default limits.
pub fn evaluate(
    formula: &str,
    env: &Environment,
    functions: &FunctionRegistry,
) -> Result<Value, EvalError> {
    Interpreter::new()
        .with_functions(functions.clone())
        .evaluate(formula, env)
}
