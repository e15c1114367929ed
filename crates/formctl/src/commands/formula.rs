//! `formctl formula` -- evaluate one formula against ad-hoc variables.

use anyhow::{Context, Result};
use forms_expr::Environment;
use forms_ui::styles::render_value;
use serde_json::json;

use crate::cli::FormulaArgs;
use crate::context::{RuntimeContext, parse_assignment};
use crate::output::output_json;

/// Execute the `formctl formula` command.
pub fn run(ctx: &RuntimeContext, args: &FormulaArgs) -> Result<()> {
    let mut env = Environment::new();
    for var in &args.vars {
        let (name, value) = parse_assignment(var)?;
        env.insert(name, value);
    }

    let engine = ctx.engine();
    let value = engine
        .interpreter()
        .evaluate(&args.expression, &env)
        .with_context(|| format!("cannot evaluate '{}'", args.expression))?;

    if ctx.json {
        output_json(&json!({
            "expression": args.expression,
            "value": value,
        }));
    } else {
        println!("{}", render_value(Some(&value)));
    }
    Ok(())
}
