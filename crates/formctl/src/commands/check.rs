//! `formctl check` -- find problems in a form before it is used.
//!
//! Checks for:
//! - Schema shape problems (missing labels, options, formulas, duplicate ids)
//! - Derived fields with unknown or disallowed parents
//! - Cyclic dependencies between derived fields
//! - Formulas that fail to parse, read unbound names, or call unknown functions

use anyhow::{Result, bail};
use forms_core::lint::lint_schema;
use forms_core::schema::FormSchema;
use forms_engine::{Engine, resolve};
use serde::Serialize;

use crate::cli::CheckArgs;
use crate::context::RuntimeContext;
use crate::output::{ProblemView, output_json};
use forms_ui::styles::{render_fail_icon, render_muted, render_pass_icon};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CheckReport {
    form: String,
    order: Vec<String>,
    problems: Vec<ProblemView>,
}

/// Execute the `formctl check` command.
pub fn run(ctx: &RuntimeContext, args: &CheckArgs) -> Result<()> {
    let schema = ctx.load_form(&args.form)?;
    let report = check(&ctx.engine(), &schema);

    if ctx.json {
        output_json(&report);
    } else if !ctx.quiet {
        for p in &report.problems {
            let scope = p.field.as_deref().unwrap_or("form");
            println!("{} [{}] {}", render_fail_icon(), scope, p.message);
        }
        if !report.order.is_empty() {
            println!(
                "{}",
                render_muted(&format!("evaluation order: {}", report.order.join(" -> ")))
            );
        }
        if report.problems.is_empty() {
            println!("{} {}: no problems found", render_pass_icon(), schema.name);
        }
    }

    if !report.problems.is_empty() {
        bail!("{} problem(s) found in '{}'", report.problems.len(), schema.name);
    }
    Ok(())
}

fn check(engine: &Engine, schema: &FormSchema) -> CheckReport {
    let mut problems: Vec<ProblemView> = lint_schema(schema)
        .into_iter()
        .map(|e| ProblemView {
            field: None,
            kind: "schema".to_string(),
            message: e.to_string(),
        })
        .collect();

    let resolution = resolve(&schema.fields, engine.policy());
    for (id, err) in &resolution.failures {
        problems.push(ProblemView {
            field: Some(id.clone()),
            kind: err.kind().to_string(),
            message: err.to_string(),
        });
    }

    // Formulas of fields that failed resolution would only repeat the
    // same complaint.
    for field in schema.derived_fields() {
        if resolution.failure(&field.id).is_some() {
            continue;
        }
        if let Err(err) = engine.check_formula(field, &schema.fields) {
            problems.push(ProblemView {
                field: Some(field.id.clone()),
                kind: err.kind().to_string(),
                message: err.to_string(),
            });
        }
    }

    CheckReport {
        form: schema.name.clone(),
        order: resolution.order,
        problems,
    }
}
