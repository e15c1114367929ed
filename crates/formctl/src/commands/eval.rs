//! `formctl eval` -- compute derived fields and validate a submission.

use anyhow::Result;
use forms_core::schema::ValueMap;
use tracing::info;

use crate::cli::EvalArgs;
use crate::context::{RuntimeContext, parse_assignment, read_values_file};
use crate::output::{EvaluationView, format_evaluation, output_json};

/// Exit status of `eval --strict` when the values would be rejected.
pub const EXIT_NOT_SUBMITTABLE: i32 = 2;

/// Execute the `formctl eval` command.
pub fn run(ctx: &RuntimeContext, args: &EvalArgs) -> Result<()> {
    let schema = ctx.load_form(&args.form)?;

    let mut raw = match &args.values {
        Some(path) => read_values_file(path)?,
        None => ValueMap::new(),
    };
    for assignment in &args.set {
        let (id, value) = parse_assignment(assignment)?;
        raw.insert(id, value);
    }

    let evaluation = ctx.engine().evaluate(&schema, &raw);

    if ctx.json {
        output_json(&EvaluationView::new(&evaluation));
    } else if !ctx.quiet {
        println!("{}", format_evaluation(&schema, &evaluation));
    }

    if args.strict && !evaluation.can_submit() {
        info!(form = %schema.name, "submission rejected");
        std::process::exit(EXIT_NOT_SUBMITTABLE);
    }
    Ok(())
}
