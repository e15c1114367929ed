//! `formctl suggest` -- starter formulas for a derived field.

use anyhow::{Context, Result, bail};
use forms_core::field::Field;
use forms_engine::binding::variable_name;
use forms_engine::{available_parents, suggest_formulas};
use forms_ui::styles::{render_accent, render_category, render_muted};
use serde::Serialize;

use crate::cli::SuggestArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

#[derive(Serialize)]
struct SuggestView<'a> {
    field: &'a str,
    /// Parents the suggestions were built from.
    parents: Vec<&'a str>,
    /// Every field this one may use as a parent.
    available: Vec<&'a str>,
    suggestions: Vec<String>,
}

/// Execute the `formctl suggest` command.
pub fn run(ctx: &RuntimeContext, args: &SuggestArgs) -> Result<()> {
    let schema = ctx.load_form(&args.form)?;
    let field = schema
        .field(&args.field)
        .with_context(|| format!("form '{}' has no field '{}'", schema.name, args.field))?;

    let policy = ctx.engine().policy();
    let available = available_parents(field, &schema.fields, policy);

    let wanted: Vec<&str> = if args.parents.is_empty() {
        field.parent_ids().iter().map(String::as_str).collect()
    } else {
        args.parents.iter().map(String::as_str).collect()
    };
    let parents: Vec<&Field> = if wanted.is_empty() {
        available.clone()
    } else {
        wanted
            .iter()
            .map(|id| match available.iter().find(|f| f.id == *id) {
                Some(f) => Ok(*f),
                None if schema.field(id).is_some() => {
                    bail!("field '{}' cannot be a parent of '{}'", id, field.id)
                }
                None => bail!("form '{}' has no field '{}'", schema.name, id),
            })
            .collect::<Result<_>>()?
    };

    let suggestions = suggest_formulas(&parents);

    if ctx.json {
        output_json(&SuggestView {
            field: &field.id,
            parents: parents.iter().map(|f| f.id.as_str()).collect(),
            available: available.iter().map(|f| f.id.as_str()).collect(),
            suggestions,
        });
        return Ok(());
    }

    println!("{}", render_category("variables"));
    for p in &parents {
        println!(
            "  {} {}",
            render_accent(&variable_name(p)),
            render_muted(&format!("({}, {})", p.id, p.field_type))
        );
    }
    println!("{}", render_category("suggestions"));
    if suggestions.is_empty() {
        println!("  {}", render_muted("no suggestions for these parents"));
    }
    for s in &suggestions {
        println!("  {}", s);
    }
    Ok(())
}
