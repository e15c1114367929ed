//! `formctl store` -- manage saved forms.
//!
//! Forms are linted before they are saved so the store only ever holds
//! schemas the engine can work with.

use anyhow::{Result, bail};
use forms_core::lint::lint_schema;
use forms_core::schema::FormSchema;
use forms_storage::FormStore;
use forms_ui::styles::{render_field_line, render_muted, render_pass_icon};
use serde_json::json;
use tracing::info;

use crate::cli::{StoreArgs, StoreCommands};
use crate::context::{RuntimeContext, read_schema_file};
use crate::output::{FormSummary, output_json, output_table};

/// Execute the `formctl store` command.
pub fn run(ctx: &RuntimeContext, args: &StoreArgs) -> Result<()> {
    let store = ctx.store();
    match &args.command {
        StoreCommands::List => {
            let forms = store.load_all()?;
            let summaries: Vec<FormSummary> = forms.iter().map(FormSummary::from_schema).collect();
            if ctx.json {
                output_json(&summaries);
            } else if summaries.is_empty() {
                if !ctx.quiet {
                    println!("{}", render_muted("no saved forms"));
                }
            } else {
                let rows: Vec<Vec<String>> = summaries.iter().map(FormSummary::row).collect();
                output_table(&["ID", "NAME", "FIELDS", "DERIVED", "UPDATED"], &rows);
            }
        }
        StoreCommands::Show(a) => {
            let schema = store.get(&a.id)?;
            if ctx.json {
                output_json(&schema);
            } else {
                println!("{} {}", schema.name, render_muted(&format!("({})", schema.id)));
                for field in schema.sorted_fields() {
                    println!("  {}", render_field_line(field, field.default_value.as_ref()));
                    if let Some(formula) = field.formula() {
                        println!("      {}", render_muted(&format!("= {}", formula)));
                    }
                }
            }
        }
        StoreCommands::Save(a) => {
            let schema = read_schema_file(&a.file)?;
            ensure_valid(&schema)?;
            let id = store.save(&schema)?;
            info!(id = %id, name = %schema.name, "form saved");
            if ctx.json {
                output_json(&json!({ "id": id }));
            } else if !ctx.quiet {
                println!("{} saved {} as {}", render_pass_icon(), schema.name, id);
            }
        }
        StoreCommands::Update(a) => {
            let schema = read_schema_file(&a.file)?;
            ensure_valid(&schema)?;
            store.update(&a.id, &schema)?;
            if ctx.json {
                output_json(&json!({ "id": a.id }));
            } else if !ctx.quiet {
                println!("{} updated {}", render_pass_icon(), a.id);
            }
        }
        StoreCommands::Delete(a) => {
            store.delete(&a.id)?;
            if ctx.json {
                output_json(&json!({ "id": a.id, "deleted": true }));
            } else if !ctx.quiet {
                println!("{} deleted {}", render_pass_icon(), a.id);
            }
        }
    }
    Ok(())
}

fn ensure_valid(schema: &FormSchema) -> Result<()> {
    let problems = lint_schema(schema);
    if problems.is_empty() {
        return Ok(());
    }
    let listed: Vec<String> = problems.iter().map(|p| format!("  - {}", p)).collect();
    bail!("form '{}' is not valid:\n{}", schema.name, listed.join("\n"));
}
