//! Output formatting helpers for the `formctl` CLI.
//!
//! Provides JSON output, table formatting, and human-readable display of
//! evaluations and saved forms.

use std::collections::BTreeMap;
use std::io::{self, Write};

use forms_core::schema::{ErrorMap, FormSchema, ValueMap};
use forms_engine::Evaluation;
use forms_ui::styles::{
    render_category, render_fail_icon, render_field_line, render_muted, render_pass, render_pass_icon,
    render_problem, render_separator,
};
use serde::Serialize;

/// JSON view of an [`Evaluation`].
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationView<'a> {
    pub values: &'a ValueMap,
    pub errors: &'a ErrorMap,
    pub derivation_errors: BTreeMap<&'a str, ProblemView>,
    pub can_submit: bool,
}

/// A machine-readable problem: a stable kind plus the display message.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProblemView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub kind: String,
    pub message: String,
}

impl<'a> EvaluationView<'a> {
    pub fn new(evaluation: &'a Evaluation) -> Self {
        Self {
            values: &evaluation.values,
            errors: &evaluation.errors,
            derivation_errors: evaluation
                .derivation_errors
                .iter()
                .map(|(id, e)| {
                    (
                        id.as_str(),
                        ProblemView {
                            field: None,
                            kind: e.kind().to_string(),
                            message: e.to_string(),
                        },
                    )
                })
                .collect(),
            can_submit: evaluation.can_submit(),
        }
    }
}

/// A saved form, one row of `store list`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub id: String,
    pub name: String,
    pub fields: usize,
    pub derived: usize,
    pub updated_at: String,
}

impl FormSummary {
    pub fn from_schema(schema: &FormSchema) -> Self {
        Self {
            id: schema.id.clone(),
            name: schema.name.clone(),
            fields: schema.fields.len(),
            derived: schema.derived_fields().count(),
            updated_at: schema.updated_at.to_rfc3339(),
        }
    }

    pub fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.fields.to_string(),
            self.derived.to_string(),
            self.updated_at.clone(),
        ]
    }
}

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print a simple table with headers and rows.
///
/// Column widths are computed from the data for alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for line in format_table(headers, rows) {
        let _ = writeln!(handle, "{}", line);
    }
}

fn format_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let join = |cells: Vec<String>| cells.join("  ").trim_end().to_string();
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(join(
        headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<w$}", h, w = *w))
            .collect(),
    ));
    lines.push(join(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        lines.push(join(
            row.iter()
                .enumerate()
                .map(|(i, cell)| match widths.get(i) {
                    Some(w) => format!("{:<w$}", cell, w = *w),
                    None => cell.clone(),
                })
                .collect(),
        ));
    }
    lines
}

/// Renders an evaluation as one line per field in display order, with
/// problems indented beneath the field they belong to.
pub fn format_evaluation(schema: &FormSchema, evaluation: &Evaluation) -> String {
    let mut lines = vec![render_category(&schema.name), render_separator()];
    for field in schema.sorted_fields() {
        lines.push(render_field_line(field, evaluation.values.get(&field.id)));
        for message in evaluation.errors.get(&field.id).into_iter().flatten() {
            lines.push(render_problem(message));
        }
        if let Some(err) = evaluation.derivation_errors.get(&field.id) {
            lines.push(render_problem(&err.to_string()));
        }
    }
    lines.push(render_separator());
    let invalid = evaluation.errors.len();
    if invalid == 0 {
        lines.push(format!("{} {}", render_pass_icon(), render_pass("ready to submit")));
    } else {
        lines.push(format!(
            "{} {} field(s) need attention",
            render_fail_icon(),
            invalid
        ));
    }
    if !evaluation.derivation_errors.is_empty() {
        lines.push(render_muted(&format!(
            "{} derived field(s) could not be computed",
            evaluation.derivation_errors.len()
        )));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use forms_core::field::FieldBuilder;
    use forms_core::enums::FieldType;
    use forms_core::rule::Rule;
    use forms_engine::Engine;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn area_form() -> FormSchema {
        FormSchema {
            id: "form-area".into(),
            name: "Area".into(),
            fields: vec![
                FieldBuilder::new("w", "Width")
                    .field_type(FieldType::Number)
                    .rule(Rule::required("Width is required"))
                    .build(),
                FieldBuilder::new("h", "Height")
                    .field_type(FieldType::Number)
                    .order(1)
                    .build(),
                FieldBuilder::new("a", "Area")
                    .derived(["w", "h"], "width * height")
                    .order(2)
                    .build(),
            ],
            created_at: Default::default(),
            updated_at: Default::default(),
        }
    }

    #[test]
    fn evaluation_view_uses_camel_case_and_kinds() {
        let form = area_form();
        let raw = ValueMap::from([("h".to_string(), json!(5))]);
        let evaluation = Engine::new().evaluate(&form, &raw);
        let view = serde_json::to_value(EvaluationView::new(&evaluation)).unwrap();

        assert_eq!(view["canSubmit"], json!(false));
        assert_eq!(view["errors"]["w"], json!(["Width is required"]));
        assert_eq!(view["values"]["a"], json!("Error in calculation"));
        assert_eq!(
            view["derivationErrors"]["a"]["kind"],
            json!("type_mismatch")
        );
    }

    #[test]
    fn evaluation_text_lists_fields_in_order() {
        let form = area_form();
        let raw = ValueMap::from([
            ("w".to_string(), json!(4)),
            ("h".to_string(), json!(5)),
        ]);
        let text = format_evaluation(&form, &Engine::new().evaluate(&form, &raw));
        let width = text.find("Width").unwrap();
        let area = text.find("Area (a)").or_else(|| text.rfind("Area")).unwrap();
        assert!(width < area);
        assert!(text.contains("20"));
        assert!(text.contains("ready to submit"));
    }

    #[test]
    fn table_columns_align() {
        let lines = format_table(
            &["ID", "NAME"],
            &[
                vec!["form-a".into(), "Area".into()],
                vec!["form-bcd".into(), "Signup".into()],
            ],
        );
        assert_eq!(
            lines,
            vec![
                "ID        NAME".to_string(),
                "--------  ------".to_string(),
                "form-a    Area".to_string(),
                "form-bcd  Signup".to_string(),
            ]
        );
    }

    #[test]
    fn summary_counts_derived_fields() {
        let summary = FormSummary::from_schema(&area_form());
        assert_eq!(summary.fields, 3);
        assert_eq!(summary.derived, 1);
        assert_eq!(summary.row()[0], "form-area");
    }
}
