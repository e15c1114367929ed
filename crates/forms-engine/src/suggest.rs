//! Authoring helpers: which fields can be parents, and starter formulas.

use forms_core::enums::FieldType;
use forms_core::field::Field;

use crate::binding::variable_name;
use crate::graph::ResolvePolicy;

/// Fields `field` may list as parents, in display order.
///
/// A field never parents itself, checkbox groups are excluded, and derived
/// fields only qualify when the policy allows chains.
pub fn available_parents<'a>(
    field: &Field,
    fields: &'a [Field],
    policy: ResolvePolicy,
) -> Vec<&'a Field> {
    let mut out: Vec<&Field> = fields
        .iter()
        .filter(|f| f.id != field.id)
        .filter(|f| !f.is_derived || policy.allow_derived_parents)
        .filter(|f| f.field_type != FieldType::Checkbox)
        .collect();
    out.sort_by_key(|f| f.order);
    out
}

/// Starter formulas for a set of chosen parents.
pub fn suggest_formulas(parents: &[&Field]) -> Vec<String> {
    let mut formulas = Vec::new();

    if let Some(date) = parents.iter().find(|f| f.field_type == FieldType::Date) {
        formulas.push(format!("calculateAge({})", variable_name(date)));
    }

    let numeric: Vec<String> = of_type(parents, FieldType::Number);
    if let [a, b, ..] = numeric.as_slice() {
        formulas.push(format!("{} + {}", a, b));
        formulas.push(format!("{} * {}", a, b));
    }

    let text: Vec<String> = of_type(parents, FieldType::Text);
    if let [a, b, ..] = text.as_slice() {
        formulas.push(format!("{} + ' ' + {}", a, b));
    }

    formulas
}

fn of_type(parents: &[&Field], ty: FieldType) -> Vec<String> {
    parents
        .iter()
        .filter(|f| f.field_type == ty)
        .map(|f| variable_name(f))
        .collect()
}
