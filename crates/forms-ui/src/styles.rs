//! Ayu color theme and styling functions for formctl output.
//!
//! Uses the Ayu Dark palette. Only states that need attention get colour:
//! validation failures and derivation errors are red, derived values are
//! accented, empty values are muted.

use forms_core::enums::FieldType;
use forms_core::field::Field;
use owo_colors::OwoColorize;
use serde_json::Value;

use crate::terminal::{supports_color, terminal_width};

// ---------------------------------------------------------------------------
// Ayu Dark color palette (RGB values)
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c - bright green
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454 - bright yellow
const FAIL: (u8, u8, u8) = (0xf0, 0x71, 0x78); // #f07178 - bright red
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680 - muted gray
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff); // #59c2ff - bright blue
const DERIVED: (u8, u8, u8) = (0xd2, 0xa6, 0xff); // #d2a6ff - purple

// ---------------------------------------------------------------------------
// Icons
// ---------------------------------------------------------------------------

pub const ICON_PASS: &str = "\u{2713}"; // check mark
pub const ICON_FAIL: &str = "\u{2716}"; // heavy x
/// Marks a computed field.
pub const ICON_DERIVED: &str = "\u{0192}"; // latin small f with hook

pub const TREE_CHILD: &str = "\u{23BF} ";
/// Separators never grow past this many columns.
const SEPARATOR_WIDTH: usize = 42;

// ---------------------------------------------------------------------------
// Helper: apply truecolor only when color is supported
// ---------------------------------------------------------------------------

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

fn color_bold_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Core semantic render helpers
// ---------------------------------------------------------------------------

pub fn render_pass(s: &str) -> String {
    color_str(s, PASS)
}

pub fn render_warn(s: &str) -> String {
    color_str(s, WARN)
}

pub fn render_fail(s: &str) -> String {
    color_str(s, FAIL)
}

pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

pub fn render_accent(s: &str) -> String {
    color_str(s, ACCENT)
}

pub fn render_bold(s: &str) -> String {
    if supports_color() {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

/// Renders a section header in uppercase with accent color and bold.
pub fn render_category(s: &str) -> String {
    color_bold_str(&s.to_uppercase(), ACCENT)
}

pub fn render_separator() -> String {
    render_muted(&"\u{2500}".repeat(terminal_width().min(SEPARATOR_WIDTH)))
}

pub fn render_pass_icon() -> String {
    color_str(ICON_PASS, PASS)
}

pub fn render_fail_icon() -> String {
    color_str(ICON_FAIL, FAIL)
}

// ---------------------------------------------------------------------------
// Form rendering
// ---------------------------------------------------------------------------

/// Renders a value the way it would be stored: strings quoted, arrays and
/// objects as compact JSON. Missing and `null` values are muted.
pub fn render_value(value: Option<&Value>) -> String {
    match value {
        None => render_muted("(empty)"),
        Some(Value::Null) => render_muted("null"),
        Some(v) => v.to_string(),
    }
}

/// Renders a field type name. Derived fields show the derived marker.
pub fn render_field_type(field: &Field) -> String {
    if field.is_derived {
        return color_str(&format!("{} derived", ICON_DERIVED), DERIVED);
    }
    match &field.field_type {
        FieldType::Custom(name) => render_warn(name),
        other => other.as_str().to_string(),
    }
}

/// One-line field summary: `label (id) [type] = value`.
pub fn render_field_line(field: &Field, value: Option<&Value>) -> String {
    format!(
        "{} {} [{}] = {}",
        render_bold(&field.label),
        render_muted(&format!("({})", field.id)),
        render_field_type(field),
        render_value(value),
    )
}

/// An indented failure line beneath a field.
pub fn render_problem(message: &str) -> String {
    format!("  {}{} {}", TREE_CHILD, render_fail_icon(), render_fail(message))
}
