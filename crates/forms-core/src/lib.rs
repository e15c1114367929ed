//! Core types for the form builder.
//!
//! This crate holds the form data model (fields, rules, schemas, value and
//! error maps), schema editing and lint, id generation, and the per-field
//! validation pipeline. It knows nothing about formulas.

pub mod enums;
pub mod field;
pub mod idgen;
pub mod lint;
pub mod rule;
pub mod schema;
pub mod validation;
