//! Form evaluation engine.
//!
//! Ties the formula interpreter and the validation pipeline together:
//! derived fields are resolved into a dependency order, computed, and the
//! user-entered fields are validated, all in a single idempotent pass.

pub mod binding;
pub mod coordinator;
pub mod error;
pub mod graph;
pub mod suggest;

pub use binding::normalize_label;
pub use coordinator::{DEFAULT_ERROR_VALUE, Engine, Evaluation, evaluate};
pub use error::{DerivationError, ResolveError};
pub use graph::{Resolution, ResolvePolicy, resolve};
pub use suggest::{available_parents, suggest_formulas};
