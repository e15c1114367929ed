//! Terminal styling for `formctl` output.
//!
//! Provides colour detection with an explicit override, and render helpers
//! for field values, validation messages and derivation errors.

pub mod styles;
pub mod terminal;
