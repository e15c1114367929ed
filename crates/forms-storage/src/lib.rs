//! Persistence for saved form schemas.
//!
//! Provides the [`FormStore`] trait, an in-memory implementation
//! ([`MemoryFormStore`]) and a JSON Lines file implementation
//! ([`JsonlFormStore`]).

pub mod error;
pub mod jsonl;
pub mod memory;
pub mod store;
pub mod traits;

// Re-exports for convenience.
pub use error::StorageError;
pub use memory::MemoryFormStore;
pub use store::JsonlFormStore;
pub use traits::FormStore;
