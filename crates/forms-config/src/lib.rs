//! Configuration for the form engine and the `formctl` CLI.
//!
//! Settings come from built-in defaults, then an optional `formctl.yaml`,
//! then `FORMS_*` environment variables. See [`config::load_config`].

pub mod config;

pub use config::{
    ColorMode, ConfigError, EngineConfig, FormsConfig, OutputConfig, StoreConfig, load_config,
    save_config,
};
