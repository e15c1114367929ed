//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds what a command handler needs: the loaded
//! configuration, global flags, and factories for the engine and the
//! form store.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use forms_config::{ColorMode, FormsConfig, load_config};
use forms_core::schema::{FormSchema, ValueMap};
use forms_engine::{Engine, ResolvePolicy};
use forms_expr::{FixedClock, Limits};
use forms_storage::{FormStore, JsonlFormStore};
use forms_ui::terminal::{ColorChoice, set_color_choice};
use serde_json::Value;
use tracing::debug;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Effective configuration (defaults, file, environment).
    pub config: FormsConfig,

    /// Path of the JSONL form store.
    pub store_path: PathBuf,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Fixed date for `today()`; the system clock is used when unset.
    pub today: Option<NaiveDate>,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// Flags win over the config file, which wins over built-in defaults.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let cwd = env::current_dir().context("cannot determine current directory")?;
        let config = load_config(global.config.as_deref(), &cwd)
            .context("failed to load configuration")?;

        let today = global
            .today
            .as_deref()
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .with_context(|| format!("invalid --today '{}': expected YYYY-MM-DD", s))
            })
            .transpose()?;

        set_color_choice(match config.output.color {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        });

        let store_path = global
            .store
            .clone()
            .unwrap_or_else(|| config.store.path.clone());
        debug!(store = %store_path.display(), "runtime context ready");

        Ok(Self {
            json: global.json || config.output.json,
            config,
            store_path,
            today,
            quiet: global.quiet,
        })
    }

    /// Builds an engine from the `engine` config section.
    pub fn engine(&self) -> Engine {
        let cfg = &self.config.engine;
        let engine = Engine::new()
            .with_limits(Limits {
                max_depth: cfg.max_depth,
                max_steps: cfg.max_steps,
                max_formula_len: cfg.max_formula_length,
            })
            .with_policy(ResolvePolicy {
                allow_derived_parents: cfg.allow_derived_parents,
            })
            .with_error_value(cfg.error_value.clone());
        match self.today {
            Some(date) => engine.with_clock(Arc::new(FixedClock(date))),
            None => engine,
        }
    }

    pub fn store(&self) -> JsonlFormStore {
        JsonlFormStore::new(&self.store_path)
    }

    /// Loads a form from a schema file, or from the store when `source`
    /// is not an existing path.
    pub fn load_form(&self, source: &str) -> Result<FormSchema> {
        let path = Path::new(source);
        if path.exists() {
            return read_schema_file(path);
        }
        self.store().get(source).with_context(|| {
            format!(
                "'{}' is neither a schema file nor a form in {}",
                source,
                self.store_path.display()
            )
        })
    }
}

/// Reads a schema file. `.yaml` and `.yml` files are parsed as YAML,
/// anything else as JSON.
pub fn read_schema_file(path: &Path) -> Result<FormSchema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let schema = if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?
    };
    Ok(schema)
}

/// Reads a JSON object of raw values keyed by field id.
pub fn read_values_file(path: &Path) -> Result<ValueMap> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} must hold a JSON object of field values", path.display()))
}

/// Parses `NAME=VALUE`. The value is read as JSON; text that is not valid
/// JSON is taken as a plain string, so `name=Ada` works unquoted.
pub fn parse_assignment(arg: &str) -> Result<(String, Value)> {
    let Some((name, raw)) = arg.split_once('=') else {
        bail!("expected NAME=VALUE, got '{}'", arg);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("missing name in '{}'", arg);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}
