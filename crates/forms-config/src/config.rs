//! Configuration types and loading.
//!
//! The main entry point is [`FormsConfig`]. It is assembled with
//! [`load_config`] from three layers, later layers winning:
//!
//! 1. built-in defaults
//! 2. a YAML file (`formctl.yaml` in the working directory, or an explicit path)
//! 3. environment variables prefixed `FORMS_`, with `__` separating sections
//!    (`FORMS_ENGINE__MAX_DEPTH=32`)

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "formctl.yaml";

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "FORMS_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration could not be serialized as YAML.
    #[error("failed to serialize config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Merging or extracting the layered configuration failed.
    #[error("invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A configuration value was out of range.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Formula evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Maximum formula nesting depth.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum number of expression nodes evaluated per formula.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Maximum formula length in bytes.
    #[serde(default = "default_max_formula_length")]
    pub max_formula_length: usize,

    /// Value shown for a derived field whose formula failed.
    #[serde(default = "default_error_value")]
    pub error_value: String,

    /// Whether derived fields may use other derived fields as parents.
    #[serde(default)]
    pub allow_derived_parents: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_steps: default_max_steps(),
            max_formula_length: default_max_formula_length(),
            error_value: default_error_value(),
            allow_derived_parents: false,
        }
    }
}

/// Largest accepted `engine.max-depth`; deeper trees risk the thread stack.
pub const MAX_DEPTH_CEILING: usize = 256;

fn default_max_depth() -> usize {
    64
}

fn default_max_steps() -> usize {
    10_000
}

fn default_max_formula_length() -> usize {
    4096
}

fn default_error_value() -> String {
    "Error in calculation".to_string()
}

/// Form store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSONL form store.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("forms.jsonl")
}

/// When to colour terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Colour when stdout is a terminal and the environment allows it.
    #[default]
    Auto,
    Always,
    Never,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Output JSON instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub color: ColorMode,
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The full configuration.
///
/// Every field has a serde default, so a partial YAML file only overrides
/// what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FormsConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl FormsConfig {
    /// Rejects limits that would make every formula fail.
    pub fn validate(&self) -> Result<()> {
        let limits = [
            ("engine.max-depth", self.engine.max_depth),
            ("engine.max-steps", self.engine.max_steps),
            ("engine.max-formula-length", self.engine.max_formula_length),
        ];
        for (key, value) in limits {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.engine.max_depth > MAX_DEPTH_CEILING {
            return Err(ConfigError::InvalidValue {
                key: "engine.max-depth".to_string(),
                reason: format!("must be at most {}", MAX_DEPTH_CEILING),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Builds the layered figment without extracting it.
///
/// `file` is merged only when it exists; callers that require the file
/// check that first.
pub fn figment(file: Option<&Path>, env_prefix: &str) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(FormsConfig::default()));
    if let Some(path) = file.filter(|p| p.exists()) {
        figment = figment.merge(Yaml::file(path));
    }
    // FORMS_ENGINE__MAX_DEPTH -> engine.max-depth
    figment.merge(
        Env::prefixed(env_prefix)
            .map(|key| key.as_str().replace("__", ".").replace('_', "-").into()),
    )
}

/// Loads configuration.
///
/// With `explicit` set, that file must exist. Otherwise `formctl.yaml` in
/// `search_dir` is used when present.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] for a missing explicit file,
/// [`ConfigError::Extract`] when a layer holds values of the wrong shape,
/// and [`ConfigError::InvalidValue`] for out-of-range limits.
pub fn load_config(explicit: Option<&Path>, search_dir: &Path) -> Result<FormsConfig> {
    let file = match explicit {
        Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
        Some(path) => path.to_path_buf(),
        None => search_dir.join(CONFIG_FILE_NAME),
    };
    let config: FormsConfig = figment(Some(&file), ENV_PREFIX)
        .extract()
        .map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}

/// Writes `config` as YAML, creating parent directories as needed.
pub fn save_config(path: &Path, config: &FormsConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
