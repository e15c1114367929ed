//! Clap CLI definitions for the `formctl` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// formctl -- evaluate form schemas with derived fields.
#[derive(Parser, Debug)]
#[command(
    name = "formctl",
    about = "Evaluate form schemas with derived fields",
    long_about = "Computes derived fields from formulas over their parent fields, validates \
                  submitted values, and manages a local store of form schemas.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: ./formctl.yaml when present).
    #[arg(long, global = true, env = "FORMCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Form store path (overrides store.path from config).
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Date used by `today()` and `calculateAge`, as YYYY-MM-DD.
    #[arg(long, global = true, value_name = "DATE")]
    pub today: Option<String>,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute derived fields and validate values against a form.
    Eval(EvalArgs),

    /// Check a form for schema problems, bad parents, and cycles.
    #[command(alias = "lint")]
    Check(CheckArgs),

    /// Evaluate a single formula.
    Formula(FormulaArgs),

    /// Suggest formulas for a derived field from its parents.
    Suggest(SuggestArgs),

    /// Manage saved forms.
    Store(StoreArgs),

    /// Show or write configuration.
    Config(ConfigArgs),

    /// Generate shell completion scripts.
    Completion(CompletionArgs),
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Arguments for `formctl eval`.
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Form schema file (JSON or YAML) or the id of a saved form.
    pub form: String,

    /// JSON object of raw values keyed by field id.
    #[arg(long, value_name = "FILE")]
    pub values: Option<PathBuf>,

    /// Set one value, as FIELD_ID=JSON (bare text is taken as a string).
    #[arg(long = "set", value_name = "FIELD_ID=VALUE")]
    pub set: Vec<String>,

    /// Exit with status 2 when the values would not be accepted.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `formctl check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Form schema file (JSON or YAML) or the id of a saved form.
    pub form: String,
}

/// Arguments for `formctl formula`.
#[derive(Args, Debug)]
pub struct FormulaArgs {
    /// Formula text, e.g. "width * height".
    pub expression: String,

    /// Bind a variable, as NAME=JSON (bare text is taken as a string).
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,
}

/// Arguments for `formctl suggest`.
#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Form schema file (JSON or YAML) or the id of a saved form.
    pub form: String,

    /// Id of the field to suggest for.
    pub field: String,

    /// Parent field ids to build suggestions from (default: the field's own parents).
    #[arg(long = "parent", value_name = "FIELD_ID")]
    pub parents: Vec<String>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Arguments for `formctl store`.
#[derive(Args, Debug)]
pub struct StoreArgs {
    #[command(subcommand)]
    pub command: StoreCommands,
}

/// Store subcommands.
#[derive(Subcommand, Debug)]
pub enum StoreCommands {
    /// List saved forms.
    List,
    /// Show a saved form.
    Show(StoreIdArgs),
    /// Save a form schema file as a new form.
    Save(StoreSaveArgs),
    /// Replace a saved form with the contents of a schema file.
    Update(StoreUpdateArgs),
    /// Delete a saved form.
    Delete(StoreIdArgs),
}

#[derive(Args, Debug)]
pub struct StoreIdArgs {
    /// Form id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct StoreSaveArgs {
    /// Form schema file (JSON or YAML).
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct StoreUpdateArgs {
    /// Form id.
    pub id: String,

    /// Form schema file (JSON or YAML).
    pub file: PathBuf,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Arguments for `formctl config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration.
    Show,
    /// Write a config file with default values.
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Where to write (default: ./formctl.yaml).
    pub path: Option<PathBuf>,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Arguments for `formctl completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Completion subcommands.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate Bash completions.
    Bash,
    /// Generate Zsh completions.
    Zsh,
    /// Generate Fish completions.
    Fish,
    /// Generate PowerShell completions.
    Powershell,
}
