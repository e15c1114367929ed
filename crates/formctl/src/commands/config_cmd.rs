//! `formctl config` -- show or write configuration.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use forms_config::config::CONFIG_FILE_NAME;
use forms_config::{FormsConfig, save_config};

use crate::cli::{ConfigArgs, ConfigCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `formctl config` command.
pub fn run(ctx: &RuntimeContext, args: &ConfigArgs) -> Result<()> {
    match &args.command {
        ConfigCommands::Show => {
            if ctx.json {
                output_json(&ctx.config);
            } else {
                let yaml = serde_yaml::to_string(&ctx.config)
                    .context("failed to render configuration")?;
                print!("{}", yaml);
            }
        }
        ConfigCommands::Init(a) => {
            let path = a
                .path
                .clone()
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            if path.exists() && !a.force {
                bail!(
                    "{} already exists\nHint: pass --force to overwrite it",
                    path.display()
                );
            }
            save_config(&path, &FormsConfig::default())
                .with_context(|| format!("failed to write {}", path.display()))?;
            if !ctx.quiet {
                println!("wrote {}", path.display());
            }
        }
    }
    Ok(())
}
