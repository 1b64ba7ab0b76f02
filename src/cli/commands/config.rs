//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command. `path` is the `--config` override, if any.
pub fn run_config(action: &ConfigAction, path: Option<&str>, settings: Settings) -> Result<()> {
    let config_path = Settings::config_path(path);

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Edit => edit(&config_path, &settings)?,

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

fn edit(config_path: &PathBuf, settings: &Settings) -> Result<()> {
    // Create default config if it doesn't exist
    if !config_path.exists() {
        settings.save_to(config_path)?;
        Output::info(&format!("Created default config at {:?}", config_path));
    }

    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
    Output::info(&format!("Opening config in {}...", editor));

    match std::process::Command::new(&editor).arg(config_path).status() {
        Ok(s) if s.success() => Output::success("Config saved."),
        Ok(_) => Output::warning("Editor exited with non-zero status."),
        Err(e) => {
            Output::error(&format!("Failed to open editor: {}", e));
            Output::info(&format!("Config file is at: {:?}", config_path));
        }
    }

    Ok(())
}
