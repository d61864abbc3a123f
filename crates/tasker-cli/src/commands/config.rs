//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use tasker_core::{Backend, Config};

use crate::output::{Output, OutputFormat};

/// Keys accepted by `config set`
const KEYS: &str = "data_dir, backend, log_level, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => output.print_data(&config),
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:  {}", config.data_dir.display());
            println!("  backend:   {}", config.backend);
            println!("  log_level: {}", config.log_level);
            println!("  log_file:  {}", config.log_path().display());
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));
    if config.backend == Backend::Memory {
        output.warn("The memory backend keeps nothing between runs.");
    }

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "backend" => {
            config.backend = value.parse()?;
        }
        "log_level" => {
            let level = value.trim().to_ascii_lowercase();
            if !["trace", "debug", "info", "warn", "error", "off"].contains(&level.as_str()) {
                bail!("Invalid log level '{}'. Use trace, debug, info, warn, error or off.", value);
            }
            config.log_level = level;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: {}",
                key,
                KEYS
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "backend", "sqlite").unwrap();
        apply(&mut config, "log_level", "DEBUG").unwrap();
        apply(&mut config, "log_file", "/tmp/tasker.log").unwrap();
        apply(&mut config, "data_dir", "/tmp/tasker").unwrap();

        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/tasker.log")));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tasker"));

        apply(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = Config::default();

        assert!(apply(&mut config, "backend", "postgres").is_err());
        assert!(apply(&mut config, "log_level", "loud").is_err());
        let err = apply(&mut config, "sync_url", "x").unwrap_err();
        assert!(err.to_string().contains("Valid keys: data_dir, backend"));
    }
}
