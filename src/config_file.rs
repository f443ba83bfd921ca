use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum::IntoEnumIterator;

use crate::cli::{Args, TargetFormat};
use crate::error::validate_compression;

/// Defaults file accepted by `--config`
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub format: Option<String>,
    pub compress: Option<u32>,
    pub jobs: Option<usize>,
    pub verbose: Option<bool>,
    pub dry_run: Option<bool>,
    pub json_progress: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

impl Args {
    /// Load configuration from a JSON file and merge with command-line arguments
    /// Command-line arguments take precedence over config file values
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let config = ConfigFile::load(&config_path)?;
            self.merge_from_config(config)?;

            if self.verbose {
                eprintln!("Loaded configuration from: {:?}", config_path);
            }
        }
        Ok(())
    }

    pub fn merge_from_config(&mut self, config: ConfigFile) -> Result<()> {
        if self.format.is_none() {
            if let Some(name) = config.format {
                let format = name.parse::<TargetFormat>().map_err(|_| {
                    let valid: Vec<String> = TargetFormat::iter().map(|f| f.to_string()).collect();
                    anyhow::anyhow!(
                        "Invalid format '{}' in config file. Valid formats: {}",
                        name,
                        valid.join(", ")
                    )
                })?;
                self.format = Some(format);
            }
        }

        if self.compress.is_none() {
            self.compress = validate_compression(config.compress)?;
        }

        if self.jobs.is_none() {
            self.jobs = config.jobs;
        }

        // Boolean flags - only apply if currently false (default)
        if !self.verbose {
            self.verbose = config.verbose.unwrap_or(false);
        }

        if !self.dry_run {
            self.dry_run = config.dry_run.unwrap_or(false);
        }

        if !self.json_progress {
            self.json_progress = config.json_progress.unwrap_or(false);
        }

        Ok(())
    }
}
