use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::{OutputFormat, Output};
use crate::config::{ConfigOverrides, FrameVoteConfig};

/// Print the effective configuration after all layers are merged
pub fn show(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = FrameVoteConfig::load(config_path, &ConfigOverrides::default())?;

    let rendered = match format {
        OutputFormat::Text => config.to_toml()?,
        OutputFormat::Json => serde_json::to_string_pretty(&config)
            .context("Failed to serialize configuration")?,
    };
    println!("{rendered}");
    Ok(())
}

/// Load and validate the configuration
pub fn validate(config_path: Option<&Path>, output: &Output) -> Result<()> {
    FrameVoteConfig::load(config_path, &ConfigOverrides::default())?;
    output.success("Configuration is valid");
    Ok(())
}
