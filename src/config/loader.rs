use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use std::path::{Path, PathBuf};

use super::FrameVoteConfig;
use crate::analyzer::InvalidFilePolicy;
use crate::parallel::OversubscribePolicy;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Values given on the command line. `None` leaves the layered value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workers: Option<usize>,
    pub oversubscribe: Option<OversubscribePolicy>,
    pub max_frames: Option<usize>,
    pub pattern: Option<String>,
    pub on_invalid_file: Option<InvalidFilePolicy>,
}

impl FrameVoteConfig {
    /// Load the layered configuration.
    ///
    /// Priority, lowest first: embedded defaults, user config, `framevote.toml`
    /// in the working directory, `custom_config`, `FRAMEVOTE_` environment
    /// variables (`__` separates sections), CLI overrides.
    pub fn load(custom_config: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::file(Self::user_config_path()))
            .merge(Toml::file("framevote.toml"));

        if let Some(path) = custom_config {
            if !path.is_file() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("FRAMEVOTE_").split("__"));
        figment = Self::apply_overrides(figment, overrides);

        let config: FrameVoteConfig = figment
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;

        tracing::trace!("CONFIG LOAD: {:?}", config);
        Ok(config)
    }

    fn apply_overrides(mut figment: Figment, overrides: &ConfigOverrides) -> Figment {
        if let Some(workers) = overrides.workers {
            figment = figment.merge(Serialized::default("pool.workers", workers));
        }
        if let Some(policy) = overrides.oversubscribe {
            figment = figment.merge(Serialized::default("pool.oversubscribe", policy));
        }
        if let Some(max_frames) = overrides.max_frames {
            figment = figment.merge(Serialized::default("frames.max_frames", max_frames));
        }
        if let Some(pattern) = &overrides.pattern {
            figment = figment.merge(Serialized::default("input.pattern", pattern));
        }
        if let Some(policy) = overrides.on_invalid_file {
            figment = figment.merge(Serialized::default("errors.on_invalid_file", policy));
        }
        figment
    }

    fn user_config_path() -> PathBuf {
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".config/framevote/config.toml"),
            Err(_) => PathBuf::from("~/.config/framevote/config.toml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn load(
        custom_config: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> figment::error::Result<FrameVoteConfig> {
        FrameVoteConfig::load(custom_config, overrides).map_err(|e| format!("{e:#}").into())
    }

    #[test]
    fn test_config_loads_defaults() {
        Jail::expect_with(|_jail| {
            let config = load(None, &ConfigOverrides::default())?;
            assert_eq!(config.pool.workers, 0);
            assert_eq!(config.pool.oversubscribe, OversubscribePolicy::Reject);
            assert_eq!(config.frames.max_frames, 600_000);
            assert_eq!(config.input.pattern, "*cam*.txt");
            Ok(())
        });
    }

    #[test]
    fn test_repo_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "framevote.toml",
                r#"
                [pool]
                workers = 2

                [frames]
                max_frames = 1000
                "#,
            )?;
            jail.set_env("FRAMEVOTE_FRAMES__MAX_FRAMES", "50");
            jail.set_env("FRAMEVOTE_ERRORS__ON_INVALID_FILE", "skip");

            let config = load(None, &ConfigOverrides::default())?;
            assert_eq!(config.pool.workers, 2);
            assert_eq!(config.frames.max_frames, 50);
            assert_eq!(config.errors.on_invalid_file, InvalidFilePolicy::Skip);
            Ok(())
        });
    }

    #[test]
    fn test_cli_overrides_win() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[input]\npattern = \"*.log\"\n")?;
            jail.set_env("FRAMEVOTE_POOL__WORKERS", "3");

            let overrides = ConfigOverrides {
                workers: Some(1),
                oversubscribe: Some(OversubscribePolicy::Clamp),
                ..Default::default()
            };
            let config = load(Some(Path::new("custom.toml")), &overrides)?;
            assert_eq!(config.pool.workers, 1);
            assert_eq!(config.pool.oversubscribe, OversubscribePolicy::Clamp);
            assert_eq!(config.input.pattern, "*.log");
            Ok(())
        });
    }

    #[test]
    fn test_missing_custom_config_is_an_error() {
        Jail::expect_with(|_jail| {
            assert!(load(Some(Path::new("nope.toml")), &ConfigOverrides::default()).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("FRAMEVOTE_POOL__THREAD_PERCENTAGE", "0");
            assert!(load(None, &ConfigOverrides::default()).is_err());
            Ok(())
        });
    }
}
