//! Configuration management for framevote
//!
//! Typed configuration sections plus validation. Loading and layering of
//! sources lives in [`loader`].

use anyhow::{Context, Result};
use globset::Glob;
use serde::{Deserialize, Serialize};

use crate::analyzer::InvalidFilePolicy;
use crate::camera::DEFAULT_CAMERA_PATTERN;
use crate::parallel::OversubscribePolicy;
use crate::tally::{DEFAULT_MAX_FRAMES, MAX_FRAMES_LIMIT};

pub mod loader;

pub use loader::ConfigOverrides;

/// Main configuration structure for framevote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameVoteConfig {
    /// Worker pool sizing
    pub pool: PoolConfig,

    /// Frame index space
    pub frames: FramesConfig,

    /// Camera file discovery
    pub input: InputConfig,

    /// Handling of malformed camera files
    pub errors: ErrorsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Worker thread count (0 = derive from CPU cores)
    pub workers: usize,

    /// Percentage of CPU cores to use when `workers` is 0 (1-100)
    pub thread_percentage: u8,

    /// Policy when `workers` exceeds the hardware thread count
    pub oversubscribe: OversubscribePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramesConfig {
    /// Size of the frame index space
    pub max_frames: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// File name glob selecting camera files
    pub pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorsConfig {
    pub on_invalid_file: InvalidFilePolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            thread_percentage: 100,
            oversubscribe: OversubscribePolicy::Reject,
        }
    }
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_CAMERA_PATTERN.to_string(),
        }
    }
}

impl FrameVoteConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.frames.max_frames == 0 {
            anyhow::bail!("frames.max_frames must be greater than 0");
        }
        if self.frames.max_frames > MAX_FRAMES_LIMIT {
            anyhow::bail!(
                "frames.max_frames must be at most {}, got {}",
                MAX_FRAMES_LIMIT,
                self.frames.max_frames
            );
        }

        if !(1..=100).contains(&self.pool.thread_percentage) {
            anyhow::bail!(
                "pool.thread_percentage must be between 1 and 100, got {}",
                self.pool.thread_percentage
            );
        }

        Glob::new(&self.input.pattern)
            .with_context(|| format!("input.pattern is not a valid glob: {}", self.input.pattern))?;

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
