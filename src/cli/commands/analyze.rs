use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::analyzer::{FrameAnalyzer, InvalidFilePolicy};
use crate::cli::{OutputFormat, Output};
use crate::config::{ConfigOverrides, FrameVoteConfig};
use crate::parallel::OversubscribePolicy;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Directory containing the camera files
    #[arg(value_name = "DIR")]
    pub directory: PathBuf,

    /// Number of worker threads (0 = one per CPU core)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// What to do when more workers are requested than hardware threads exist
    #[arg(long, value_enum)]
    pub oversubscribe: Option<OversubscribePolicy>,

    /// Size of the frame index space
    #[arg(long)]
    pub max_frames: Option<usize>,

    /// File name glob selecting camera files
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Abort the run or skip the file when a camera file is malformed
    #[arg(long, value_enum)]
    pub on_invalid_file: Option<InvalidFilePolicy>,
}

impl AnalyzeArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            workers: self.workers,
            oversubscribe: self.oversubscribe,
            max_frames: self.max_frames,
            pattern: self.pattern.clone(),
            on_invalid_file: self.on_invalid_file,
        }
    }
}

pub fn execute(
    args: AnalyzeArgs,
    config_path: Option<&Path>,
    format: OutputFormat,
    output: &Output,
) -> Result<()> {
    let config = FrameVoteConfig::load(config_path, &args.overrides())?;
    output.verbose(&format!(
        "Using {} frames, pattern '{}', invalid files: {:?}",
        config.frames.max_frames, config.input.pattern, config.errors.on_invalid_file
    ));

    let analyzer = FrameAnalyzer::new(config);
    let report = analyzer.analyze(&args.directory)?;

    match format {
        OutputFormat::Text => output.analysis_report(&report),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize analysis report")?;
            println!("{json}");
        }
    }

    Ok(())
}
