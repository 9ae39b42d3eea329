//! # framevote - concurrent camera frame vote aggregation
//!
//! Every camera writes a log of `<frame>, <true|false>` votes. framevote parses
//! each log on a bounded worker pool, folds the votes into global per-frame
//! tallies and reports how many frames were voted true by all, a majority, or
//! any of the cameras that saw them.
//!
//! ## Quick Start
//!
//! ```bash
//! framevote analyze ./camera_logs
//! framevote --format json analyze ./camera_logs --workers 4 --on-invalid-file skip
//! ```
//!
//! ## Library use
//!
//! ```rust
//! use framevote::tally::{FrameTally, FrameVote, VoteVector};
//!
//! let tally = FrameTally::new(8);
//! let mut votes = VoteVector::new(8);
//! votes.set(0, FrameVote::True).unwrap();
//! tally.ingest(&votes).unwrap();
//! assert_eq!(tally.report().all_true, 1);
//! ```

pub mod analyzer;
pub mod camera;
pub mod cli;
pub mod config;
pub mod parallel;
pub mod tally;

pub use analyzer::{AnalysisReport, FrameAnalyzer, InvalidFilePolicy};
pub use cli::{Cli, Output};
pub use config::FrameVoteConfig;

/// Result type alias for framevote operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
