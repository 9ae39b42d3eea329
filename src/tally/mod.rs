//! Frame vote aggregation
//!
//! [`VoteVector`] is the per-file unit handed over by the camera parser,
//! [`FrameTally`] folds those vectors into global per-frame counts and derives
//! the [`FrameSummary`].

use thiserror::Error;

pub mod frame_tally;
pub mod vote;

pub use frame_tally::{FrameSummary, FrameTally, TallySnapshot};
pub use vote::{FrameVote, VoteVector};

/// Frame capacity used when nothing else is configured.
pub const DEFAULT_MAX_FRAMES: usize = 600_000;

/// Largest frame capacity accepted from configuration. Every in-flight file
/// holds a vote vector of this length, plus two counters per frame in the tally.
pub const MAX_FRAMES_LIMIT: usize = 50_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TallyError {
    #[error("vote vector covers {actual} frames, tally expects {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("frame {frame} is outside the valid range 0..{max_frames}")]
    FrameOutOfRange { frame: usize, max_frames: usize },
}
