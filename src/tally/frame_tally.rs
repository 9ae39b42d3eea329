use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{FrameVote, TallyError, VoteVector};

/// The three summary counts derived from a tally.
///
/// Frames nobody voted on contribute to none of them, and
/// `all_true <= majority_true <= any_true` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameSummary {
    pub all_true: usize,
    pub majority_true: usize,
    pub any_true: usize,
}

/// Point-in-time copy of the tally arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallySnapshot {
    pub frame_count: Vec<u32>,
    pub true_count: Vec<u32>,
    pub files_ingested: usize,
}

#[derive(Debug)]
struct TallyState {
    frame_count: Vec<u32>,
    true_count: Vec<u32>,
    files_ingested: usize,
}

/// Thread-safe per-frame vote accumulator.
///
/// Both count arrays live behind one mutex which is held for a whole ingest
/// pass and a whole report, so a reader never sees a half-applied file. There
/// is one lock acquisition per file, not per frame, so contention stays low.
#[derive(Debug)]
pub struct FrameTally {
    capacity: usize,
    state: Mutex<TallyState>,
}

impl FrameTally {
    /// Create an empty tally covering frames `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(TallyState {
                frame_count: vec![0; capacity],
                true_count: vec![0; capacity],
                files_ingested: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fold one file's votes into the tally.
    ///
    /// Fails without touching the tally if `votes` does not cover exactly
    /// `capacity` frames.
    pub fn ingest(&self, votes: &VoteVector) -> Result<(), TallyError> {
        if votes.len() != self.capacity {
            return Err(TallyError::SizeMismatch {
                expected: self.capacity,
                actual: votes.len(),
            });
        }

        let mut state = self.lock();
        let TallyState {
            frame_count,
            true_count,
            files_ingested,
        } = &mut *state;

        for ((vote, seen), yes) in votes
            .iter()
            .zip(frame_count.iter_mut())
            .zip(true_count.iter_mut())
        {
            match vote {
                FrameVote::NotPresent => {}
                FrameVote::False => *seen += 1,
                FrameVote::True => {
                    *seen += 1;
                    *yes += 1;
                }
            }
        }
        *files_ingested += 1;

        Ok(())
    }

    /// Compute the summary counts over the current tally.
    pub fn report(&self) -> FrameSummary {
        let state = self.lock();
        let mut summary = FrameSummary::default();

        for (&seen, &yes) in state.frame_count.iter().zip(&state.true_count) {
            if seen == 0 {
                continue;
            }
            if yes == seen {
                summary.all_true += 1;
            }
            if 2 * u64::from(yes) >= u64::from(seen) {
                summary.majority_true += 1;
            }
            if yes > 0 {
                summary.any_true += 1;
            }
        }

        summary
    }

    pub fn snapshot(&self) -> TallySnapshot {
        let state = self.lock();
        TallySnapshot {
            frame_count: state.frame_count.clone(),
            true_count: state.true_count.clone(),
            files_ingested: state.files_ingested,
        }
    }

    pub fn files_ingested(&self) -> usize {
        self.lock().files_ingested
    }

    // A panic can only interrupt `ingest` after its size check, inside plain
    // integer increments, so the data behind a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, TallyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
