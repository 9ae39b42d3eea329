use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::tally::{FrameVote, VoteVector};

/// Reasons a single camera file cannot be turned into a [`VoteVector`].
#[derive(Error, Debug)]
pub enum CameraFileError {
    #[error("unable to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed while reading: {0}")]
    Read(#[from] io::Error),

    #[error("line {line}: invalid frame index '{token}'")]
    InvalidFrameIndex { line: usize, token: String },

    #[error("line {line}: frame {frame} is outside the valid range 0..{max_frames}")]
    FrameOutOfRange {
        line: usize,
        frame: i64,
        max_frames: usize,
    },

    #[error("line {line}: invalid vote '{token}', votes may only be 'true' or 'false'")]
    InvalidVote { line: usize, token: String },

    #[error("line {line}: frame {frame} has no vote")]
    MissingVote { line: usize, frame: i64 },
}

/// Parse one camera file into a vote vector of `max_frames` entries.
pub fn parse_camera_file(path: &Path, max_frames: usize) -> Result<VoteVector, CameraFileError> {
    let file = File::open(path).map_err(|source| CameraFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_votes(BufReader::new(file), max_frames)
}

/// Parse `<frame>, <vote>` pairs from `reader`.
///
/// Tokens are whitespace separated and pairs may span lines. The trailing
/// comma on the frame token is optional. A frame listed twice keeps its last
/// vote.
pub fn parse_votes<R: BufRead>(reader: R, max_frames: usize) -> Result<VoteVector, CameraFileError> {
    let mut votes = VoteVector::new(max_frames);
    // Frame token waiting for its vote, with the line it appeared on.
    let mut pending: Option<(usize, i64)> = None;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;

        for token in line.split_whitespace() {
            match pending.take() {
                None => pending = Some((line_no, parse_frame(token, line_no, max_frames)?)),
                Some((_, frame)) => {
                    let vote = parse_vote(token, line_no)?;
                    // `parse_frame` already checked the range.
                    votes
                        .set(frame as usize, vote)
                        .map_err(|_| CameraFileError::FrameOutOfRange {
                            line: line_no,
                            frame,
                            max_frames,
                        })?;
                }
            }
        }
    }

    if let Some((line, frame)) = pending {
        return Err(CameraFileError::MissingVote { line, frame });
    }

    Ok(votes)
}

fn parse_frame(token: &str, line: usize, max_frames: usize) -> Result<i64, CameraFileError> {
    let digits = token.strip_suffix(',').unwrap_or(token);
    let frame: i64 = digits
        .parse()
        .map_err(|_| CameraFileError::InvalidFrameIndex {
            line,
            token: token.to_string(),
        })?;

    if frame < 0 || frame as u64 >= max_frames as u64 {
        return Err(CameraFileError::FrameOutOfRange {
            line,
            frame,
            max_frames,
        });
    }
    Ok(frame)
}

fn parse_vote(token: &str, line: usize) -> Result<FrameVote, CameraFileError> {
    match token {
        "true" => Ok(FrameVote::True),
        "false" => Ok(FrameVote::False),
        _ => Err(CameraFileError::InvalidVote {
            line,
            token: token.to_string(),
        }),
    }
}
