use serde::{Deserialize, Serialize};

use super::TallyError;

/// One camera's opinion on one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameVote {
    #[default]
    NotPresent,
    False,
    True,
}

impl From<bool> for FrameVote {
    fn from(value: bool) -> Self {
        if value { FrameVote::True } else { FrameVote::False }
    }
}

/// A single file's votes over the whole frame index space.
///
/// The length is fixed at construction and every entry starts as
/// [`FrameVote::NotPresent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteVector {
    votes: Vec<FrameVote>,
}

impl VoteVector {
    pub fn new(len: usize) -> Self {
        Self {
            votes: vec![FrameVote::NotPresent; len],
        }
    }

    /// Record `vote` for `frame`, replacing any earlier vote for the same frame.
    pub fn set(&mut self, frame: usize, vote: FrameVote) -> Result<(), TallyError> {
        let len = self.votes.len();
        let slot = self
            .votes
            .get_mut(frame)
            .ok_or(TallyError::FrameOutOfRange {
                frame,
                max_frames: len,
            })?;
        *slot = vote;
        Ok(())
    }

    pub fn get(&self, frame: usize) -> Option<FrameVote> {
        self.votes.get(frame).copied()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Number of frames this vector expresses an opinion on.
    pub fn present(&self) -> usize {
        self.votes
            .iter()
            .filter(|vote| **vote != FrameVote::NotPresent)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = FrameVote> + '_ {
        self.votes.iter().copied()
    }
}

impl From<Vec<FrameVote>> for VoteVector {
    fn from(votes: Vec<FrameVote>) -> Self {
        Self { votes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vector_is_not_present() {
        let votes = VoteVector::new(4);
        assert_eq!(votes.len(), 4);
        assert_eq!(votes.present(), 0);
        assert!(votes.iter().all(|vote| vote == FrameVote::NotPresent));
    }

    #[test]
    fn test_set_replaces_previous_vote() {
        let mut votes = VoteVector::new(3);
        votes.set(1, FrameVote::True).unwrap();
        votes.set(1, FrameVote::False).unwrap();
        assert_eq!(votes.get(1), Some(FrameVote::False));
        assert_eq!(votes.present(), 1);
    }

    #[test]
    fn test_set_out_of_range() {
        let mut votes = VoteVector::new(3);
        let err = votes.set(3, FrameVote::True).unwrap_err();
        assert!(matches!(
            err,
            TallyError::FrameOutOfRange { frame: 3, max_frames: 3 }
        ));
        assert_eq!(votes.present(), 0);
    }

    #[test]
    fn test_from_bool() {
        assert_eq!(FrameVote::from(true), FrameVote::True);
        assert_eq!(FrameVote::from(false), FrameVote::False);
    }
}
