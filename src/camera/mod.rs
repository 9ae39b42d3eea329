//! Camera log files
//!
//! Finding camera files in a directory and turning each one into a
//! [`VoteVector`](crate::tally::VoteVector). Both steps are sequential; the
//! analyzer runs one parse per pool job.

pub mod discovery;
pub mod parser;

pub use discovery::{DEFAULT_CAMERA_PATTERN, discover_camera_files};
pub use parser::{CameraFileError, parse_camera_file, parse_votes};
