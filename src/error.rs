//! Runtime errors

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = core::result::Result<T, Error>;

/// Runtime errors
///
/// Misuse of the body operations never gets this far: it is rejected when the
/// `#[vthread]` procedure is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("scheduler table is full ({0} slots)")]
    TableFull(usize),

    #[error("no virtual thread registered in slot {0}")]
    NoSuchSlot(usize),

    #[error("raw value {tag:#04x} is not a continuation of `{thread}`")]
    InvalidTag { thread: &'static str, tag: u8 },

    #[error("point {tag} of `{thread}` is not a mark")]
    NotAMark { thread: &'static str, tag: u8 },
}
