//! Continuation token — where a virtual thread resumes next
//!
//! A continuation is one small `Copy` value per thread instance, owned by
//! the caller. The procedure generated by `#[vthread]` reads it first thing
//! on every invocation and dispatches straight to the recorded point.

use core::fmt;

use crate::error::{Error, Result};

/// Raw value of an uninitialized continuation
pub const RAW_UNINITIALIZED: u8 = 0x00;
/// Raw value of the BEGIN point
pub const RAW_BEGIN: u8 = 0x01;
/// Raw value of the STOPPED terminal
pub const RAW_STOPPED: u8 = 0xFF;
/// Raw value of the first yield point or mark
const RAW_FIRST_POINT: u8 = 0x02;

/// A statically defined virtual thread.
///
/// Implemented by the point enumeration that `#[vthread(Name, ..)]` generates:
/// one variant per yield point (hidden) and per mark, in source order.
pub trait VirtualThread: Copy + Eq + fmt::Debug + 'static {
    /// Name of the thread procedure
    const NAME: &'static str;
    /// Every yield point and mark, in source order
    const POINTS: &'static [Self];
    /// Marks only
    const MARKS: &'static [Self];

    /// Ordinal of this point in [`Self::POINTS`]
    fn tag(self) -> u8;

    /// Point with the given ordinal
    fn from_tag(tag: u8) -> Option<Self> {
        Self::POINTS.get(tag as usize).copied()
    }

    /// Is this point a mark (rather than a yield point)?
    fn is_mark(self) -> bool {
        Self::MARKS.contains(&self)
    }

    /// "Start of body" token for this thread
    fn init() -> Continuation<Self> {
        Continuation::init()
    }
}

/// Resumption state of one virtual thread instance.
///
/// The domain is closed: a value can only name a point of the thread `P`
/// it was produced for, so an invalid continuation cannot be constructed.
/// One byte wide for any thread with at most 253 points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Continuation<P> {
    /// Never initialized; invoking the thread runs no body code
    Uninitialized,
    /// Start of body
    Begin,
    /// Right after a yield point, or at a mark
    At(P),
    /// Terminal; invoking the thread runs no body code
    Stopped,
}

impl<P> Default for Continuation<P> {
    fn default() -> Self {
        Continuation::Uninitialized
    }
}

impl<P: VirtualThread> Continuation<P> {
    /// Uninitialized continuation, suitable for `static` storage
    pub const fn new() -> Self {
        Continuation::Uninitialized
    }

    /// Start-of-body continuation
    pub const fn init() -> Self {
        Continuation::Begin
    }

    /// Reset to the start of the body, from any state
    pub fn restart(&mut self) {
        *self = Continuation::Begin;
    }

    /// Record the terminal state
    pub fn stop(&mut self) {
        *self = Continuation::Stopped;
    }

    /// Overwrite with `point`. Runs no code; the next invocation resumes there.
    pub fn seek(&mut self, point: P) {
        *self = Continuation::At(point);
    }

    /// Has the thread reached its terminal state?
    pub fn is_stopped(&self) -> bool {
        matches!(self, Continuation::Stopped)
    }

    /// Has init (or a seek) ever been applied?
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Continuation::Uninitialized)
    }

    /// Recorded point, if the continuation sits at a yield point or mark
    pub fn point(&self) -> Option<P> {
        match *self {
            Continuation::At(point) => Some(point),
            _ => None,
        }
    }

    /// Encode as a single byte, e.g. for a general-purpose I/O register.
    ///
    /// The encoding follows source order and is only valid for the build
    /// that produced it.
    pub fn to_raw(self) -> u8 {
        match self {
            Continuation::Uninitialized => RAW_UNINITIALIZED,
            Continuation::Begin => RAW_BEGIN,
            Continuation::At(point) => RAW_FIRST_POINT + point.tag(),
            Continuation::Stopped => RAW_STOPPED,
        }
    }

    /// Decode a byte produced by [`Continuation::to_raw`]
    pub fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            RAW_UNINITIALIZED => Ok(Continuation::Uninitialized),
            RAW_BEGIN => Ok(Continuation::Begin),
            RAW_STOPPED => Ok(Continuation::Stopped),
            _ => P::from_tag(raw - RAW_FIRST_POINT)
                .map(Continuation::At)
                .ok_or(Error::InvalidTag { thread: P::NAME, tag: raw }),
        }
    }
}

impl<P: VirtualThread> fmt::Display for Continuation<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Continuation::Uninitialized => write!(f, "{}@uninitialized", P::NAME),
            Continuation::Begin => write!(f, "{}@begin", P::NAME),
            Continuation::At(point) => write!(f, "{}@{:?}", P::NAME, point),
            Continuation::Stopped => write!(f, "{}@stopped", P::NAME),
        }
    }
}
