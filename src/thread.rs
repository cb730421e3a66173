//! Thread control block — static, no-alloc virtual thread instances
//!
//! A [`Thread`] bundles one instance's continuation with the state that must
//! survive a yield. The procedure itself is shared: several `Thread`s built
//! from the same `#[vthread]` function progress independently.

use crate::continuation::{Continuation, VirtualThread};
use crate::error::{Error, Result};

/// A virtual thread procedure, as produced by `#[vthread(P, ip = *ip)]`
pub type Procedure<P, S> = fn(&mut Continuation<P>, &mut S);

/// Anything a scheduler can invoke one slice at a time
///
/// Object-safe so a scheduler can hold threads of different definitions.
pub trait Runnable {
    /// Thread procedure name
    fn name(&self) -> &'static str;
    /// Run one slice: from the resumption point to the next yield, stop or end
    fn run_slice(&mut self);
    /// Has the thread reached STOPPED?
    fn is_stopped(&self) -> bool;
    /// Reset to the start of the body
    fn restart(&mut self);
    /// Force the STOPPED terminal
    fn stop(&mut self);
    /// Resume at the mark whose point tag is `tag` on the next slice
    fn seek_tag(&mut self, tag: u8) -> Result<()>;
}

/// Virtual thread instance — continuation plus caller-owned state
pub struct Thread<P: VirtualThread, S> {
    /// Where the next slice resumes
    ip: Continuation<P>,
    /// Per-instance state; everything that must outlive a yield lives here
    state: S,
    /// Shared thread procedure
    procedure: Procedure<P, S>,
    /// Slices run since creation
    slices: u32,
}

impl<P: VirtualThread, S> Thread<P, S> {
    /// Create an initialized instance: the first slice starts at the top of the body
    pub const fn new(procedure: Procedure<P, S>, state: S) -> Self {
        Self {
            ip: Continuation::init(),
            state,
            procedure,
            slices: 0,
        }
    }

    /// Invoke the procedure once
    pub fn run(&mut self) {
        (self.procedure)(&mut self.ip, &mut self.state);
        self.slices = self.slices.wrapping_add(1);
    }

    /// Current continuation
    pub fn continuation(&self) -> Continuation<P> {
        self.ip
    }

    /// Reset to the start of the body, from any state
    pub fn restart(&mut self) {
        log::trace!("restarting virtual thread {}", P::NAME);
        self.ip.restart();
    }

    /// Force the STOPPED terminal
    pub fn stop(&mut self) {
        log::trace!("stopping virtual thread {}", P::NAME);
        self.ip.stop();
    }

    /// Resume at `point` on the next slice, even from STOPPED
    pub fn seek(&mut self, point: P) {
        self.ip.seek(point);
    }

    /// Has the thread reached STOPPED?
    pub fn is_stopped(&self) -> bool {
        self.ip.is_stopped()
    }

    /// Slices run since creation
    pub fn slices(&self) -> u32 {
        self.slices
    }

    /// Per-instance state
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Per-instance state, mutable (e.g. to post input between slices)
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Tear down, returning the state
    pub fn into_state(self) -> S {
        self.state
    }
}

impl<P: VirtualThread, S> Runnable for Thread<P, S> {
    fn name(&self) -> &'static str {
        P::NAME
    }

    fn run_slice(&mut self) {
        self.run();
    }

    fn is_stopped(&self) -> bool {
        Thread::is_stopped(self)
    }

    fn restart(&mut self) {
        Thread::restart(self);
    }

    fn stop(&mut self) {
        Thread::stop(self);
    }

    fn seek_tag(&mut self, tag: u8) -> Result<()> {
        let point = P::from_tag(tag).ok_or(Error::InvalidTag { thread: P::NAME, tag })?;
        if !point.is_mark() {
            return Err(Error::NotAMark { thread: P::NAME, tag });
        }
        log::trace!("seeking virtual thread {} to {:?}", P::NAME, point);
        self.seek(point);
        Ok(())
    }
}
