//! Polling scheduler
//!
//! Round-robin over a static table of virtual threads. Each slot carries a
//! runnability flag; every poll gives each Ready thread exactly one slice.
//! Guarantees: one invocation per instance at a time (the scheduler holds
//! `&mut` to every registered thread), bounded work per poll.

use crate::error::{Error, Result};
use crate::thread::Runnable;

/// Default capacity of a scheduler table
pub const MAX_THREADS: usize = 16;

/// Runnability flag of a scheduler slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Gets a slice on every poll
    Ready,
    /// Skipped until resumed
    Suspended,
    /// The thread reached STOPPED; skipped until restarted
    Stopped,
}

struct Slot<'a> {
    thread: &'a mut dyn Runnable,
    state: SlotState,
    invocations: u32,
}

/// Polling scheduler
///
/// Static slot table, no dynamic allocation. The scheduler borrows its
/// threads; their continuations stay in caller-owned storage.
pub struct Scheduler<'a, const N: usize = MAX_THREADS> {
    /// Static slot table
    slots: [Option<Slot<'a>>; N],
    /// Number of registered threads
    len: usize,
    /// Completed poll rounds
    rounds: u64,
    /// Total slices run
    pub slices: u64,
}

impl<'a, const N: usize> Scheduler<'a, N> {
    const EMPTY: Option<Slot<'a>> = None;

    /// Create empty scheduler
    pub const fn new() -> Self {
        Self {
            slots: [Self::EMPTY; N],
            len: 0,
            rounds: 0,
            slices: 0,
        }
    }

    /// Register a thread, returns slot index
    ///
    /// A thread that is already STOPPED is registered as such.
    pub fn register(&mut self, thread: &'a mut dyn Runnable) -> Result<usize> {
        if self.len >= N {
            log::warn!("cannot register virtual thread {}: table full", thread.name());
            return Err(Error::TableFull(N));
        }
        let idx = self.len;
        let state = if thread.is_stopped() {
            SlotState::Stopped
        } else {
            SlotState::Ready
        };
        log::debug!("registered virtual thread {} in slot {}", thread.name(), idx);
        self.slots[idx] = Some(Slot {
            thread,
            state,
            invocations: 0,
        });
        self.len += 1;
        Ok(idx)
    }

    /// Run one round: every Ready thread gets exactly one slice, in slot order
    ///
    /// Returns the number of slices run.
    pub fn poll(&mut self) -> usize {
        let mut ran = 0;
        for slot in self.slots[..self.len].iter_mut().flatten() {
            if slot.state != SlotState::Ready {
                continue;
            }

            slot.thread.run_slice();
            slot.invocations = slot.invocations.wrapping_add(1);
            ran += 1;

            if slot.thread.is_stopped() {
                log::debug!(
                    "virtual thread {} stopped after {} slices",
                    slot.thread.name(),
                    slot.invocations
                );
                slot.state = SlotState::Stopped;
            }
        }
        self.rounds += 1;
        self.slices += ran as u64;
        ran
    }

    /// Poll until no thread is Ready, or `max_rounds` rounds have run
    pub fn run(&mut self, max_rounds: u64) -> SchedulerStats {
        let start_rounds = self.rounds;
        let start_slices = self.slices;

        while self.rounds - start_rounds < max_rounds && !self.is_idle() {
            self.poll();
        }

        SchedulerStats {
            rounds: self.rounds - start_rounds,
            slices: self.slices - start_slices,
            ready: self.ready_count(),
            stopped: self.count(SlotState::Stopped),
            suspended: self.count(SlotState::Suspended),
        }
    }

    /// Suspend a thread; its continuation is kept as is
    pub fn suspend(&mut self, idx: usize) -> Result<()> {
        let slot = self.slot_mut(idx)?;
        if slot.state == SlotState::Ready {
            log::trace!("suspending virtual thread {}", slot.thread.name());
            slot.state = SlotState::Suspended;
        }
        Ok(())
    }

    /// Resume a suspended thread
    pub fn resume(&mut self, idx: usize) -> Result<()> {
        let slot = self.slot_mut(idx)?;
        if slot.state == SlotState::Suspended {
            log::trace!("resuming virtual thread {}", slot.thread.name());
            slot.state = SlotState::Ready;
        }
        Ok(())
    }

    /// Restart a thread from the top of its body and make it Ready
    pub fn restart(&mut self, idx: usize) -> Result<()> {
        let slot = self.slot_mut(idx)?;
        slot.thread.restart();
        slot.state = SlotState::Ready;
        Ok(())
    }

    /// Stop a thread; it stays in the table
    pub fn stop(&mut self, idx: usize) -> Result<()> {
        let slot = self.slot_mut(idx)?;
        slot.thread.stop();
        slot.state = SlotState::Stopped;
        Ok(())
    }

    /// Resume a thread at one of its marks, given by point tag, and make it Ready
    ///
    /// Works from any state, including Stopped.
    pub fn seek(&mut self, idx: usize, tag: u8) -> Result<()> {
        let slot = self.slot_mut(idx)?;
        slot.thread.seek_tag(tag)?;
        slot.state = SlotState::Ready;
        Ok(())
    }

    /// Runnability of a slot
    pub fn state(&self, idx: usize) -> Result<SlotState> {
        self.slot(idx).map(|slot| slot.state)
    }

    /// Slices a slot has run
    pub fn invocations(&self, idx: usize) -> Result<u32> {
        self.slot(idx).map(|slot| slot.invocations)
    }

    /// Number of registered threads
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of Ready threads
    pub fn ready_count(&self) -> usize {
        self.count(SlotState::Ready)
    }

    /// No thread is Ready
    pub fn is_idle(&self) -> bool {
        self.ready_count() == 0
    }

    /// Completed poll rounds
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    fn count(&self, state: SlotState) -> usize {
        self.slots[..self.len]
            .iter()
            .flatten()
            .filter(|slot| slot.state == state)
            .count()
    }

    fn slot(&self, idx: usize) -> Result<&Slot<'a>> {
        self.slots
            .get(idx)
            .and_then(Option::as_ref)
            .ok_or(Error::NoSuchSlot(idx))
    }

    fn slot_mut(&mut self, idx: usize) -> Result<&mut Slot<'a>> {
        self.slots
            .get_mut(idx)
            .and_then(Option::as_mut)
            .ok_or(Error::NoSuchSlot(idx))
    }
}

impl<const N: usize> Default for Scheduler<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Scheduler run statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Poll rounds run
    pub rounds: u64,
    /// Slices run
    pub slices: u64,
    /// Threads still Ready
    pub ready: usize,
    /// Threads Stopped
    pub stopped: usize,
    /// Threads Suspended
    pub suspended: usize,
}
