//! vthreads — stackless virtual threads
//!
//! Re-enter one function many times, resuming exactly where it last yielded:
//! - No per-thread stack, no task object, no heap
//! - One-byte continuation token, stored by the caller
//! - Build-time resumption tags: dispatch is a total `match`
//! - Never blocks, safe to invoke from an interrupt handler
//!
//! ```
//! use vthreads::{vthread, Continuation};
//!
//! #[vthread(Blink, ip = *ip)]
//! fn blink(ip: &mut Continuation<Blink>, events: &mut Vec<&'static str>) {
//!     begin!();
//!     events.push("on");
//!     yield_now!();
//!     mark!(Off);
//!     events.push("off");
//!     end!();
//!     events.push("tick");
//! }
//!
//! let mut ip = Continuation::init();
//! let mut events = Vec::new();
//! blink(&mut ip, &mut events);
//! blink(&mut ip, &mut events);
//! assert_eq!(events, ["on", "tick", "off", "tick"]);
//! assert!(ip.is_stopped());
//!
//! ip.seek(Blink::Off);
//! blink(&mut ip, &mut events);
//! assert_eq!(events[4..], ["off", "tick"]);
//! ```

#![no_std]

// Lets `#[vthread]` expansions name `::vthreads` inside this crate too.
extern crate self as vthreads;

pub mod body;
pub mod continuation;
pub mod error;
pub mod scheduler;
pub mod thread;

pub use continuation::{Continuation, VirtualThread};
pub use error::{Error, Result};
pub use scheduler::{Scheduler, SchedulerStats, SlotState, MAX_THREADS};
pub use thread::{Procedure, Runnable, Thread};
pub use vthreads_macros::vthread;
