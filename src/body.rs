//! Body operations of a virtual thread
//!
//! These macros only have meaning inside a `#[vthread]` procedure, which
//! consumes them while building its dispatch. Anywhere else they expand to a
//! compile error, so yielding or seeking outside the owning body cannot be
//! written at all.
//!
//! ```compile_fail
//! fn not_a_thread() {
//!     vthreads::yield_now!();
//! }
//! ```
//!
//! Seeking a mark the body never declares is a build error:
//!
//! ```compile_fail
//! use vthreads::{vthread, Continuation};
//!
//! #[vthread(Probe, ip = *ip)]
//! fn probe(ip: &mut Continuation<Probe>) {
//!     begin!();
//!     mark!(Start);
//!     seek!(Retry);
//!     end!();
//! }
//! ```
//!
//! and so is an external seek:
//!
//! ```compile_fail
//! use vthreads::{vthread, Continuation};
//!
//! #[vthread(Probe, ip = *ip)]
//! fn probe(ip: &mut Continuation<Probe>) {
//!     begin!();
//!     mark!(Start);
//!     end!();
//! }
//!
//! let mut ip = Continuation::init();
//! ip.seek(Probe::Retry);
//! ```
//!
//! Locals do not survive a yield:
//!
//! ```compile_fail
//! use vthreads::{vthread, Continuation};
//!
//! #[vthread(Probe, ip = *ip)]
//! fn probe(ip: &mut Continuation<Probe>, out: &mut u32) {
//!     begin!();
//!     let reading = 7;
//!     yield_now!();
//!     *out = reading;
//!     end!();
//! }
//! ```
//!
//! A yield can only split the body at its top level:
//!
//! ```compile_fail
//! use vthreads::{vthread, Continuation};
//!
//! #[vthread(Probe, ip = *ip)]
//! fn probe(ip: &mut Continuation<Probe>, n: &mut u32) {
//!     begin!();
//!     while *n < 3 {
//!         *n += 1;
//!         yield_now!();
//!     }
//!     end!();
//! }
//! ```
//!
//! and body operations end at `end!()`:
//!
//! ```compile_fail
//! use vthreads::{vthread, Continuation};
//!
//! #[vthread(Probe, ip = *ip)]
//! fn probe(ip: &mut Continuation<Probe>) {
//!     begin!();
//!     end!();
//!     stop!();
//! }
//! ```
//!
//! Marks are unique per thread:
//!
//! ```compile_fail
//! use vthreads::{vthread, Continuation};
//!
//! #[vthread(Probe, ip = *ip)]
//! fn probe(ip: &mut Continuation<Probe>) {
//!     begin!();
//!     mark!(Again);
//!     mark!(Again);
//!     end!();
//! }
//! ```

/// Establish the BEGIN point. Must be the first statement of the body.
#[macro_export]
macro_rules! begin {
    ($($tt:tt)*) => {
        ::core::compile_error!("`begin!()` can only be used as the first statement of a #[vthread] body")
    };
}

/// Establish the STOPPED point and close the dispatchable region.
///
/// Statements after it run on every invocation.
#[macro_export]
macro_rules! end {
    ($($tt:tt)*) => {
        ::core::compile_error!("`end!()` can only be used inside a #[vthread] body")
    };
}

/// Record a fresh resumption point and end the slice.
///
/// The next invocation continues with the statement after this one.
#[macro_export]
macro_rules! yield_now {
    ($($tt:tt)*) => {
        ::core::compile_error!("`yield_now!()` can only be used as a top-level statement of a #[vthread] body")
    };
}

/// Record the STOPPED terminal and end the slice.
#[macro_export]
macro_rules! stop {
    ($($tt:tt)*) => {
        ::core::compile_error!("`stop!()` can only be used inside a #[vthread] body")
    };
}

/// Record the BEGIN point and end the slice.
#[macro_export]
macro_rules! restart {
    ($($tt:tt)*) => {
        ::core::compile_error!("`restart!()` can only be used inside a #[vthread] body")
    };
}

/// Declare a named point that `seek!` (or [`Continuation::seek`]) can target.
///
/// Execution flows through it when reached sequentially.
///
/// [`Continuation::seek`]: crate::Continuation::seek
#[macro_export]
macro_rules! mark {
    ($($tt:tt)*) => {
        ::core::compile_error!("`mark!(..)` can only be used as a top-level statement of a #[vthread] body")
    };
}

/// Record a declared mark and end the slice. The next invocation resumes there.
#[macro_export]
macro_rules! seek {
    ($($tt:tt)*) => {
        ::core::compile_error!("`seek!(..)` can only be used inside a #[vthread] body")
    };
}
