//! Synchronization primitives for the PRCMU driver
//!
//! - [`IrqMutex`]: spinlock that masks interrupts while held, for state the
//!   interrupt dispatcher also touches.
//! - [`Completion`]: one-shot signal from the dispatcher to a waiting
//!   transaction.
//! - [`poll::wait_until`]: bounded busy-wait on a predicate.

pub mod completion;
pub mod mutex;
pub mod poll;

pub use completion::Completion;
pub use mutex::IrqMutex;
