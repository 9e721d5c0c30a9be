//! Transaction completion signal
//!
//! A `Completion` links one waiting transaction with the interrupt
//! dispatcher. It is a three-state machine:
//!
//! ```text
//!   arm()            complete()          wait_timeout() returns true
//! IDLE ----> ARMED -------------> DONE ---------------------------> IDLE
//!              |
//!              +-- wait_timeout() expires -------------------------> IDLE
//! ```
//!
//! `complete()` only succeeds on an armed completion. An acknowledge that
//! arrives after its waiter gave up finds the completion idle and is
//! dropped, so it cannot wake the next transaction on the same channel.

use core::sync::atomic::{AtomicU8, Ordering};

use super::poll::wait_until;
use crate::platform::Platform;

const IDLE: u8 = 0;
const ARMED: u8 = 1;
const DONE: u8 = 2;

/// One-shot completion with a single waiter
pub struct Completion {
    state: AtomicU8,
}

impl Completion {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
        }
    }

    /// Prepare for a new wait. Must happen before the request is signaled
    /// to the firmware, otherwise a fast acknowledge could be lost.
    pub fn arm(&self) {
        self.state.store(ARMED, Ordering::Release);
    }

    /// Wake the waiter (interrupt context).
    ///
    /// Returns `false` if nobody was waiting.
    pub fn complete(&self) -> bool {
        self.state
            .compare_exchange(ARMED, DONE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Wait until completed or `timeout_us` elapses.
    ///
    /// Returns `true` if completed. Always leaves the completion idle.
    pub fn wait_timeout<P: Platform + ?Sized>(&self, platform: &P, timeout_us: u64) -> bool {
        let done = wait_until(platform, timeout_us, || {
            self.state.load(Ordering::Acquire) == DONE
        })
        .is_ok();

        if done {
            self.state.store(IDLE, Ordering::Release);
            return true;
        }

        // Disarm. Losing this race means the acknowledge landed right at
        // the deadline, which still counts.
        match self
            .state
            .compare_exchange(ARMED, IDLE, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => false,
            Err(_) => {
                self.state.store(IDLE, Ordering::Release);
                true
            }
        }
    }

    /// True while a waiter is armed and not yet completed.
    pub fn is_armed(&self) -> bool {
        self.state.load(Ordering::Acquire) == ARMED
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StdPlatform;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_complete_without_waiter_is_dropped() {
        let completion = Completion::new();
        assert!(!completion.complete());

        // The stale completion must not satisfy a later wait
        let platform = StdPlatform::new();
        completion.arm();
        assert!(!completion.wait_timeout(&platform, 5_000));
    }

    #[test]
    fn test_complete_before_wait() {
        let platform = StdPlatform::new();
        let completion = Completion::new();
        completion.arm();
        assert!(completion.complete());
        assert!(completion.wait_timeout(&platform, 0));
        assert!(!completion.is_armed());
    }

    #[test]
    fn test_complete_from_other_thread() {
        let platform = StdPlatform::new();
        let completion = Arc::new(Completion::new());
        completion.arm();

        let remote = Arc::clone(&completion);
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.complete()
        });

        assert!(completion.wait_timeout(&platform, 2_000_000));
        assert!(t.join().unwrap());
    }

    #[test]
    fn test_wait_timeout_leaves_idle() {
        let platform = StdPlatform::new();
        let completion = Completion::new();
        completion.arm();

        let start = Instant::now();
        assert!(!completion.wait_timeout(&platform, 15_000));
        assert!(start.elapsed() >= Duration::from_millis(15));
        assert!(!completion.is_armed());
        assert!(!completion.complete());
    }
}
