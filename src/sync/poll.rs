//! Bounded busy-wait
//!
//! Used for hardware status bits that the firmware clears without raising
//! an interrupt (doorbell pending bits, the PRCM hardware semaphore) and
//! underneath [`Completion::wait_timeout`](super::Completion::wait_timeout).

use crate::platform::Platform;

/// The predicate did not become true within the bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut;

/// Spin until `cond` returns true or `timeout_us` microseconds elapse.
///
/// Never returns `Err` before the bound has fully elapsed. The predicate is
/// evaluated once more after the deadline so a condition that became true
/// while the caller was descheduled is not reported as a timeout.
pub fn wait_until<P, F>(platform: &P, timeout_us: u64, mut cond: F) -> Result<(), TimedOut>
where
    P: Platform + ?Sized,
    F: FnMut() -> bool,
{
    let start = platform.timestamp_us();
    loop {
        if cond() {
            return Ok(());
        }
        if platform.timestamp_us().wrapping_sub(start) > timeout_us {
            return if cond() { Ok(()) } else { Err(TimedOut) };
        }
        platform.relax();
    }
}
