//! Execution environment hooks
//!
//! The driver never sleeps on an OS primitive: every wait is a bounded
//! poll against a microsecond clock. The platform provides that clock, the
//! relax hint used inside poll loops, and a hook telling the surrounding
//! kernel that deferred work is pending.

/// Services the driver needs from the kernel it runs in.
pub trait Platform: Send + Sync {
    /// Monotonic timestamp in microseconds.
    fn timestamp_us(&self) -> u64;

    /// Called on every iteration of a busy-wait loop.
    ///
    /// Bare-metal kernels spin; hosted or preemptive kernels may yield.
    fn relax(&self) {
        core::hint::spin_loop();
    }

    /// Deferred work was queued.
    ///
    /// Called from interrupt context, must not block. The kernel is
    /// expected to call [`Prcmu::run_deferred`] soon after, outside
    /// interrupt context.
    ///
    /// [`Prcmu::run_deferred`]: crate::Prcmu::run_deferred
    fn schedule_deferred(&self) {}
}
