//! Interrupt-masking spinlock
//!
//! `IrqMutex` is a spinlock that masks IRQs on the local CPU while the lock
//! is held. It guards every piece of driver state that the PRCMU interrupt
//! dispatcher also touches (acknowledge buffers) or that must never be
//! preempted by it (mailbox 0 wakeup state, clock registry).
//!
//! ## Why mask interrupts?
//!
//! ```text
//! 1. Caller copies an acknowledge buffer under the lock
//! 2. PRCMU interrupt fires on the same CPU
//! 3. Dispatcher tries to store the next acknowledge under the same lock
//! 4. DEADLOCK: dispatcher spins forever, caller never resumes
//! ```
//!
//! Transaction locks that are held across an acknowledge wait must NOT be
//! an `IrqMutex`: the acknowledge can only arrive through the interrupt.
//! Those use `spin::Mutex` instead.
//!
//! Masking is only performed on bare-metal ARM targets; hosted builds
//! (simulation, tests) get a plain spinlock.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// Spinlock that masks interrupts while locked
///
/// # Example
/// ```ignore
/// let clocks = IrqMutex::new(ClockRegistry::new());
///
/// let mut registry = clocks.lock();
/// registry.entry_mut(RegClock::Sga).div = 4;
/// // Interrupts restored when guard is dropped
/// ```
pub struct IrqMutex<T> {
    inner: UnsafeCell<T>,
    locked: AtomicBool,
}

// SAFETY: IrqMutex is Sync because:
// - Access to inner data is protected by the atomic `locked` flag
// - IRQs are masked while the lock is held on bare metal
// - Only one thread/CPU can hold the lock at a time
unsafe impl<T: Send> Sync for IrqMutex<T> {}
unsafe impl<T: Send> Send for IrqMutex<T> {}

impl<T> IrqMutex<T> {
    /// Create a new mutex
    pub const fn new(value: T) -> Self {
        Self {
            inner: UnsafeCell::new(value),
            locked: AtomicBool::new(false),
        }
    }

    /// Acquire the lock (masks interrupts)
    ///
    /// Spins if the lock is already held. Critical sections are short and
    /// never wait for an acknowledge.
    pub fn lock(&self) -> IrqMutexGuard<'_, T> {
        let irq_state = IrqState::disable();

        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }

        IrqMutexGuard {
            mutex: self,
            irq_state,
        }
    }
}

impl<T: Default> Default for IrqMutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Guard returned by `IrqMutex::lock()`
///
/// Restores the interrupt mask when dropped.
pub struct IrqMutexGuard<'a, T> {
    mutex: &'a IrqMutex<T>,
    irq_state: IrqState,
}

impl<T> Deref for IrqMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Lock is held, so we have exclusive access
        unsafe { &*self.mutex.inner.get() }
    }
}

impl<T> DerefMut for IrqMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Lock is held, so we have exclusive access
        unsafe { &mut *self.mutex.inner.get() }
    }
}

impl<T> Drop for IrqMutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.locked.store(false, Ordering::Release);
        self.irq_state.restore();
    }
}

/// Saved interrupt mask state
struct IrqState {
    #[allow(dead_code)]
    flags: usize,
}

impl IrqState {
    /// Mask IRQs and return the previous state
    #[cfg(all(target_arch = "aarch64", target_os = "none"))]
    fn disable() -> Self {
        let daif: u64;

        // SAFETY: DAIF is accessible at EL1; the previous value is saved
        // and written back by `restore`.
        unsafe {
            core::arch::asm!("mrs {}, daif", out(reg) daif, options(nomem, nostack));
            core::arch::asm!("msr daifset, #2", options(nomem, nostack));
        }

        Self {
            flags: daif as usize,
        }
    }

    /// Mask IRQs and return the previous state
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    fn disable() -> Self {
        let cpsr: u32;

        // SAFETY: Reading CPSR and masking IRQs is allowed in SVC mode; the
        // previous value is saved and written back by `restore`.
        unsafe {
            core::arch::asm!("mrs {}, cpsr", out(reg) cpsr, options(nomem, nostack));
            core::arch::asm!("cpsid i", options(nomem, nostack));
        }

        Self {
            flags: cpsr as usize,
        }
    }

    #[cfg(not(all(any(target_arch = "aarch64", target_arch = "arm"), target_os = "none")))]
    fn disable() -> Self {
        Self { flags: 0 }
    }

    /// Restore the saved IRQ state
    #[cfg(all(target_arch = "aarch64", target_os = "none"))]
    fn restore(&self) {
        // SAFETY: Restoring a DAIF value previously read on this CPU
        unsafe {
            core::arch::asm!("msr daif, {}", in(reg) self.flags as u64, options(nomem, nostack));
        }
    }

    /// Restore the saved IRQ state
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    fn restore(&self) {
        // SAFETY: Only the control field (I/F bits) of a CPSR value
        // previously read on this CPU is written back
        unsafe {
            core::arch::asm!("msr cpsr_c, {}", in(reg) self.flags as u32, options(nomem, nostack));
        }
    }

    #[cfg(not(all(any(target_arch = "aarch64", target_arch = "arm"), target_os = "none")))]
    fn restore(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_gives_exclusive_access() {
        let mutex = IrqMutex::new(5u32);
        {
            let mut guard = mutex.lock();
            *guard += 1;
        }
        assert_eq!(*mutex.lock(), 6);
    }

    #[test]
    fn test_lock_released_on_drop() {
        let mutex = IrqMutex::new(());
        drop(mutex.lock());
        // Would spin forever if the first guard leaked the lock
        drop(mutex.lock());
    }

    #[test]
    fn test_concurrent_increments() {
        let mutex = Arc::new(IrqMutex::new(0u64));
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let mutex = Arc::clone(&mutex);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        *mutex.lock() += 1;
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(*mutex.lock(), 4000);
    }
}
