//! PRCMU interrupt chip
//!
//! The PRCMU demultiplexes its wake-up events into a contiguous range of
//! abstract interrupts. This module holds the bitmap translation and the
//! per-interrupt handler table the dispatcher calls into.

pub mod prcmu_wakeup;

use alloc::sync::Arc;

use crate::sync::IrqMutex;
use prcmu_wakeup::{PrcmuIrq, NUM_PRCMU_WAKEUPS};

/// Handler invoked from interrupt context when an abstract IRQ fires
pub type IrqHandler = Arc<dyn Fn(PrcmuIrq) + Send + Sync>;

/// Registered handlers, one slot per abstract IRQ
pub struct IrqHandlers {
    slots: IrqMutex<[Option<IrqHandler>; NUM_PRCMU_WAKEUPS]>,
}

impl IrqHandlers {
    pub const fn new() -> Self {
        Self {
            slots: IrqMutex::new([const { None }; NUM_PRCMU_WAKEUPS]),
        }
    }

    /// Install `handler`, returning the one it replaces.
    pub fn register(&self, irq: PrcmuIrq, handler: IrqHandler) -> Option<IrqHandler> {
        self.slots.lock()[irq.index()].replace(handler)
    }

    pub fn unregister(&self, irq: PrcmuIrq) -> Option<IrqHandler> {
        self.slots.lock()[irq.index()].take()
    }

    /// Run the handler of `irq` if one is registered.
    ///
    /// The handler is called with the table unlocked so it may register
    /// or unregister handlers itself.
    pub fn dispatch(&self, irq: PrcmuIrq) -> bool {
        let handler = self.slots.lock()[irq.index()].clone();
        match handler {
            Some(handler) => {
                handler(irq);
                true
            }
            None => false,
        }
    }
}

impl Default for IrqHandlers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_registered_handler() {
        let handlers = IrqHandlers::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        assert!(handlers
            .register(
                PrcmuIrq::Rtc,
                Arc::new(move |irq: PrcmuIrq| {
                    assert_eq!(irq, PrcmuIrq::Rtc);
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            )
            .is_none());

        assert!(handlers.dispatch(PrcmuIrq::Rtc));
        assert!(!handlers.dispatch(PrcmuIrq::Usb));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(handlers.unregister(PrcmuIrq::Rtc).is_some());
        assert!(!handlers.dispatch(PrcmuIrq::Rtc));
    }

    #[test]
    fn test_handler_may_unregister_itself() {
        let handlers = Arc::new(IrqHandlers::new());
        let table = Arc::clone(&handlers);
        handlers.register(
            PrcmuIrq::Abb,
            Arc::new(move |irq: PrcmuIrq| {
                table.unregister(irq);
            }),
        );

        assert!(handlers.dispatch(PrcmuIrq::Abb));
        assert!(!handlers.dispatch(PrcmuIrq::Abb));
    }
}
