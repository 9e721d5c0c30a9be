//! Abstract PRCMU interrupt range
//!
//! Each [`PrcmuIrq`] maps to one wakeup bit. Unmasked interrupts stay
//! enabled as wakeups; mask changes only update the local mask and queue a
//! wakeup reconfiguration for the deferred context, so they are safe to
//! call from interrupt context.

use core::sync::atomic::Ordering;

use super::dispatch::DeferredWork;
use super::Prcmu;
use crate::drivers::bus::Bus;
use crate::drivers::irqchip::prcmu_wakeup::{PrcmuIrq, NUM_PRCMU_WAKEUPS};
use crate::drivers::irqchip::IrqHandler;
use crate::platform::Platform;

impl<B: Bus, P: Platform> Prcmu<B, P> {
    pub fn irq_mask(&self, irq: PrcmuIrq) {
        self.dbb_irqs.fetch_and(!irq.wakeup_bit(), Ordering::AcqRel);
        self.queue_deferred(DeferredWork::CONFIG_WAKEUPS);
    }

    pub fn irq_unmask(&self, irq: PrcmuIrq) {
        self.dbb_irqs.fetch_or(irq.wakeup_bit(), Ordering::AcqRel);
        self.queue_deferred(DeferredWork::CONFIG_WAKEUPS);
    }

    /// Wake-ups are acknowledged to the firmware as a whole by the
    /// dispatcher; nothing to do per interrupt.
    pub fn irq_ack(&self, _irq: PrcmuIrq) {}

    pub fn is_irq_masked(&self, irq: PrcmuIrq) -> bool {
        self.dbb_irqs.load(Ordering::Acquire) & irq.wakeup_bit() == 0
    }

    /// System interrupt number of `irq`.
    pub fn irq_number(&self, irq: PrcmuIrq) -> u32 {
        self.config.irq_base + irq.index() as u32
    }

    /// Abstract interrupt behind a system interrupt number.
    ///
    /// # Panics
    ///
    /// If `number` is outside the PRCMU interrupt range.
    pub fn irq_from_number(&self, number: u32) -> PrcmuIrq {
        number
            .checked_sub(self.config.irq_base)
            .and_then(|index| PrcmuIrq::from_index(index as usize))
            .unwrap_or_else(|| {
                panic!(
                    "IRQ {number} outside PRCMU range {}..{}",
                    self.config.irq_base,
                    self.config.irq_base + NUM_PRCMU_WAKEUPS as u32
                )
            })
    }

    pub fn irq_mask_number(&self, number: u32) {
        self.irq_mask(self.irq_from_number(number));
    }

    pub fn irq_unmask_number(&self, number: u32) {
        self.irq_unmask(self.irq_from_number(number));
    }

    /// Install the handler run when `irq` fires, returning the previous one.
    ///
    /// Handlers run in interrupt context and must not block.
    pub fn register_irq_handler(&self, irq: PrcmuIrq, handler: IrqHandler) -> Option<IrqHandler> {
        self.handlers.register(irq, handler)
    }

    pub fn unregister_irq_handler(&self, irq: PrcmuIrq) -> Option<IrqHandler> {
        self.handlers.unregister(irq)
    }
}
