//! Acknowledge interrupt dispatcher and deferred work
//!
//! [`Prcmu::handle_interrupt`] is the immediate handler of the PRCMU
//! acknowledge line. It never blocks: per mailbox it decodes the
//! acknowledge, clears the interrupt bit and wakes the waiter. Work that has
//! to talk back to the firmware (wake-up acknowledge, wakeup
//! reconfiguration after mask changes) is coalesced into [`DeferredWork`]
//! bits and executed by [`Prcmu::run_deferred`] outside interrupt context.

use core::sync::atomic::Ordering;

use bitflags::bitflags;
use log::{error, warn};

use super::regs::{self, mb0, prcm};
use super::{Prcmu, PrcmuError};
use crate::drivers::bus::{Bus, Region};
use crate::drivers::irqchip::prcmu_wakeup::fired_irqs;
use crate::drivers::mailbox::{Channel, Delivery, MailboxId, Protocol};
use crate::platform::Platform;

/// Outcome of [`Prcmu::handle_interrupt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    /// No mailbox interrupt was pending
    None,
    Handled,
    /// Handled, and deferred work is pending
    WakeThread,
}

bitflags! {
    /// Coalesced work for the deferred context
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeferredWork: u32 {
        /// Acknowledge a delivered wake-up to the firmware
        const ACK_WAKEUP = 1 << 0;
        /// Push the interrupt mask into the wakeup configuration
        const CONFIG_WAKEUPS = 1 << 1;
    }
}

impl<B: Bus, P: Platform> Prcmu<B, P> {
    /// Service the acknowledge interrupt.
    ///
    /// Mailboxes are handled in ascending order. Safe to call with nothing
    /// pending.
    pub fn handle_interrupt(&self) -> IrqReturn {
        let bits = self.bus.read32(Region::Prcm, prcm::ARM_IT1_VAL) & regs::ALL_MBOX_BITS;
        if bits == 0 {
            return IrqReturn::None;
        }

        let mut ret = IrqReturn::Handled;
        for mailbox in MailboxId::ALL {
            if bits & mailbox.bit() != 0 && self.read_mailbox(mailbox) {
                ret = IrqReturn::WakeThread;
            }
        }
        ret
    }

    /// Returns true when deferred work was queued.
    fn read_mailbox(&self, mailbox: MailboxId) -> bool {
        match mailbox {
            MailboxId::MB0 => self.read_wakeup(),
            MailboxId::MB1 => self.deliver(&self.opp),
            MailboxId::MB2 => self.deliver(&self.power),
            MailboxId::MB3 => self.deliver(&self.sysclk),
            MailboxId::MB4 => self.deliver(&self.thermal),
            MailboxId::MB5 => self.deliver(&self.abb),
            _ => {
                self.clear_ack(mailbox);
                false
            }
        }
    }

    fn deliver<M: Protocol>(&self, channel: &Channel<M>) -> bool {
        let delivery = channel.deliver(&self.bus);
        self.clear_ack(M::ID);
        match delivery {
            Delivery::Recognized => {
                channel.signal();
            }
            Delivery::Unknown(header) => {
                warn!("{}: unknown acknowledge header {header:#x}", M::ID);
            }
        }
        false
    }

    /// Mailbox 0 only carries asynchronous wake-up events.
    fn read_wakeup(&self) -> bool {
        let ack = self.link().reader(MailboxId::MB0);
        let header = ack.header();

        let woke = if header == mb0::header::WAKE_UP {
            let field = if ack.read8(mb0::ack::READ_POINTER) & 1 != 0 {
                mb0::ack::WAKEUP_1_DBB
            } else {
                mb0::ack::WAKEUP_0_DBB
            };
            let events = ack.read32(field) & self.dbb_irqs.load(Ordering::Acquire);

            for irq in fired_irqs(events) {
                self.handlers.dispatch(irq);
            }
            self.queue_deferred(DeferredWork::ACK_WAKEUP);
            true
        } else {
            warn!("{}: unknown acknowledge header {header:#x}", MailboxId::MB0);
            false
        };

        self.clear_ack(MailboxId::MB0);
        woke
    }

    fn clear_ack(&self, mailbox: MailboxId) {
        self.bus
            .write32(Region::Prcm, prcm::ARM_IT1_CLEAR, mailbox.bit());
    }

    /// Run queued deferred work. Must not be called from interrupt context.
    ///
    /// Every queued item is attempted; the first failure is returned.
    pub fn run_deferred(&self) -> Result<(), PrcmuError> {
        let work = DeferredWork::from_bits_truncate(self.deferred.swap(0, Ordering::AcqRel));
        let mut result = Ok(());

        if work.contains(DeferredWork::ACK_WAKEUP) {
            if let Err(err) = self.ack_wakeup() {
                error!("wake-up acknowledge failed: {err}");
                result = Err(err);
            }
        }

        if work.contains(DeferredWork::CONFIG_WAKEUPS) {
            let mut mb0 = self.mb0.lock();
            if let Err(err) = self.config_wakeups(&mut mb0) {
                drop(mb0);
                error!("wakeup configuration failed: {err}");
                result = result.and(Err(err));
            }
        }

        result
    }

    pub fn has_deferred_work(&self) -> bool {
        self.deferred.load(Ordering::Acquire) != 0
    }
}
