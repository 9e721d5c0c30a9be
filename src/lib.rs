//! DB5500 PRCMU firmware mailbox driver
//!
//! Host side of the power, reset and clock management unit protocol:
//! typed power/clock/voltage operations, the per-mailbox transaction
//! engine, the acknowledge interrupt dispatcher and the wakeup interrupt
//! chip. See [`drivers::prcmu`] for the mailbox map.
//!
//! The crate is `no_std` and only needs `alloc` for shared interrupt
//! handlers. Hardware is reached through the [`Bus`] and [`Platform`]
//! traits; [`MmioBus`] covers memory-mapped bare-metal use.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod config;
pub mod drivers;
pub mod platform;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{PrcmuConfig, Silicon};
pub use drivers::bus::{Bus, MmioBus, Region};
pub use drivers::irqchip::prcmu_wakeup::{PrcmuIrq, WakeupSet, WakeupSource};
pub use drivers::irqchip::IrqHandler;
pub use drivers::mailbox::{MailboxError, MailboxId};
pub use drivers::prcmu::clock::{ClkOut, ClkOutSource, Clock, RegClock};
pub use drivers::prcmu::dispatch::IrqReturn;
pub use drivers::prcmu::epod::{Epod, EpodState};
pub use drivers::prcmu::opp::{ApeOpp, ArmOpp, DdrOpp};
pub use drivers::prcmu::power::{Esram0State, PowerState};
pub use drivers::prcmu::{FirmwareVersion, Prcmu, PrcmuError};
pub use platform::Platform;
