//! Device drivers
//!
//! Organized by layer:
//! - `bus`: register and shared-memory access
//! - `mailbox`: request/acknowledge channels over the PRCMU mailboxes
//! - `irqchip`: wakeup interrupt translation and handler table
//! - `prcmu`: the PRCMU driver built on the above

pub mod bus;
pub mod irqchip;
pub mod mailbox;
pub mod prcmu;
