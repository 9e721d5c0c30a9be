//! Runtime configuration
//!
//! Hardware offsets are compile-time constants in
//! [`regs`](crate::drivers::prcmu::regs); everything here is chosen by the
//! integrating kernel.

/// DB5500 silicon revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Silicon {
    V1,
    V2,
}

/// Driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrcmuConfig {
    /// First number of the abstract PRCMU interrupt range
    pub irq_base: u32,
    /// Bound on configuration requests (OPP, EPOD, clocks, thermal)
    pub ack_timeout_us: u64,
    /// Bound on enabling the system reference clock
    pub sysclk_timeout_us: u64,
    /// Bound on ABB register transfers over mailbox 5
    pub abb_timeout_us: u64,
    /// Bound on the firmware draining a previous request
    pub doorbell_timeout_us: u64,
    /// Bound on taking the PRCM hardware semaphore
    pub hwsem_timeout_us: u64,
    /// Forces the silicon revision instead of deriving it from the
    /// firmware version words
    pub silicon: Option<Silicon>,
}

impl PrcmuConfig {
    pub const fn new(irq_base: u32) -> Self {
        Self {
            irq_base,
            ack_timeout_us: 500_000,
            sysclk_timeout_us: 20_000_000,
            abb_timeout_us: 500_000,
            doorbell_timeout_us: 10_000,
            hwsem_timeout_us: 10_000,
            silicon: None,
        }
    }
}

impl Default for PrcmuConfig {
    fn default() -> Self {
        Self::new(0)
    }
}
