//! DB5500 PRCMU driver
//!
//! The PRCMU is a co-processor owning power, clock and voltage control of
//! the SoC. The host negotiates with its firmware over eight shared-memory
//! mailboxes and one acknowledge interrupt line:
//!
//! | Mailbox | Use                                          | Answered |
//! |---------|----------------------------------------------|----------|
//! | 0       | power state, wakeup configuration, wake-ups  | no       |
//! | 1       | ARM/APE operating points                     | yes      |
//! | 2       | EPODs, firmware clocks, PLLs                 | yes      |
//! | 3       | system reference clock                       | enable   |
//! | 4       | thermal supervision                          | yes      |
//! | 5       | I2C proxy to the analog baseband             | yes      |
//! | 6, 7    | unused, acknowledges are only cleared        | -        |
//!
//! # Usage
//!
//! ```ignore
//! let bus = unsafe { MmioBus::new(PRCMU_BASE, TCDM_BASE, TCPM_BASE) };
//! let prcmu = Prcmu::new(bus, platform, PrcmuConfig::new(IRQ_PRCMU_BASE));
//!
//! // Interrupt handler for the acknowledge line
//! if prcmu.handle_interrupt() == IrqReturn::WakeThread {
//!     // schedule a call to prcmu.run_deferred()
//! }
//!
//! prcmu.set_arm_opp(ArmOpp::Opp50)?;
//! ```

pub mod abb;
pub mod clock;
pub mod dispatch;
pub mod epod;
pub mod error;
pub mod irq;
pub mod mailboxes;
pub mod opp;
pub mod power;
pub mod regs;
pub mod thermal;

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use log::info;

use crate::config::{PrcmuConfig, Silicon};
use crate::drivers::bus::{Bus, Region};
use crate::drivers::irqchip::IrqHandlers;
use crate::drivers::mailbox::{Channel, Link};
use crate::platform::Platform;
use crate::sync::IrqMutex;

use clock::ClockRegistry;
use dispatch::DeferredWork;
use mailboxes::{AbbI2c, NUM_EPOD, Opp, Power, Sysclk, Thermal};
use power::WakeupConfig;

pub use error::PrcmuError;

/// Firmware identification read from TCPM at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FirmwareVersion {
    pub board: u8,
    pub fw_version: u8,
    pub api_version: u8,
}

impl FirmwareVersion {
    const BOARD_V2: u8 = 0x20;

    fn read<B: Bus + ?Sized>(bus: &B) -> Self {
        let high = bus.read32(Region::Tcpm, regs::tcpm::FW_VERSION);
        let low = bus.read32(Region::Tcpm, regs::tcpm::FW_VERSION + 4);
        Self {
            board: (high >> 24) as u8,
            fw_version: high as u8,
            api_version: low as u8,
        }
    }

    pub fn silicon(&self) -> Silicon {
        if self.board == Self::BOARD_V2 {
            Silicon::V2
        } else {
            Silicon::V1
        }
    }
}

/// PRCMU driver instance
pub struct Prcmu<B, P> {
    bus: B,
    platform: P,
    config: PrcmuConfig,
    version: FirmwareVersion,
    silicon: Silicon,

    /// Mailbox 0 request state
    mb0: IrqMutex<WakeupConfig>,
    /// Hardware bits of the unmasked abstract interrupts
    dbb_irqs: AtomicU32,

    opp: Channel<Opp>,
    power: Channel<Power>,
    sysclk: Channel<Sysclk>,
    thermal: Channel<Thermal>,
    abb: Channel<AbbI2c>,

    /// Last state code requested per EPOD, readable without the mailbox 2 lock
    epod_requests: [AtomicU8; NUM_EPOD],

    clocks: IrqMutex<ClockRegistry>,
    clkout_configured: IrqMutex<[bool; clock::NUM_CLKOUT]>,

    handlers: IrqHandlers,
    deferred: AtomicU32,
}

impl<B: Bus, P: Platform> Prcmu<B, P> {
    /// Bring up the driver.
    ///
    /// Reads the firmware version, drops acknowledges left pending by
    /// earlier boot stages and records the APE clock divisors. The
    /// acknowledge interrupt may be enabled once this returns.
    pub fn new(bus: B, platform: P, config: PrcmuConfig) -> Self {
        let version = FirmwareVersion::read(&bus);
        let silicon = config.silicon.unwrap_or_else(|| version.silicon());

        info!(
            "PRCMU firmware {:#x}, API {:#x}, board {:?}",
            version.fw_version, version.api_version, silicon
        );

        bus.write32(Region::Prcm, regs::prcm::ARM_IT1_CLEAR, regs::ALL_MBOX_BITS);

        let prcmu = Self {
            bus,
            platform,
            config,
            version,
            silicon,
            mb0: IrqMutex::new(WakeupConfig::default()),
            dbb_irqs: AtomicU32::new(0),
            opp: Channel::new(),
            power: Channel::new(),
            sysclk: Channel::new(),
            thermal: Channel::new(),
            abb: Channel::new(),
            epod_requests: [const { AtomicU8::new(0) }; NUM_EPOD],
            clocks: IrqMutex::new(ClockRegistry::new()),
            clkout_configured: IrqMutex::new([false; clock::NUM_CLKOUT]),
            handlers: IrqHandlers::new(),
            deferred: AtomicU32::new(0),
        };
        prcmu.init_ape_clocks();
        prcmu
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &PrcmuConfig {
        &self.config
    }

    pub fn version(&self) -> FirmwareVersion {
        self.version
    }

    pub fn silicon(&self) -> Silicon {
        self.silicon
    }

    fn link(&self) -> Link<'_, B, P> {
        Link {
            bus: &self.bus,
            platform: &self.platform,
            doorbell_timeout_us: self.config.doorbell_timeout_us,
        }
    }

    /// Queue deferred work, notifying the platform when the work is new.
    fn queue_deferred(&self, work: DeferredWork) {
        let prev = self.deferred.fetch_or(work.bits(), Ordering::AcqRel);
        if prev & work.bits() != work.bits() {
            self.platform.schedule_deferred();
        }
    }
}
