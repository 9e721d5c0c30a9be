//! Clock requests
//!
//! Clocks are reached through four different paths:
//!
//! | Clock                     | Path                                      |
//! |---------------------------|-------------------------------------------|
//! | [`RegClock`]              | `*_MGT` register under the HW semaphore   |
//! | MSP1, CD                  | mailbox 2 `CLK_REQUEST`                   |
//! | SOC0/SOC1/DDR PLLs        | mailbox 2 `PLL_REQUEST`                   |
//! | TIMCLK                    | timer control register                    |
//! | SYSCLK                    | mailbox 3 `REFCLK_REQUEST`                |
//!
//! The clock registry records the divisor of every APE clock that follows
//! the APE operating point, so the divisors can be doubled at 50% OPP and
//! restored at 100%.

use log::{debug, error, warn};

use super::opp::ApeOpp;
use super::regs::{clk_mgt, clk_mgt_offsets as offsets, clkout, mb2, mb3, prcm, sem, tcr};
use super::{Prcmu, PrcmuError};
use crate::drivers::bus::{Bus, Region};
use crate::drivers::mailbox::Expect;
use crate::platform::Platform;
use crate::sync::poll::wait_until;

/// Number of programmable clock outputs
pub const NUM_CLKOUT: usize = 2;

/// Number of register-controlled clocks
pub const NUM_REG_CLOCKS: usize = 25;

/// Clock controlled through its own `*_MGT` register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RegClock {
    Sga = 0,
    Uart,
    Msp02,
    I2c,
    Sdmmc,
    Spare1,
    Per1,
    Per2,
    Per3,
    Per5,
    Per6,
    Pwm,
    Irda,
    Irrc,
    Hdmi,
    ApeAt,
    ApeTrace,
    Mcde,
    DsiAlt,
    Dma,
    B2r2,
    Tv,
    Rng,
    Sia,
    Sva,
}

impl RegClock {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Any clock [`Prcmu::request_clock`] can switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Clock {
    Reg(RegClock),
    Msp1,
    Cd,
    Timclk,
    PllSoc0,
    PllSoc1,
    PllDdr,
    Sysclk,
}

impl From<RegClock> for Clock {
    fn from(clock: RegClock) -> Self {
        Self::Reg(clock)
    }
}

/// Registry entry of one register clock
#[derive(Debug, Clone, Copy)]
pub struct ClkMgt {
    pub offset: usize,
    /// PLL switch saved while the clock is disabled
    pub pllsw: u32,
    /// Divisor at 100% APE OPP
    pub div: u32,
    /// Divisor follows the APE OPP
    pub scalable: bool,
    /// Runs at half rate; divisor doubled once at init
    pub force50: bool,
}

impl ClkMgt {
    const fn fixed(offset: usize) -> Self {
        Self {
            offset,
            pllsw: 0,
            div: 0,
            scalable: false,
            force50: false,
        }
    }

    const fn scalable(offset: usize) -> Self {
        Self {
            scalable: true,
            ..Self::fixed(offset)
        }
    }

    const fn half_rate(offset: usize) -> Self {
        Self {
            force50: true,
            ..Self::fixed(offset)
        }
    }
}

/// Register clock table, indexed by [`RegClock`]
pub struct ClockRegistry {
    entries: [ClkMgt; NUM_REG_CLOCKS],
}

impl ClockRegistry {
    pub const fn new() -> Self {
        Self {
            entries: [
                ClkMgt::scalable(offsets::SGACLK),
                ClkMgt::fixed(offsets::UARTCLK),
                ClkMgt::fixed(offsets::MSP02CLK),
                ClkMgt::fixed(offsets::I2CCLK),
                ClkMgt::half_rate(offsets::SDMMCCLK),
                ClkMgt::half_rate(offsets::SPARE1CLK),
                ClkMgt::fixed(offsets::PER1CLK),
                ClkMgt::scalable(offsets::PER2CLK),
                ClkMgt::scalable(offsets::PER3CLK),
                ClkMgt::fixed(offsets::PER5CLK),
                ClkMgt::scalable(offsets::PER6CLK),
                ClkMgt::fixed(offsets::PWMCLK),
                ClkMgt::fixed(offsets::IRDACLK),
                ClkMgt::fixed(offsets::IRRCCLK),
                ClkMgt::fixed(offsets::HDMICLK),
                ClkMgt::fixed(offsets::APEATCLK),
                ClkMgt::scalable(offsets::APETRACECLK),
                ClkMgt::scalable(offsets::MCDECLK),
                ClkMgt::fixed(offsets::DSIALTCLK),
                ClkMgt::scalable(offsets::DMACLK),
                ClkMgt::scalable(offsets::B2R2CLK),
                ClkMgt::fixed(offsets::TVCLK),
                ClkMgt::fixed(offsets::RNGCLK),
                ClkMgt::fixed(offsets::SIACLK),
                ClkMgt::fixed(offsets::SVACLK),
            ],
        }
    }

    pub fn entry(&self, clock: RegClock) -> &ClkMgt {
        &self.entries[clock.index()]
    }

    pub fn entry_mut(&mut self, clock: RegClock) -> &mut ClkMgt {
        &mut self.entries[clock.index()]
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ClkMgt> {
        self.entries.iter_mut()
    }
}

impl Default for ClockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Programmable clock output pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClkOut {
    Out0 = 0,
    Out1 = 1,
}

/// Clock routed to a CLKOUT pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClkOutSource {
    RefClkSel0,
    RtcClk0Sel0,
    UlpClkSel0,
    Static0,
    RefClk,
    UlpClk,
    ArmClk,
    SysAcc0Clk,
    Soc0PllClk,
    Soc1PllClk,
    DdrPllClk,
    TvClk,
    IrdaClk,
}

impl ClkOutSource {
    /// `(SEL0, SEL)` field values
    fn selectors(self) -> (u32, u32) {
        use clkout::*;
        match self {
            Self::RefClkSel0 => (SEL0_REF_CLK, SEL_STATIC0),
            Self::RtcClk0Sel0 => (SEL0_RTC_CLK0, SEL_STATIC0),
            Self::UlpClkSel0 => (SEL0_ULP_CLK, SEL_STATIC0),
            Self::Static0 => (SEL0_SEL_CLK, SEL_STATIC0),
            Self::RefClk => (SEL0_SEL_CLK, SEL_REFCLK),
            Self::UlpClk => (SEL0_SEL_CLK, SEL_ULPCLK),
            Self::ArmClk => (SEL0_SEL_CLK, SEL_ARMCLK),
            Self::SysAcc0Clk => (SEL0_SEL_CLK, SEL_SYSACC0CLK),
            Self::Soc0PllClk => (SEL0_SEL_CLK, SEL_SOC0PLLCLK),
            Self::Soc1PllClk => (SEL0_SEL_CLK, SEL_SOC1PLLCLK),
            Self::DdrPllClk => (SEL0_SEL_CLK, SEL_DDRPLLCLK),
            Self::TvClk => (SEL0_SEL_CLK, SEL_TVCLK),
            Self::IrdaClk => (SEL0_SEL_CLK, SEL_IRDACLK),
        }
    }
}

/// Largest CLKOUT divider value
pub const CLKOUT_MAX_DIV: u8 = 7;

impl<B: Bus, P: Platform> Prcmu<B, P> {
    /// Enable or disable a clock.
    pub fn request_clock(&self, clock: Clock, enable: bool) -> Result<(), PrcmuError> {
        match clock {
            Clock::Reg(clock) => self.request_reg_clock(clock, enable),
            Clock::Msp1 => self.request_fw_clock(mb2::CLK_MSP1, enable),
            Clock::Cd => self.request_fw_clock(mb2::CLK_CD, enable),
            Clock::Timclk => {
                self.request_timclk(enable);
                Ok(())
            }
            Clock::PllSoc0 => self.request_pll(mb2::PLL_SOC0, enable),
            Clock::PllSoc1 => self.request_pll(mb2::PLL_SOC1, enable),
            Clock::PllDdr => self.request_pll(mb2::PLL_DDR, enable),
            Clock::Sysclk => self.request_sysclk(enable),
        }
    }

    /// Stored 100% divisor of a scalable APE clock
    pub fn ape_clock_divisor(&self, clock: RegClock) -> Option<u32> {
        let clocks = self.clocks.lock();
        let entry = clocks.entry(clock);
        entry.scalable.then_some(entry.div)
    }

    fn request_reg_clock(&self, clock: RegClock, enable: bool) -> Result<(), PrcmuError> {
        let result = {
            let mut clocks = self.clocks.lock();
            let entry = clocks.entry_mut(clock);
            self.with_hw_semaphore(|| {
                let mut val = self.bus.read32(Region::Prcm, entry.offset);
                if enable {
                    val |= clk_mgt::CLKEN | entry.pllsw;
                } else {
                    entry.pllsw = val & clk_mgt::CLKPLLSW_MASK;
                    val &= !(clk_mgt::CLKEN | clk_mgt::CLKPLLSW_MASK);
                }
                self.bus.write32(Region::Prcm, entry.offset, val);
            })
        };

        if result.is_err() {
            error!("{clock:?}: PRCM hardware semaphore not released");
        }
        result
    }

    fn request_fw_clock(&self, client: u8, enable: bool) -> Result<(), PrcmuError> {
        let mut tx = self.power.begin();
        tx.send(
            &self.link(),
            mb2::header::CLK_REQUEST,
            Expect::success(mb2::header::CLK_REQUEST),
            self.config.ack_timeout_us,
            |req, _| {
                req.write8(mb2::req::CLK_CLIENT, client);
                req.write8(mb2::req::CLK_STATE, enable as u8);
            },
        )?;
        Ok(())
    }

    fn request_pll(&self, pll: u8, enable: bool) -> Result<(), PrcmuError> {
        let mut tx = self.power.begin();
        tx.send(
            &self.link(),
            mb2::header::PLL_REQUEST,
            Expect::success(mb2::header::PLL_REQUEST),
            self.config.ack_timeout_us,
            |req, state| {
                state.pll[pll as usize] = enable as u8;
                req.write8(mb2::req::PLL_CLIENT, pll);
                req.write8(mb2::req::PLL_STATE, enable as u8);
            },
        )?;
        Ok(())
    }

    fn request_timclk(&self, enable: bool) {
        let mut val = tcr::DOZE_MODE | tcr::TENSEL_MASK;
        if !enable {
            val |= tcr::STOP_TIMERS;
        }
        self.bus.write32(Region::Prcm, prcm::TCR, val);
    }

    /// The firmware only acknowledges a successful enable.
    fn request_sysclk(&self, enable: bool) -> Result<(), PrcmuError> {
        let state = if enable { mb3::SYSCLK_ON } else { mb3::SYSCLK_OFF };
        let link = self.link();
        let mut tx = self.sysclk.begin();

        if !enable {
            tx.post(&link, mb3::header::REFCLK_REQUEST, |req, last| {
                *last = state;
                req.write8(mb3::req::REFCLK_MGT, state);
            })?;
            return Ok(());
        }

        tx.send(
            &link,
            mb3::header::REFCLK_REQUEST,
            Expect::header(mb3::header::REFCLK_REQUEST).with_status(state),
            self.config.sysclk_timeout_us,
            |req, last| {
                *last = state;
                req.write8(mb3::req::REFCLK_MGT, state);
            },
        )?;
        Ok(())
    }

    /// Run `f` holding the PRCM hardware semaphore shared with the firmware.
    fn with_hw_semaphore<R>(&self, f: impl FnOnce() -> R) -> Result<R, PrcmuError> {
        wait_until(&self.platform, self.config.hwsem_timeout_us, || {
            self.bus.read32(Region::Prcm, prcm::SEM) & sem::PRCM_SEM == 0
        })
        .map_err(|_| PrcmuError::HwSemaphoreTimeout)?;

        let ret = f();
        self.bus.write32(Region::Prcm, prcm::SEM, 0);
        Ok(ret)
    }

    /// Record the 100% divisors of the scalable APE clocks and halve the
    /// rate of the fixed half-rate clocks.
    pub(super) fn init_ape_clocks(&self) {
        let opp = self.ape_opp();
        if opp != ApeOpp::Opp100 {
            warn!("initial APE OPP is {opp:?}, not 100%");
        }

        let mut zero_div = [None; NUM_REG_CLOCKS];
        {
            let mut clocks = self.clocks.lock();
            for (entry, zero) in clocks.iter_mut().zip(zero_div.iter_mut()) {
                if !entry.scalable && !entry.force50 {
                    continue;
                }

                let mut val = self.bus.read32(Region::Prcm, entry.offset);
                let div = (val & clk_mgt::CLKPLLDIV_MASK) >> clk_mgt::CLKPLLDIV_SHIFT;

                if entry.force50 {
                    val &= !clk_mgt::CLKPLLDIV_MASK;
                    val |= (div * 2) << clk_mgt::CLKPLLDIV_SHIFT;
                    self.bus.write32(Region::Prcm, entry.offset, val);
                    continue;
                }

                entry.div = div;
                if div == 0 {
                    *zero = Some(entry.offset);
                }
            }
        }

        for offset in zero_div.into_iter().flatten() {
            error!("scalable clock at offset {offset:#x} has zero divisor");
        }
    }

    /// Rewrite the scalable APE clock divisors for `opp`.
    ///
    /// Called with the mailbox 1 transaction held.
    pub(super) fn scale_ape_clocks(&self, opp: ApeOpp) -> Result<(), PrcmuError> {
        let mut written = [None; NUM_REG_CLOCKS];
        let result = {
            let clocks = self.clocks.lock();
            self.with_hw_semaphore(|| {
                for (entry, slot) in clocks.entries.iter().zip(written.iter_mut()) {
                    if !entry.scalable {
                        continue;
                    }

                    let div = match opp {
                        ApeOpp::Opp50 => entry.div * 2,
                        ApeOpp::Opp100 => entry.div,
                    };
                    let mut val = self.bus.read32(Region::Prcm, entry.offset);
                    val &= !clk_mgt::CLKPLLDIV_MASK;
                    val |= div << clk_mgt::CLKPLLDIV_SHIFT;
                    self.bus.write32(Region::Prcm, entry.offset, val);
                    *slot = Some((entry.offset, val));
                }
            })
        };

        match result {
            Ok(()) => {
                for (offset, val) in written.into_iter().flatten() {
                    debug!("clock register {offset:#x} = {val:#x}");
                }
                Ok(())
            }
            Err(err) => {
                error!("APE clock scaling to {opp:?} failed: {err}");
                Err(err)
            }
        }
    }

    /// Route `source` to a CLKOUT pin with divider `div`.
    ///
    /// Each output can be configured once.
    ///
    /// # Panics
    ///
    /// If `div` exceeds [`CLKOUT_MAX_DIV`].
    pub fn config_clkout(&self, out: ClkOut, source: ClkOutSource, div: u8) -> Result<(), PrcmuError> {
        assert!(div <= CLKOUT_MAX_DIV, "CLKOUT divider {div} out of range");

        let (sel0, sel) = source.selectors();
        let div = div as u32;
        let (sel_mask, sel_bits, div_mask, div_bits) = match out {
            ClkOut::Out0 => (
                clkout::CLKOUT0_SEL0_MASK | clkout::CLKOUT0_SEL_MASK,
                (sel0 << clkout::CLKOUT0_SEL0_SHIFT) | (sel << clkout::CLKOUT0_SEL_SHIFT),
                clkout::CLKOUT0_DIV_MASK,
                div << clkout::CLKOUT0_DIV_SHIFT,
            ),
            ClkOut::Out1 => (
                clkout::CLKOUT1_SEL0_MASK | clkout::CLKOUT1_SEL_MASK,
                (sel0 << clkout::CLKOUT1_SEL0_SHIFT) | (sel << clkout::CLKOUT1_SEL_SHIFT),
                clkout::CLKOUT1_DIV_MASK,
                div << clkout::CLKOUT1_DIV_SHIFT,
            ),
        };

        let mut configured = self.clkout_configured.lock();
        if configured[out as usize] {
            return Err(PrcmuError::AlreadyConfigured);
        }

        let val = self.bus.read32(Region::Prcm, prcm::CLKOCR);
        self.bus
            .write32(Region::Prcm, prcm::CLKOCR, sel_bits | (val & !sel_mask));
        let val = self.bus.read32(Region::Prcm, prcm::CLKODIV);
        self.bus
            .write32(Region::Prcm, prcm::CLKODIV, div_bits | (val & !div_mask));

        configured[out as usize] = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::mailbox::{MailboxError, MailboxId};
    use crate::drivers::prcmu::regs::{mb2, RC_FAIL, RC_SUCCESS};
    use crate::testing::{self, FakeFirmware, Reply, SimBus};
    use std::sync::Arc;

    const PLLSW: u32 = 0x2 << 5;

    #[test]
    fn test_reg_clock_saves_pll_switch() {
        let (prcmu, bus) = testing::prcmu();
        bus.prcm_write(offsets::UARTCLK, clk_mgt::CLKEN | PLLSW | 0x4);

        prcmu.request_clock(Clock::Reg(RegClock::Uart), false).unwrap();
        assert_eq!(bus.prcm_read(offsets::UARTCLK), 0x4);

        prcmu.request_clock(RegClock::Uart.into(), true).unwrap();
        assert_eq!(bus.prcm_read(offsets::UARTCLK), clk_mgt::CLKEN | PLLSW | 0x4);
        // Semaphore released
        assert_eq!(bus.prcm_read(prcm::SEM), 0);
    }

    #[test]
    fn test_reg_clock_semaphore_timeout() {
        let (prcmu, bus) = testing::prcmu();
        bus.prcm_write(offsets::I2CCLK, clk_mgt::CLKEN);
        bus.prcm_write(prcm::SEM, sem::PRCM_SEM);

        let err = prcmu.request_clock(Clock::Reg(RegClock::I2c), false).unwrap_err();
        assert_eq!(err, PrcmuError::HwSemaphoreTimeout);
        assert!(err.is_timeout());
        assert_eq!(bus.prcm_read(offsets::I2CCLK), clk_mgt::CLKEN);
    }

    #[test]
    fn test_init_records_and_halves_divisors() {
        let bus = SimBus::new();
        bus.prcm_write(offsets::SGACLK, clk_mgt::CLKEN | 0x3);
        bus.prcm_write(offsets::SDMMCCLK, clk_mgt::CLKEN | PLLSW | 0x3);
        bus.prcm_write(offsets::UARTCLK, 0x5);

        let prcmu = testing::prcmu_on(&bus);
        assert_eq!(prcmu.ape_clock_divisor(RegClock::Sga), Some(3));
        assert_eq!(prcmu.ape_clock_divisor(RegClock::Mcde), Some(0));
        assert_eq!(prcmu.ape_clock_divisor(RegClock::Sdmmc), None);
        assert_eq!(bus.prcm_read(offsets::SDMMCCLK), clk_mgt::CLKEN | PLLSW | 0x6);
        assert_eq!(bus.prcm_read(offsets::UARTCLK), 0x5);
    }

    #[test]
    fn test_timclk() {
        let (prcmu, bus) = testing::prcmu();
        prcmu.request_clock(Clock::Timclk, false).unwrap();
        assert_eq!(
            bus.prcm_read(prcm::TCR),
            tcr::DOZE_MODE | tcr::TENSEL_MASK | tcr::STOP_TIMERS
        );
        prcmu.request_clock(Clock::Timclk, true).unwrap();
        assert_eq!(bus.prcm_read(prcm::TCR), tcr::DOZE_MODE | tcr::TENSEL_MASK);
    }

    #[test]
    fn test_pll_request() {
        let (prcmu, bus) = testing::prcmu();
        let _fw = FakeFirmware::start(Arc::clone(&prcmu), |_, mailbox, header| {
            if mailbox == MailboxId::MB2 {
                vec![Reply::now(header).with(mb2::ack::PLL_STATUS, RC_SUCCESS)]
            } else {
                vec![]
            }
        });

        prcmu.request_clock(Clock::PllDdr, true).unwrap();
        let req = MailboxId::MB2.req_base();
        assert_eq!(bus.tcdm_read8(req + mb2::req::PLL_CLIENT), mb2::PLL_DDR);
        assert_eq!(bus.tcdm_read8(req + mb2::req::PLL_STATE), 1);
    }

    #[test]
    fn test_fw_clock_failure_status() {
        let (prcmu, bus) = testing::prcmu();
        let _fw = FakeFirmware::start(Arc::clone(&prcmu), |_, mailbox, header| {
            if mailbox == MailboxId::MB2 {
                vec![Reply::now(header).with(mb2::ack::CLK_STATUS, RC_FAIL)]
            } else {
                vec![]
            }
        });

        let err = prcmu.request_clock(Clock::Cd, true).unwrap_err();
        assert_eq!(
            err,
            PrcmuError::Mailbox(MailboxError::Status {
                mailbox: MailboxId::MB2,
                expected: RC_SUCCESS,
                received: RC_FAIL,
            })
        );
        assert_eq!(
            bus.tcdm_read8(MailboxId::MB2.req_base() + mb2::req::CLK_CLIENT),
            mb2::CLK_CD
        );
    }

    #[test]
    fn test_sysclk_disable_is_not_acknowledged() {
        let (prcmu, bus) = testing::prcmu();
        prcmu.request_clock(Clock::Sysclk, false).unwrap();
        assert_eq!(bus.ring_count(MailboxId::MB3), 1);
        assert_eq!(
            bus.tcdm_read8(MailboxId::MB3.req_base() + mb3::req::REFCLK_MGT),
            mb3::SYSCLK_OFF
        );
    }

    #[test]
    fn test_sysclk_enable_checks_state() {
        let (prcmu, _bus) = testing::prcmu();
        let _fw = FakeFirmware::start(Arc::clone(&prcmu), |_, mailbox, header| {
            if mailbox == MailboxId::MB3 {
                vec![Reply::now(header).with(mb3::ack::REFCLK_REQ, mb3::SYSCLK_OFF)]
            } else {
                vec![]
            }
        });

        let err = prcmu.request_clock(Clock::Sysclk, true).unwrap_err();
        assert_eq!(
            err,
            PrcmuError::Mailbox(MailboxError::Status {
                mailbox: MailboxId::MB3,
                expected: mb3::SYSCLK_ON,
                received: mb3::SYSCLK_OFF,
            })
        );
    }

    #[test]
    fn test_clkout_once_per_output() {
        let (prcmu, bus) = testing::prcmu();
        bus.prcm_write(prcm::CLKOCR, 0xFFFF);

        prcmu
            .config_clkout(ClkOut::Out1, ClkOutSource::Soc1PllClk, 3)
            .unwrap();
        assert_eq!(
            bus.prcm_read(prcm::CLKOCR),
            0xFFFF | (clkout::SEL_SOC1PLLCLK << clkout::CLKOUT1_SEL_SHIFT)
        );
        assert_eq!(bus.prcm_read(prcm::CLKODIV), 3 << clkout::CLKOUT1_DIV_SHIFT);

        assert_eq!(
            prcmu.config_clkout(ClkOut::Out1, ClkOutSource::RefClk, 1),
            Err(PrcmuError::AlreadyConfigured)
        );

        prcmu
            .config_clkout(ClkOut::Out0, ClkOutSource::RtcClk0Sel0, 0)
            .unwrap();
        assert_eq!(
            bus.prcm_read(prcm::CLKOCR) & (clkout::CLKOUT0_SEL0_MASK | clkout::CLKOUT0_SEL_MASK),
            clkout::SEL0_RTC_CLK0 << clkout::CLKOUT0_SEL0_SHIFT
        );
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_clkout_divider_range() {
        let (prcmu, _bus) = testing::prcmu();
        let _ = prcmu.config_clkout(ClkOut::Out0, ClkOutSource::ArmClk, 8);
    }
}
