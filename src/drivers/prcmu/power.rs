//! Mailbox 0: power state transitions, wakeup configuration, system reset
//!
//! Mailbox 0 requests are never acknowledged; the firmware consumes them
//! when the AP enters the requested state or reconfigures its wakeups. All
//! mailbox 0 request writes happen under one `IrqMutex` since the deferred
//! wake-up acknowledge shares the request header with the caller side.

use core::sync::atomic::Ordering;

use super::regs::{self, mb0, prcm, tcdm};
use super::{Prcmu, PrcmuError};
use crate::drivers::bus::{Bus, Region};
use crate::drivers::irqchip::prcmu_wakeup::WakeupSet;
use crate::drivers::mailbox::MailboxId;
use crate::platform::Platform;

/// Wakeup state sent over mailbox 0
#[derive(Debug, Default)]
pub(crate) struct WakeupConfig {
    /// Hardware bits of the wakeup sources enabled by `enable_wakeups`
    dbb_wakeups: u32,
    /// ABB events to read out on wake-up
    abb_events: u32,
    last_dbb: u32,
    last_abb: u32,
}

/// AP power state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Sleep,
    DeepSleep,
    Idle,
    /// Not available on DB5500
    DeepIdle,
}

/// ESRAM0 state while the AP is in deep sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Esram0State {
    Off,
    Retention,
}

impl Esram0State {
    /// Generic ESRAM0 deep-sleep codes used by board code
    pub const RAW_OFF: u8 = 1;
    pub const RAW_RET: u8 = 2;

    pub fn from_raw(state: u8) -> Option<Self> {
        match state {
            Self::RAW_OFF => Some(Self::Off),
            Self::RAW_RET => Some(Self::Retention),
            _ => None,
        }
    }
}

/// Size of one ABB event buffer
pub const ABB_EVENT_BUFFER_LEN: usize = mb0::ack::EVENT_ABB_NUMBERS;

impl<B: Bus, P: Platform> Prcmu<B, P> {
    /// Request an AP power state transition.
    ///
    /// The firmware performs the transition when the AP executes WFI.
    ///
    /// # Panics
    ///
    /// On [`PowerState::DeepIdle`], which the firmware does not implement.
    pub fn set_power_state(
        &self,
        state: PowerState,
        keep_ulp_clk: bool,
        keep_ap_pll: bool,
    ) -> Result<(), PrcmuError> {
        let ap_state = match state {
            PowerState::Sleep => mb0::AP_SLEEP,
            PowerState::DeepSleep => mb0::AP_DEEP_SLEEP,
            PowerState::Idle => mb0::AP_IDLE,
            PowerState::DeepIdle => panic!("PRCMU: deep idle is not supported"),
        };

        let _mb0 = self.mb0.lock();
        let link = self.link();
        link.wait_doorbell_clear(MailboxId::MB0)?;

        let req = link.writer(MailboxId::MB0);
        req.write8(mb0::req::AP_POWER_STATE, ap_state);
        if state == PowerState::Idle {
            req.write8(mb0::req::DDR_STATE, mb0::DDR_PWR_STATE_UNCHANGED);
        }
        req.write8(mb0::req::AP_PLL_STATE, keep_ap_pll as u8);
        req.write8(mb0::req::ULP_CLOCK_STATE, keep_ulp_clk as u8);

        link.ring(MailboxId::MB0, mb0::header::PWR_STATE_TRANS);
        Ok(())
    }

    /// Select the ESRAM0 state used by the next deep sleep.
    ///
    /// Only stages the request field; it is consumed with the next power
    /// state transition.
    pub fn config_esram0_deep_sleep(&self, state: Esram0State) {
        let code = match state {
            Esram0State::Off => mb0::OFF_ST,
            Esram0State::Retention => mb0::RET_ST,
        };

        let _mb0 = self.mb0.lock();
        self.link()
            .writer(MailboxId::MB0)
            .write8(mb0::req::ESRAM0_STATE, code);
    }

    /// [`config_esram0_deep_sleep`](Self::config_esram0_deep_sleep) with
    /// a generic state code.
    pub fn config_esram0_deep_sleep_raw(&self, state: u8) -> Result<(), PrcmuError> {
        let state = Esram0State::from_raw(state)
            .ok_or(PrcmuError::InvalidArgument("ESRAM0 deep sleep state"))?;
        self.config_esram0_deep_sleep(state);
        Ok(())
    }

    /// Set the wakeup sources of the AP.
    ///
    /// Unmasked PRCMU interrupts stay enabled as wakeups. Nothing is sent
    /// when the resulting configuration equals the last one sent.
    pub fn enable_wakeups(&self, wakeups: WakeupSet) -> Result<(), PrcmuError> {
        let bits = wakeups.hw_bits();
        let mut mb0 = self.mb0.lock();
        mb0.dbb_wakeups = bits;
        self.config_wakeups(&mut mb0)
    }

    /// Select the ABB events the firmware reads out on wake-up.
    pub fn config_abb_event_readout(&self, abb_events: u32) -> Result<(), PrcmuError> {
        let mut mb0 = self.mb0.lock();
        mb0.abb_events = abb_events;
        self.config_wakeups(&mut mb0)
    }

    /// Copy of the ABB event buffer the firmware filled last.
    pub fn read_abb_events(&self) -> [u8; ABB_EVENT_BUFFER_LEN] {
        let ack = self.link().reader(MailboxId::MB0);
        let field = if ack.read8(mb0::ack::READ_POINTER) & 1 != 0 {
            mb0::ack::WAKEUP_1_ABB
        } else {
            mb0::ack::WAKEUP_0_ABB
        };

        let mut events = [0u8; ABB_EVENT_BUFFER_LEN];
        ack.read_bytes(field, &mut events);
        events
    }

    /// Store `reset_code` and request a software reset from the firmware.
    pub fn system_reset(&self, reset_code: u16) {
        self.bus
            .write16(Region::Tcdm, tcdm::SW_RST_REASON, reset_code);
        self.bus.write32(Region::Prcm, prcm::APE_SOFTRST, 1);
    }

    /// Drive RESOUTn pin `resoutn` (0..=2) high when `state` is set,
    /// low otherwise.
    pub fn resetout(&self, resoutn: u8, state: bool) -> Result<(), PrcmuError> {
        if resoutn >= regs::NUM_RESOUTN {
            return Err(PrcmuError::InvalidArgument("RESOUTn pin"));
        }

        let offset = if state { prcm::RESOUTN_SET } else { prcm::RESOUTN_CLR };
        self.bus.write32(Region::Prcm, offset, 1 << resoutn);
        Ok(())
    }

    /// Reset code stored by [`system_reset`](Self::system_reset) before the
    /// last restart
    pub fn reset_code(&self) -> u16 {
        self.bus.read16(Region::Tcdm, tcdm::SW_RST_REASON)
    }

    /// Send the wakeup configuration if it changed. Caller holds `mb0`.
    pub(crate) fn config_wakeups(&self, mb0: &mut WakeupConfig) -> Result<(), PrcmuError> {
        let dbb = self.dbb_irqs.load(Ordering::Acquire) | mb0.dbb_wakeups;
        let abb = mb0.abb_events;

        if dbb == mb0.last_dbb && abb == mb0.last_abb {
            return Ok(());
        }

        let link = self.link();
        link.wait_doorbell_clear(MailboxId::MB0)?;

        let req = link.writer(MailboxId::MB0);
        req.write32(mb0::req::WAKEUP_DBB, dbb);
        req.write32(mb0::req::WAKEUP_ABB, abb);
        link.ring(MailboxId::MB0, mb0::header::WAKE_UP_CFG);

        mb0.last_dbb = dbb;
        mb0.last_abb = abb;
        Ok(())
    }

    /// Tell the firmware the wake-up event buffer was read.
    pub(crate) fn ack_wakeup(&self) -> Result<(), PrcmuError> {
        let _mb0 = self.mb0.lock();
        let link = self.link();
        link.wait_doorbell_clear(MailboxId::MB0)?;
        link.ring(MailboxId::MB0, mb0::header::RD_WAKE_UP_ACK);
        Ok(())
    }
}
