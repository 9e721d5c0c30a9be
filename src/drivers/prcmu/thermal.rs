//! Mailbox 4: thermal supervision
//!
//! The firmware samples the die temperature with the configured period and
//! raises the temperature sensor wakeups when the hotmon window is left.
//! Crossing the hotdog threshold makes the firmware shut the system down.

use super::mailboxes::Thermal;
use super::regs::{mb4, tcdm};
use super::{Prcmu, PrcmuError};
use crate::drivers::bus::{Bus, Region};
use crate::drivers::mailbox::{Expect, RequestWriter, Transaction};
use crate::platform::Platform;

impl<B: Bus, P: Platform> Prcmu<B, P> {
    /// Set the shutdown temperature threshold.
    pub fn config_hotdog(&self, threshold: u8) -> Result<(), PrcmuError> {
        self.thermal_request(
            mb4::header::CFG_HOTDOG,
            mb4::ack_header::CFG_HOTDOG,
            |req| req.write16(mb4::req::HOTDOG_THRESHOLD, threshold as u16),
        )
    }

    /// Set the temperature monitoring window.
    ///
    /// Both limits are forwarded to the firmware as given.
    pub fn config_hotmon(&self, low: u8, high: u8) -> Result<(), PrcmuError> {
        self.thermal_request(
            mb4::header::CFG_HOTMON,
            mb4::ack_header::CFG_HOTMON,
            |req| {
                req.write16(mb4::req::HOTMON_LOW, low as u16);
                req.write16(mb4::req::HOTMON_HIGH, high as u16);
            },
        )
    }

    /// Start sampling the temperature every `period_ms` milliseconds.
    pub fn start_temp_sense(&self, period_ms: u16) -> Result<(), PrcmuError> {
        if period_ms == mb4::HOT_PERIOD_STOP {
            return Err(PrcmuError::InvalidArgument("temperature sampling period"));
        }
        self.config_hot_period(period_ms)
    }

    pub fn stop_temp_sense(&self) -> Result<(), PrcmuError> {
        self.config_hot_period(mb4::HOT_PERIOD_STOP)
    }

    /// Hotdog status published by the firmware
    pub fn hotdog(&self) -> u16 {
        self.bus.read16(Region::Tcdm, tcdm::SHARE_INFO_HOTDOG)
    }

    fn config_hot_period(&self, period: u16) -> Result<(), PrcmuError> {
        self.thermal_request(
            mb4::header::CFG_HOTPERIOD,
            mb4::ack_header::CFG_HOTPERIOD,
            |req| req.write16(mb4::req::HOT_PERIOD, period),
        )
    }

    /// Mailbox 4 acknowledges with a header of its own per request.
    fn thermal_request<F>(&self, header: u8, ack_header: u8, fill: F) -> Result<(), PrcmuError>
    where
        F: FnOnce(&RequestWriter<'_, B>),
    {
        let mut tx: Transaction<'_, Thermal> = self.thermal.begin();
        tx.send(
            &self.link(),
            header,
            Expect::success(ack_header),
            self.config.ack_timeout_us,
            |req, _| fill(req),
        )?;
        Ok(())
    }
}
