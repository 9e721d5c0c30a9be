//! EPOD power domains (mailbox 2)

use core::sync::atomic::Ordering;

use super::mailboxes::NUM_EPOD;
use super::regs::mb2;
use super::{Prcmu, PrcmuError};
use crate::drivers::bus::Bus;
use crate::drivers::mailbox::Expect;
use crate::platform::Platform;

/// Embedded power domain switched by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Epod {
    Sga = 0,
    Hva = 1,
    Sia = 2,
    Disp = 3,
    /// ESRAM banks 1 and 2, the only EPOD with RAM retention
    Esram12 = 4,
}

impl Epod {
    pub const ALL: [Self; NUM_EPOD] = [Self::Sga, Self::Hva, Self::Sia, Self::Disp, Self::Esram12];

    pub const fn client(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpodState {
    Off,
    On,
    RamRetention,
}

impl Epod {
    /// Firmware code for `state`.
    ///
    /// # Panics
    ///
    /// On RAM retention for any EPOD but [`Epod::Esram12`].
    fn state_code(self, state: EpodState) -> u8 {
        match (self, state) {
            (Self::Esram12, EpodState::On) => mb2::EPOD_OOR_ON,
            (Self::Esram12, EpodState::Off) => mb2::EPOD_OOR_OFF,
            (Self::Esram12, EpodState::RamRetention) => mb2::EPOD_OOR_RET,
            (_, EpodState::On) => mb2::EPOD_ON,
            (_, EpodState::Off) => mb2::EPOD_OFF,
            (epod, EpodState::RamRetention) => panic!("{epod:?} has no RAM retention"),
        }
    }
}

impl<B: Bus, P: Platform> Prcmu<B, P> {
    /// Switch an EPOD.
    pub fn set_epod(&self, epod: Epod, state: EpodState) -> Result<(), PrcmuError> {
        let code = epod.state_code(state);

        let mut tx = self.power.begin();
        tx.send(
            &self.link(),
            mb2::header::EPOD_REQUEST,
            Expect::success(mb2::header::EPOD_REQUEST),
            self.config.ack_timeout_us,
            |req, _| {
                self.epod_requests[epod.client() as usize].store(code, Ordering::Release);
                req.write8(mb2::req::EPOD_CLIENT, epod.client());
                req.write8(mb2::req::EPOD_STATE, code);
            },
        )?;
        Ok(())
    }

    /// Last state code requested for `epod`, 0 before any request
    ///
    /// Does not wait for a mailbox 2 request in flight.
    pub fn epod_request(&self, epod: Epod) -> u8 {
        self.epod_requests[epod.client() as usize].load(Ordering::Acquire)
    }
}
