//! Operating points
//!
//! ARM and APE operating points are negotiated over mailbox 1; the
//! acknowledge region doubles as the readback of the current OPPs. The DDR
//! operating point is a plain PRCM register.

use log::error;

use super::regs::{mb1, prcm, tcdm};
use super::{Prcmu, PrcmuError};
use crate::config::Silicon;
use crate::drivers::bus::{Bus, Region};
use crate::drivers::mailbox::{Expect, MailboxId};
use crate::platform::Platform;

/// ARM operating point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmOpp {
    Opp100,
    Opp50,
    /// ARM clocked from the external clock
    ExtClk,
}

impl ArmOpp {
    /// Generic ARM OPP codes
    pub const RAW_100: u8 = 0x02;
    pub const RAW_50: u8 = 0x03;
    pub const RAW_EXTCLK: u8 = 0x07;

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            Self::RAW_100 => Some(Self::Opp100),
            Self::RAW_50 => Some(Self::Opp50),
            Self::RAW_EXTCLK => Some(Self::ExtClk),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Self::Opp100 => Self::RAW_100,
            Self::Opp50 => Self::RAW_50,
            Self::ExtClk => Self::RAW_EXTCLK,
        }
    }

    fn fw_code(self) -> u8 {
        match self {
            Self::Opp100 => mb1::ARM_100_OPP,
            Self::Opp50 => mb1::ARM_50_OPP,
            Self::ExtClk => mb1::ARM_EXT_OPP,
        }
    }

    fn from_fw_code(code: u8) -> Option<Self> {
        match code {
            mb1::ARM_100_OPP => Some(Self::Opp100),
            mb1::ARM_50_OPP => Some(Self::Opp50),
            mb1::ARM_EXT_OPP => Some(Self::ExtClk),
            _ => None,
        }
    }
}

/// APE operating point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApeOpp {
    Opp100,
    Opp50,
}

impl ApeOpp {
    pub const RAW_100: u8 = 0x02;
    pub const RAW_50: u8 = 0x03;

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            Self::RAW_100 => Some(Self::Opp100),
            Self::RAW_50 => Some(Self::Opp50),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Self::Opp100 => Self::RAW_100,
            Self::Opp50 => Self::RAW_50,
        }
    }

    fn fw_code(self) -> u8 {
        match self {
            Self::Opp100 => mb1::APE_100_OPP,
            Self::Opp50 => mb1::APE_50_OPP,
        }
    }

    fn from_fw_code(code: u8) -> Option<Self> {
        match code {
            mb1::APE_100_OPP => Some(Self::Opp100),
            mb1::APE_50_OPP => Some(Self::Opp50),
            _ => None,
        }
    }
}

/// DDR operating point, written as-is to the APE minimum bandwidth register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdrOpp {
    Opp100 = 0x00,
    Opp50 = 0x01,
}

impl DdrOpp {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(Self::Opp100),
            0x01 => Some(Self::Opp50),
            _ => None,
        }
    }

    pub fn raw(self) -> u8 {
        self as u8
    }
}

impl<B: Bus, P: Platform> Prcmu<B, P> {
    /// Request an ARM operating point.
    ///
    /// Fails unless the firmware reports the new OPP with a successful
    /// voltage change.
    pub fn set_arm_opp(&self, opp: ArmOpp) -> Result<(), PrcmuError> {
        let code = opp.fw_code();
        let mut tx = self.opp.begin();
        let ack = tx.send(
            &self.link(),
            mb1::header::ARM_OPP,
            Expect::success(mb1::header::ARM_OPP),
            self.config.ack_timeout_us,
            |req, state| {
                state.arm = code;
                req.write8(mb1::req::ARM_OPP, code);
            },
        )?;

        check_applied(code, ack.arm_opp)
    }

    pub fn set_arm_opp_raw(&self, raw: u8) -> Result<(), PrcmuError> {
        let opp = ArmOpp::from_raw(raw).ok_or(PrcmuError::InvalidArgument("ARM OPP"))?;
        self.set_arm_opp(opp)
    }

    /// Current ARM operating point.
    pub fn arm_opp(&self) -> ArmOpp {
        let code = self.current_opp_code(mb1::ack::CURRENT_ARM_OPP);
        ArmOpp::from_fw_code(code).unwrap_or_else(|| {
            error!("unknown ARM OPP code {code:#x}");
            ArmOpp::Opp100
        })
    }

    /// Request an APE operating point.
    ///
    /// The APE clock divisors are rescaled before the request is sent, with
    /// the mailbox 1 transaction held. Requesting the current OPP succeeds
    /// without talking to the firmware.
    pub fn set_ape_opp(&self, opp: ApeOpp) -> Result<(), PrcmuError> {
        if opp == self.ape_opp() {
            return Ok(());
        }
        if self.silicon == Silicon::V1 {
            return Err(PrcmuError::NotSupported);
        }

        let code = opp.fw_code();
        let mut tx = self.opp.begin();
        self.scale_ape_clocks(opp)?;

        let ack = tx.send(
            &self.link(),
            mb1::header::APE_OPP,
            Expect::success(mb1::header::APE_OPP),
            self.config.ack_timeout_us,
            |req, state| {
                state.ape = code;
                req.write8(mb1::req::APE_OPP, code);
            },
        )?;

        check_applied(code, ack.ape_opp)
    }

    pub fn set_ape_opp_raw(&self, raw: u8) -> Result<(), PrcmuError> {
        let opp = ApeOpp::from_raw(raw).ok_or(PrcmuError::InvalidArgument("APE OPP"))?;
        self.set_ape_opp(opp)
    }

    /// Current APE operating point.
    pub fn ape_opp(&self) -> ApeOpp {
        let code = self.current_opp_code(mb1::ack::CURRENT_APE_OPP);
        ApeOpp::from_fw_code(code).unwrap_or_else(|| {
            error!("unknown APE OPP code {code:#x}");
            ApeOpp::Opp100
        })
    }

    pub fn set_ddr_opp(&self, opp: DdrOpp) -> Result<(), PrcmuError> {
        if self.silicon == Silicon::V1 {
            return Err(PrcmuError::NotSupported);
        }
        self.bus
            .write8(Region::Prcm, prcm::DDR_SUBSYS_APE_MINBW, opp.raw());
        Ok(())
    }

    pub fn set_ddr_opp_raw(&self, raw: u8) -> Result<(), PrcmuError> {
        let opp = DdrOpp::from_raw(raw).ok_or(PrcmuError::InvalidArgument("DDR OPP"))?;
        self.set_ddr_opp(opp)
    }

    pub fn ddr_opp(&self) -> DdrOpp {
        let raw = self.bus.read8(Region::Prcm, prcm::DDR_SUBSYS_APE_MINBW);
        DdrOpp::from_raw(raw).unwrap_or_else(|| {
            error!("unknown DDR OPP {raw:#x}");
            DdrOpp::Opp100
        })
    }

    /// DDR frequency published by the firmware
    pub fn ddr_frequency(&self) -> u32 {
        self.bus.read32(Region::Tcdm, tcdm::DDR_FREQUENCY)
    }

    fn current_opp_code(&self, field: usize) -> u8 {
        self.link().reader(MailboxId::MB1).read8(field)
    }
}

fn check_applied(requested: u8, applied: u8) -> Result<(), PrcmuError> {
    if applied != requested {
        error!("{}: firmware applied OPP {applied:#x}, requested {requested:#x}", MailboxId::MB1);
        return Err(PrcmuError::ValueMismatch {
            mailbox: MailboxId::MB1,
            expected: requested,
            received: applied,
        });
    }
    Ok(())
}
