//! Message layouts of the answered mailboxes (1-5)
//!
//! Each marker type binds a mailbox index to its acknowledge decoder. The
//! decoders run in interrupt context and only read the acknowledge region.

use crate::drivers::bus::Bus;
use crate::drivers::mailbox::{AckFrame, AckReader, MailboxId, Protocol};

use super::regs::{mb1, mb2, mb3, mb4, mb5};

/// Header plus one status byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusAck {
    pub header: u8,
    pub status: u8,
}

impl AckFrame for StatusAck {
    fn header(&self) -> u8 {
        self.header
    }

    fn status(&self) -> u8 {
        self.status
    }
}

/// Mailbox 1: ARM/APE operating points
pub struct Opp;

/// Last operating points requested on mailbox 1
#[derive(Debug, Clone, Copy, Default)]
pub struct OppRequest {
    pub arm: u8,
    pub ape: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OppAck {
    pub header: u8,
    pub arm_opp: u8,
    pub ape_opp: u8,
    pub arm_voltage_st: u8,
    pub ape_voltage_st: u8,
}

impl AckFrame for OppAck {
    fn header(&self) -> u8 {
        self.header
    }

    /// Voltage status of the domain the request addressed
    fn status(&self) -> u8 {
        match self.header {
            mb1::header::ARM_OPP => self.arm_voltage_st,
            _ => self.ape_voltage_st,
        }
    }
}

impl Protocol for Opp {
    const ID: MailboxId = MailboxId::MB1;
    type Request = OppRequest;
    type Ack = OppAck;

    fn decode<B: Bus + ?Sized>(ack: &AckReader<'_, B>, header: u8) -> Option<OppAck> {
        match header {
            mb1::header::ARM_OPP | mb1::header::APE_OPP | mb1::header::ARM_APE_OPP => Some(OppAck {
                header,
                arm_opp: ack.read8(mb1::ack::CURRENT_ARM_OPP),
                ape_opp: ack.read8(mb1::ack::CURRENT_APE_OPP),
                arm_voltage_st: ack.read8(mb1::ack::ARM_VOLT_STATUS),
                ape_voltage_st: ack.read8(mb1::ack::APE_VOLT_STATUS),
            }),
            _ => None,
        }
    }
}

/// Number of EPOD clients on mailbox 2
pub const NUM_EPOD: usize = 5;
/// Number of PLL clients on mailbox 2
pub const NUM_PLL: usize = 3;

/// Mailbox 2: EPODs, firmware-managed clocks and PLLs
pub struct Power;

/// Last state requested per PLL
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerRequest {
    pub pll: [u8; NUM_PLL],
}

impl Protocol for Power {
    const ID: MailboxId = MailboxId::MB2;
    type Request = PowerRequest;
    type Ack = StatusAck;

    fn decode<B: Bus + ?Sized>(ack: &AckReader<'_, B>, header: u8) -> Option<StatusAck> {
        let field = match header {
            mb2::header::EPOD_REQUEST => mb2::ack::EPOD_STATUS,
            mb2::header::CLK_REQUEST => mb2::ack::CLK_STATUS,
            mb2::header::PLL_REQUEST => mb2::ack::PLL_STATUS,
            _ => return None,
        };
        Some(StatusAck {
            header,
            status: ack.read8(field),
        })
    }
}

/// Mailbox 3: system reference clock
pub struct Sysclk;

impl Protocol for Sysclk {
    const ID: MailboxId = MailboxId::MB3;
    /// Last requested reference clock state
    type Request = u8;
    type Ack = StatusAck;

    fn decode<B: Bus + ?Sized>(ack: &AckReader<'_, B>, header: u8) -> Option<StatusAck> {
        (header == mb3::header::REFCLK_REQUEST).then(|| StatusAck {
            header,
            status: ack.read8(mb3::ack::REFCLK_REQ),
        })
    }
}

/// Mailbox 4: thermal supervision
pub struct Thermal;

impl Protocol for Thermal {
    const ID: MailboxId = MailboxId::MB4;
    type Request = ();
    type Ack = StatusAck;

    fn decode<B: Bus + ?Sized>(ack: &AckReader<'_, B>, header: u8) -> Option<StatusAck> {
        match header {
            mb4::ack_header::CFG_HOTDOG
            | mb4::ack_header::CFG_HOTMON
            | mb4::ack_header::CFG_HOTPERIOD => Some(StatusAck {
                header,
                status: ack.read8(mb4::ack::REQUESTS),
            }),
            _ => None,
        }
    }
}

/// Mailbox 5: I2C proxy to the analog baseband
pub struct AbbI2c;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct I2cAck {
    pub header: u8,
    pub status: u8,
    pub value: [u8; mb5::MAX_TRANSFER],
}

impl AckFrame for I2cAck {
    fn header(&self) -> u8 {
        self.header
    }

    fn status(&self) -> u8 {
        self.status
    }
}

impl Protocol for AbbI2c {
    const ID: MailboxId = MailboxId::MB5;
    type Request = ();
    type Ack = I2cAck;

    fn decode<B: Bus + ?Sized>(ack: &AckReader<'_, B>, header: u8) -> Option<I2cAck> {
        let mut frame = I2cAck {
            header,
            status: 0,
            value: [0; mb5::MAX_TRANSFER],
        };
        match header {
            mb5::header::I2C_READ => ack.read_bytes(mb5::ack::I2C_DATA, &mut frame.value),
            mb5::header::I2C_WRITE => {}
            _ => return None,
        }
        frame.status = ack.read8(mb5::ack::RETURN_CODE);
        Some(frame)
    }
}
