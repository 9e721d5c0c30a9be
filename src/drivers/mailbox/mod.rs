//! PRCMU mailbox channels
//!
//! The PRCMU firmware exposes eight mailboxes in shared TCDM memory. Each
//! mailbox has a request region, an acknowledge region, one request header
//! byte, one acknowledge header byte and one doorbell bit.
//!
//! # Protocol
//!
//! 1. Take the channel's transaction lock
//! 2. Wait for the doorbell bit to clear (firmware drained the last request)
//! 3. Write the request fields, then the request header
//! 4. Set the doorbell bit
//! 5. Wait for the dispatcher to deliver the acknowledge
//! 6. Validate acknowledge header and status
//!
//! Mailbox 0 is special: requests on it are never answered, and its
//! acknowledge interrupt only carries asynchronous wake-up events.

pub mod channel;
pub mod transaction;

use core::fmt;

use crate::drivers::bus::Bus;
use crate::drivers::prcmu::regs::{self, NUM_MAILBOXES};

pub use channel::{Channel, Delivery};
pub use transaction::{AckReader, Expect, Link, RequestWriter, Transaction};

/// Mailbox index 0-7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MailboxId(u8);

impl MailboxId {
    pub const MB0: Self = Self(0);
    pub const MB1: Self = Self(1);
    pub const MB2: Self = Self(2);
    pub const MB3: Self = Self(3);
    pub const MB4: Self = Self(4);
    pub const MB5: Self = Self(5);
    pub const MB6: Self = Self(6);
    pub const MB7: Self = Self(7);

    /// All mailboxes in dispatch order
    pub const ALL: [Self; NUM_MAILBOXES] = [
        Self::MB0,
        Self::MB1,
        Self::MB2,
        Self::MB3,
        Self::MB4,
        Self::MB5,
        Self::MB6,
        Self::MB7,
    ];

    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < NUM_MAILBOXES {
            Some(Self(index))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Doorbell (and acknowledge interrupt) bit
    #[inline]
    pub const fn bit(self) -> u32 {
        1 << self.0
    }

    /// TCDM offset of the request header byte
    #[inline]
    pub const fn req_header(self) -> usize {
        regs::tcdm::REQ_HEADER + self.index()
    }

    /// TCDM offset of the acknowledge header byte
    #[inline]
    pub const fn ack_header(self) -> usize {
        regs::tcdm::ACK_HEADER + self.index()
    }

    /// TCDM offset of the request region
    #[inline]
    pub const fn req_base(self) -> usize {
        regs::tcdm::REQ_MB[self.index()]
    }

    /// TCDM offset of the acknowledge region
    #[inline]
    pub const fn ack_base(self) -> usize {
        regs::tcdm::ACK_MB[self.index()]
    }
}

impl fmt::Display for MailboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mailbox {}", self.0)
    }
}

/// Transaction engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxError {
    /// Firmware never cleared the doorbell of the previous request
    DoorbellTimeout(MailboxId),
    /// No acknowledge within the bound
    Timeout(MailboxId),
    /// Acknowledge header does not belong to the request
    UnexpectedHeader {
        mailbox: MailboxId,
        expected: u8,
        received: u8,
    },
    /// Acknowledge reports a failure status
    Status {
        mailbox: MailboxId,
        expected: u8,
        received: u8,
    },
}

impl MailboxError {
    pub fn mailbox(&self) -> MailboxId {
        match *self {
            Self::DoorbellTimeout(mailbox) | Self::Timeout(mailbox) => mailbox,
            Self::UnexpectedHeader { mailbox, .. } | Self::Status { mailbox, .. } => mailbox,
        }
    }

    /// Acknowledge arrived but disagreed with the request
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::UnexpectedHeader { .. } | Self::Status { .. })
    }
}

impl fmt::Display for MailboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoorbellTimeout(mb) => write!(f, "{mb}: doorbell never cleared"),
            Self::Timeout(mb) => write!(f, "{mb}: no acknowledge"),
            Self::UnexpectedHeader {
                mailbox,
                expected,
                received,
            } => write!(
                f,
                "{mailbox}: acknowledge header {received:#x}, expected {expected:#x}"
            ),
            Self::Status {
                mailbox,
                expected,
                received,
            } => write!(
                f,
                "{mailbox}: acknowledge status {received:#x}, expected {expected:#x}"
            ),
        }
    }
}

/// Decoded acknowledge of one mailbox
pub trait AckFrame: Copy + Default + Send {
    /// Header the acknowledge was decoded for
    fn header(&self) -> u8;

    /// Status to validate against [`Expect::status`]
    fn status(&self) -> u8;
}

/// Message layout of one answered mailbox (1-7).
///
/// Ties the channel index to its caller-side request state and to the
/// acknowledge decoder the dispatcher runs in interrupt context.
pub trait Protocol {
    const ID: MailboxId;

    /// State that must persist between requests, guarded by the channel's
    /// transaction lock.
    type Request: Default + Send;

    type Ack: AckFrame;

    /// Decode the acknowledge for `header`, or `None` if the header is not
    /// one this mailbox answers with. Runs in interrupt context.
    fn decode<B: Bus + ?Sized>(ack: &AckReader<'_, B>, header: u8) -> Option<Self::Ack>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_id_layout() {
        assert_eq!(MailboxId::MB0.bit(), 0x01);
        assert_eq!(MailboxId::MB7.bit(), 0x80);
        assert_eq!(MailboxId::MB0.req_header(), 0xFE8);
        assert_eq!(MailboxId::MB3.ack_header(), 0xFF3);
        assert_eq!(MailboxId::MB5.req_base(), 0xF90);
        assert_eq!(MailboxId::MB1.ack_base(), 0xF30);
    }

    #[test]
    fn test_mailbox_id_range() {
        assert_eq!(MailboxId::new(7), Some(MailboxId::MB7));
        assert_eq!(MailboxId::new(8), None);
    }

    #[test]
    fn test_error_classification() {
        assert!(!MailboxError::Timeout(MailboxId::MB1).is_protocol());
        let err = MailboxError::Status {
            mailbox: MailboxId::MB4,
            expected: 0,
            received: 1,
        };
        assert!(err.is_protocol());
        assert_eq!(err.mailbox(), MailboxId::MB4);
    }
}
