use core::fmt;

use crate::drivers::mailbox::{MailboxError, MailboxId};

/// PRCMU operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrcmuError {
    /// Underlying mailbox transaction failed
    Mailbox(MailboxError),
    /// Acknowledge succeeded but reports a different value than requested
    ValueMismatch {
        mailbox: MailboxId,
        expected: u8,
        received: u8,
    },
    /// The firmware held the PRCM hardware semaphore past the bound
    HwSemaphoreTimeout,
    /// Rejected before any hardware access
    InvalidArgument(&'static str),
    /// Not available on this silicon revision
    NotSupported,
    /// One-time configuration already done
    AlreadyConfigured,
}

impl PrcmuError {
    /// The request reached the firmware and failed (timeout or protocol
    /// mismatch).
    pub fn is_transaction_failure(&self) -> bool {
        matches!(self, Self::Mailbox(_) | Self::ValueMismatch { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Mailbox(MailboxError::Timeout(_) | MailboxError::DoorbellTimeout(_))
                | Self::HwSemaphoreTimeout
        )
    }
}

impl From<MailboxError> for PrcmuError {
    fn from(err: MailboxError) -> Self {
        Self::Mailbox(err)
    }
}

impl fmt::Display for PrcmuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mailbox(err) => err.fmt(f),
            Self::ValueMismatch {
                mailbox,
                expected,
                received,
            } => write!(f, "{mailbox}: firmware applied {received:#x}, requested {expected:#x}"),
            Self::HwSemaphoreTimeout => f.write_str("PRCM hardware semaphore timeout"),
            Self::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Self::NotSupported => f.write_str("not supported on this silicon"),
            Self::AlreadyConfigured => f.write_str("already configured"),
        }
    }
}
