//! Request issue and acknowledge validation
//!
//! A [`Transaction`] is the RAII form of a channel's transaction lock: the
//! lock is taken by [`Channel::begin`] and released when the transaction is
//! dropped, on every exit path. Sending through it follows the doorbell
//! protocol described in the [module docs](super).

use core::ops::{Deref, DerefMut};

use log::error;

use super::{AckFrame, Channel, MailboxError, MailboxId, Protocol};
use crate::drivers::bus::{Bus, Region};
use crate::drivers::prcmu::regs::{prcm, RC_SUCCESS};
use crate::platform::Platform;
use crate::sync::poll::wait_until;

/// Hardware path shared by all channels
pub struct Link<'a, B: ?Sized, P: ?Sized> {
    pub bus: &'a B,
    pub platform: &'a P,
    /// Bound on waiting for the firmware to drain the previous request
    pub doorbell_timeout_us: u64,
}

impl<'a, B: Bus + ?Sized, P: Platform + ?Sized> Link<'a, B, P> {
    /// Spin until the firmware has consumed the previous request.
    pub fn wait_doorbell_clear(&self, mailbox: MailboxId) -> Result<(), MailboxError> {
        wait_until(self.platform, self.doorbell_timeout_us, || {
            self.bus.read32(Region::Prcm, prcm::MBOX_CPU_VAL) & mailbox.bit() == 0
        })
        .map_err(|_| {
            error!("{mailbox}: doorbell still pending after {}us", self.doorbell_timeout_us);
            MailboxError::DoorbellTimeout(mailbox)
        })
    }

    /// Write the request header and set the doorbell bit.
    pub fn ring(&self, mailbox: MailboxId, header: u8) {
        self.bus.write8(Region::Tcdm, mailbox.req_header(), header);
        self.bus.write32(Region::Prcm, prcm::MBOX_CPU_SET, mailbox.bit());
    }

    /// Field writer for the mailbox's request region.
    pub fn writer(&self, mailbox: MailboxId) -> RequestWriter<'a, B> {
        RequestWriter {
            bus: self.bus,
            base: mailbox.req_base(),
        }
    }

    /// Field reader for the mailbox's acknowledge region.
    pub fn reader(&self, mailbox: MailboxId) -> AckReader<'a, B> {
        AckReader::new(self.bus, mailbox)
    }
}

/// Writes request fields relative to a mailbox request region
pub struct RequestWriter<'a, B: ?Sized> {
    bus: &'a B,
    base: usize,
}

impl<B: Bus + ?Sized> RequestWriter<'_, B> {
    pub fn write8(&self, field: usize, value: u8) {
        self.bus.write8(Region::Tcdm, self.base + field, value);
    }

    pub fn write16(&self, field: usize, value: u16) {
        self.bus.write16(Region::Tcdm, self.base + field, value);
    }

    pub fn write32(&self, field: usize, value: u32) {
        self.bus.write32(Region::Tcdm, self.base + field, value);
    }

    pub fn write_bytes(&self, field: usize, data: &[u8]) {
        self.bus.write_bytes(Region::Tcdm, self.base + field, data);
    }
}

/// Reads acknowledge fields relative to a mailbox acknowledge region
pub struct AckReader<'a, B: ?Sized> {
    bus: &'a B,
    mailbox: MailboxId,
}

impl<'a, B: Bus + ?Sized> AckReader<'a, B> {
    pub fn new(bus: &'a B, mailbox: MailboxId) -> Self {
        Self { bus, mailbox }
    }

    /// Acknowledge header byte written by the firmware
    pub fn header(&self) -> u8 {
        self.bus.read8(Region::Tcdm, self.mailbox.ack_header())
    }

    pub fn read8(&self, field: usize) -> u8 {
        self.bus.read8(Region::Tcdm, self.mailbox.ack_base() + field)
    }

    pub fn read16(&self, field: usize) -> u16 {
        self.bus.read16(Region::Tcdm, self.mailbox.ack_base() + field)
    }

    pub fn read32(&self, field: usize) -> u32 {
        self.bus.read32(Region::Tcdm, self.mailbox.ack_base() + field)
    }

    pub fn read_bytes(&self, field: usize, buf: &mut [u8]) {
        self.bus
            .read_bytes(Region::Tcdm, self.mailbox.ack_base() + field, buf);
    }
}

/// What a waiting transaction accepts as success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expect {
    pub header: u8,
    /// `None` when the acknowledge carries no status
    pub status: Option<u8>,
}

impl Expect {
    /// Header match only
    pub const fn header(header: u8) -> Self {
        Self {
            header,
            status: None,
        }
    }

    /// Header match and `RC_SUCCESS` status
    pub const fn success(header: u8) -> Self {
        Self {
            header,
            status: Some(RC_SUCCESS),
        }
    }

    pub const fn with_status(self, status: u8) -> Self {
        Self {
            header: self.header,
            status: Some(status),
        }
    }

    /// Check a delivered acknowledge against this expectation.
    pub fn validate<A: AckFrame>(&self, mailbox: MailboxId, ack: A) -> Result<A, MailboxError> {
        if ack.header() != self.header {
            error!(
                "{mailbox}: unexpected acknowledge header {:#x} (expected {:#x})",
                ack.header(),
                self.header
            );
            return Err(MailboxError::UnexpectedHeader {
                mailbox,
                expected: self.header,
                received: ack.header(),
            });
        }

        if let Some(expected) = self.status {
            if ack.status() != expected {
                error!(
                    "{mailbox}: header {:#x} failed with status {:#x} (expected {:#x})",
                    self.header,
                    ack.status(),
                    expected
                );
                return Err(MailboxError::Status {
                    mailbox,
                    expected,
                    received: ack.status(),
                });
            }
        }

        Ok(ack)
    }
}

/// Exclusive use of one channel
///
/// Derefs to the channel's persistent request state.
pub struct Transaction<'a, M: Protocol> {
    pub(super) channel: &'a Channel<M>,
    pub(super) state: spin::MutexGuard<'a, M::Request>,
}

impl<M: Protocol> Transaction<'_, M> {
    /// Issue a request and wait for its acknowledge.
    ///
    /// `fill` writes the request fields; it runs after the doorbell is
    /// known to be clear and before the header is written.
    pub fn send<B, P, F>(
        &mut self,
        link: &Link<'_, B, P>,
        header: u8,
        expect: Expect,
        timeout_us: u64,
        fill: F,
    ) -> Result<M::Ack, MailboxError>
    where
        B: Bus + ?Sized,
        P: Platform + ?Sized,
        F: FnOnce(&RequestWriter<'_, B>, &mut M::Request),
    {
        link.wait_doorbell_clear(M::ID)?;
        fill(&link.writer(M::ID), &mut self.state);

        // Armed before the doorbell so an immediate acknowledge is not lost
        self.channel.done.arm();
        link.ring(M::ID, header);

        if !self.channel.done.wait_timeout(link.platform, timeout_us) {
            error!("{}: no acknowledge for header {header:#x} within {timeout_us}us", M::ID);
            return Err(MailboxError::Timeout(M::ID));
        }

        expect.validate(M::ID, self.channel.last_ack())
    }

    /// Issue a request the firmware does not acknowledge.
    pub fn post<B, P, F>(&mut self, link: &Link<'_, B, P>, header: u8, fill: F) -> Result<(), MailboxError>
    where
        B: Bus + ?Sized,
        P: Platform + ?Sized,
        F: FnOnce(&RequestWriter<'_, B>, &mut M::Request),
    {
        link.wait_doorbell_clear(M::ID)?;
        fill(&link.writer(M::ID), &mut self.state);
        link.ring(M::ID, header);
        Ok(())
    }
}

impl<M: Protocol> Deref for Transaction<'_, M> {
    type Target = M::Request;

    fn deref(&self) -> &M::Request {
        &self.state
    }
}

impl<M: Protocol> DerefMut for Transaction<'_, M> {
    fn deref_mut(&mut self) -> &mut M::Request {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SimBus, StdPlatform};

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    struct TestAck {
        header: u8,
        status: u8,
    }

    impl AckFrame for TestAck {
        fn header(&self) -> u8 {
            self.header
        }

        fn status(&self) -> u8 {
            self.status
        }
    }

    #[test]
    fn test_expect_header_mismatch() {
        let ack = TestAck { header: 3, status: 0 };
        let err = Expect::success(2).validate(MailboxId::MB2, ack).unwrap_err();
        assert_eq!(
            err,
            MailboxError::UnexpectedHeader {
                mailbox: MailboxId::MB2,
                expected: 2,
                received: 3
            }
        );
    }

    #[test]
    fn test_expect_status() {
        let ack = TestAck { header: 1, status: 1 };
        assert!(Expect::header(1).validate(MailboxId::MB1, ack).is_ok());
        assert!(matches!(
            Expect::success(1).validate(MailboxId::MB1, ack),
            Err(MailboxError::Status { received: 1, .. })
        ));
        assert!(Expect::header(1)
            .with_status(1)
            .validate(MailboxId::MB1, ack)
            .is_ok());
    }

    #[test]
    fn test_ring_writes_header_then_doorbell() {
        let bus = SimBus::new();
        let platform = StdPlatform::new();
        let link = Link {
            bus: &bus,
            platform: &platform,
            doorbell_timeout_us: 1_000,
        };

        link.writer(MailboxId::MB5).write8(2, 0x42);
        link.ring(MailboxId::MB5, 0x7);

        assert_eq!(bus.tcdm_read8(MailboxId::MB5.req_base() + 2), 0x42);
        assert_eq!(bus.tcdm_read8(MailboxId::MB5.req_header()), 0x7);
        assert_eq!(bus.read32(Region::Prcm, prcm::MBOX_CPU_VAL), MailboxId::MB5.bit());
        assert_eq!(bus.ring_count(MailboxId::MB5), 1);
    }

    #[test]
    fn test_doorbell_timeout() {
        let bus = SimBus::new();
        let platform = StdPlatform::new();
        let link = Link {
            bus: &bus,
            platform: &platform,
            doorbell_timeout_us: 2_000,
        };

        link.ring(MailboxId::MB3, 1);
        assert_eq!(
            link.wait_doorbell_clear(MailboxId::MB3),
            Err(MailboxError::DoorbellTimeout(MailboxId::MB3))
        );
        assert_eq!(link.wait_doorbell_clear(MailboxId::MB4), Ok(()));

        bus.clear_pending(MailboxId::MB3);
        assert_eq!(link.wait_doorbell_clear(MailboxId::MB3), Ok(()));
    }
}
