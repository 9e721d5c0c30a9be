//! Host-side simulation used by the unit tests
//!
//! - [`SimBus`]: PRCM register file plus TCDM/TCPM memories, with the
//!   write-one-to-set doorbell and write-one-to-clear interrupt registers
//!   behaving like the hardware.
//! - [`StdPlatform`]: wall clock and yield-based relax.
//! - [`FakeFirmware`]: thread consuming doorbells and answering them with
//!   scripted [`Reply`]s, raising the acknowledge interrupt by calling the
//!   dispatcher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::PrcmuConfig;
use crate::drivers::bus::{Bus, Region};
use crate::drivers::mailbox::MailboxId;
use crate::drivers::prcmu::regs::{self, mb0, prcm, tcpm, NUM_MAILBOXES};
use crate::drivers::prcmu::Prcmu;
use crate::platform::Platform;

const MEM_SIZE: usize = 0x1000;

struct SimState {
    prcm: HashMap<usize, u32>,
    tcdm: Vec<u8>,
    tcpm: Vec<u8>,
    rings: [usize; NUM_MAILBOXES],
}

impl SimState {
    fn prcm_word(&self, offset: usize) -> u32 {
        self.prcm.get(&offset).copied().unwrap_or(0)
    }

    fn mem(&mut self, region: Region) -> &mut Vec<u8> {
        match region {
            Region::Tcdm => &mut self.tcdm,
            Region::Tcpm => &mut self.tcpm,
            Region::Prcm => unreachable!("PRCM is a register file"),
        }
    }

    fn read(&mut self, region: Region, offset: usize, len: usize) -> u32 {
        if region == Region::Prcm {
            let shift = (offset & 3) * 8;
            return self.prcm_word(offset & !3) >> shift;
        }
        let mem = self.mem(region);
        (0..len).fold(0, |acc, i| acc | (mem[offset + i] as u32) << (8 * i))
    }

    fn write(&mut self, region: Region, offset: usize, len: usize, value: u32) {
        if region == Region::Prcm {
            return self.write_prcm(offset, len, value);
        }
        let mem = self.mem(region);
        for i in 0..len {
            mem[offset + i] = (value >> (8 * i)) as u8;
        }
    }

    fn write_prcm(&mut self, offset: usize, len: usize, value: u32) {
        match offset {
            prcm::MBOX_CPU_SET => {
                for (mailbox, rings) in self.rings.iter_mut().enumerate() {
                    if value & (1 << mailbox) != 0 {
                        *rings += 1;
                    }
                }
                *self.prcm.entry(prcm::MBOX_CPU_VAL).or_default() |= value;
            }
            prcm::ARM_IT1_CLEAR => {
                *self.prcm.entry(prcm::ARM_IT1_VAL).or_default() &= !value;
            }
            _ => {
                let word = offset & !3;
                let shift = (offset & 3) * 8;
                let mask = if len == 4 { u32::MAX } else { ((1u32 << (8 * len)) - 1) << shift };
                let old = self.prcm_word(word);
                self.prcm.insert(word, (old & !mask) | ((value << shift) & mask));
            }
        }
    }
}

/// Simulated PRCMU regions
#[derive(Clone)]
pub struct SimBus {
    state: Arc<Mutex<SimState>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                prcm: HashMap::new(),
                tcdm: vec![0; MEM_SIZE],
                tcpm: vec![0; MEM_SIZE],
                rings: [0; NUM_MAILBOXES],
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SimState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn tcdm_read8(&self, offset: usize) -> u8 {
        self.read8(Region::Tcdm, offset)
    }

    pub fn tcdm_read16(&self, offset: usize) -> u16 {
        self.read16(Region::Tcdm, offset)
    }

    pub fn tcdm_read32(&self, offset: usize) -> u32 {
        self.read32(Region::Tcdm, offset)
    }

    pub fn tcdm_write8(&self, offset: usize, value: u8) {
        self.write8(Region::Tcdm, offset, value);
    }

    pub fn tcdm_write16(&self, offset: usize, value: u16) {
        self.write16(Region::Tcdm, offset, value);
    }

    pub fn tcdm_write32(&self, offset: usize, value: u32) {
        self.write32(Region::Tcdm, offset, value);
    }

    pub fn tcpm_write32(&self, offset: usize, value: u32) {
        self.write32(Region::Tcpm, offset, value);
    }

    /// Raw register read, no side effects
    pub fn prcm_read(&self, offset: usize) -> u32 {
        self.with(|s| s.prcm_word(offset))
    }

    /// Raw register write, bypassing set/clear semantics
    pub fn prcm_write(&self, offset: usize, value: u32) {
        self.with(|s| {
            s.prcm.insert(offset, value);
        });
    }

    /// Doorbells the firmware has not consumed yet
    pub fn pending_doorbells(&self) -> u32 {
        self.prcm_read(prcm::MBOX_CPU_VAL)
    }

    /// Firmware side: consume a doorbell.
    pub fn clear_pending(&self, mailbox: MailboxId) {
        self.with(|s| {
            *s.prcm.entry(prcm::MBOX_CPU_VAL).or_default() &= !mailbox.bit();
        });
    }

    /// Number of times the doorbell of `mailbox` was rung
    pub fn ring_count(&self, mailbox: MailboxId) -> usize {
        self.with(|s| s.rings[mailbox.index()])
    }

    pub fn set_pending_acks(&self, bits: u32) {
        self.prcm_write(prcm::ARM_IT1_VAL, bits);
    }

    /// Firmware side: raise the acknowledge interrupt of `mailbox`.
    pub fn raise(&self, mailbox: MailboxId) {
        self.with(|s| {
            *s.prcm.entry(prcm::ARM_IT1_VAL).or_default() |= mailbox.bit();
        });
    }

    /// Firmware side: publish a wake-up in the buffer picked by
    /// `read_pointer` and raise mailbox 0.
    pub fn post_wakeup(&self, read_pointer: u8, events: u32) {
        let base = MailboxId::MB0.ack_base();
        let field = if read_pointer & 1 != 0 {
            mb0::ack::WAKEUP_1_DBB
        } else {
            mb0::ack::WAKEUP_0_DBB
        };
        self.tcdm_write8(base + mb0::ack::READ_POINTER, read_pointer);
        self.tcdm_write32(base + field, events);
        self.tcdm_write8(MailboxId::MB0.ack_header(), mb0::header::WAKE_UP);
        self.raise(MailboxId::MB0);
    }
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimBus {
    fn read8(&self, region: Region, offset: usize) -> u8 {
        self.with(|s| s.read(region, offset, 1) as u8)
    }

    fn read16(&self, region: Region, offset: usize) -> u16 {
        self.with(|s| s.read(region, offset, 2) as u16)
    }

    fn read32(&self, region: Region, offset: usize) -> u32 {
        self.with(|s| s.read(region, offset, 4))
    }

    fn write8(&self, region: Region, offset: usize, value: u8) {
        self.with(|s| s.write(region, offset, 1, value as u32));
    }

    fn write16(&self, region: Region, offset: usize, value: u16) {
        self.with(|s| s.write(region, offset, 2, value as u32));
    }

    fn write32(&self, region: Region, offset: usize, value: u32) {
        self.with(|s| s.write(region, offset, 4, value));
    }
}

/// Hosted platform
pub struct StdPlatform {
    epoch: Instant,
    deferred: AtomicUsize,
}

impl StdPlatform {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            deferred: AtomicUsize::new(0),
        }
    }

    /// Number of `schedule_deferred` calls
    pub fn deferred_requests(&self) -> usize {
        self.deferred.load(Ordering::SeqCst)
    }
}

impl Default for StdPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for StdPlatform {
    fn timestamp_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    fn relax(&self) {
        thread::yield_now();
    }

    fn schedule_deferred(&self) {
        self.deferred.fetch_add(1, Ordering::SeqCst);
    }
}

/// One scripted acknowledge
pub struct Reply {
    header: u8,
    after: Duration,
    fields: Vec<(usize, u8)>,
}

impl Reply {
    pub fn now(header: u8) -> Self {
        Self::after(header, Duration::ZERO)
    }

    pub fn after(header: u8, after: Duration) -> Self {
        Self {
            header,
            after,
            fields: Vec::new(),
        }
    }

    /// Set an acknowledge field (offset in the acknowledge region).
    pub fn with(mut self, field: usize, value: u8) -> Self {
        self.fields.push((field, value));
        self
    }

    fn post(&self, bus: &SimBus, mailbox: MailboxId) {
        for &(field, value) in &self.fields {
            bus.tcdm_write8(mailbox.ack_base() + field, value);
        }
        bus.tcdm_write8(mailbox.ack_header(), self.header);
        bus.raise(mailbox);
    }
}

pub type SimPrcmu = Prcmu<SimBus, StdPlatform>;

/// Firmware thread answering doorbells
///
/// The responder sees each rung doorbell once, with the request header, and
/// returns the replies to deliver. Replies are delivered in order once due.
pub struct FakeFirmware {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl FakeFirmware {
    pub fn start<F>(prcmu: Arc<SimPrcmu>, mut responder: F) -> Self
    where
        F: FnMut(&SimBus, MailboxId, u8) -> Vec<Reply> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stopped = Arc::clone(&stop);

        let thread = thread::spawn(move || {
            let bus = prcmu.bus().clone();
            let mut queue: Vec<(Instant, MailboxId, Reply)> = Vec::new();

            while !stopped.load(Ordering::SeqCst) {
                let pending = bus.pending_doorbells();
                for mailbox in MailboxId::ALL {
                    if pending & mailbox.bit() == 0 {
                        continue;
                    }
                    let header = bus.tcdm_read8(mailbox.req_header());
                    let now = Instant::now();
                    for reply in responder(&bus, mailbox, header) {
                        queue.push((now + reply.after, mailbox, reply));
                    }
                    bus.clear_pending(mailbox);
                }

                let now = Instant::now();
                while let Some(pos) = queue.iter().position(|(due, _, _)| *due <= now) {
                    let (_, mailbox, reply) = queue.remove(pos);
                    reply.post(&bus, mailbox);
                    prcmu.handle_interrupt();
                }

                thread::sleep(Duration::from_micros(100));
            }
        });

        Self {
            stop,
            thread: Some(thread),
        }
    }
}

impl Drop for FakeFirmware {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Short timeouts for tests
pub fn config() -> PrcmuConfig {
    PrcmuConfig {
        ack_timeout_us: 200_000,
        sysclk_timeout_us: 2_000_000,
        abb_timeout_us: 200_000,
        doorbell_timeout_us: 50_000,
        hwsem_timeout_us: 50_000,
        ..PrcmuConfig::new(160)
    }
}

/// Version words of a V2 board
pub fn set_v2_firmware(bus: &SimBus) {
    bus.tcpm_write32(tcpm::FW_VERSION, 0x2000_0015);
    bus.tcpm_write32(tcpm::FW_VERSION + 4, 0x0000_0003);
}

/// Driver over an existing bus
pub fn prcmu_on(bus: &SimBus) -> Arc<SimPrcmu> {
    Arc::new(Prcmu::new(bus.clone(), StdPlatform::new(), config()))
}

/// Driver on a fresh V2 bus with no firmware running
pub fn prcmu() -> (Arc<SimPrcmu>, SimBus) {
    let bus = SimBus::new();
    set_v2_firmware(&bus);
    (prcmu_on(&bus), bus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doorbell_and_interrupt_registers() {
        let bus = SimBus::new();
        bus.write32(Region::Prcm, prcm::MBOX_CPU_SET, MailboxId::MB2.bit());
        bus.write32(Region::Prcm, prcm::MBOX_CPU_SET, MailboxId::MB4.bit());
        assert_eq!(
            bus.read32(Region::Prcm, prcm::MBOX_CPU_VAL),
            MailboxId::MB2.bit() | MailboxId::MB4.bit()
        );
        assert_eq!(bus.ring_count(MailboxId::MB2), 1);

        bus.set_pending_acks(regs::ALL_MBOX_BITS);
        bus.write32(Region::Prcm, prcm::ARM_IT1_CLEAR, MailboxId::MB0.bit());
        assert_eq!(
            bus.read32(Region::Prcm, prcm::ARM_IT1_VAL),
            regs::ALL_MBOX_BITS & !MailboxId::MB0.bit()
        );
    }

    #[test]
    fn test_little_endian_memory() {
        let bus = SimBus::new();
        bus.tcdm_write32(0x10, 0x1122_3344);
        assert_eq!(bus.tcdm_read8(0x10), 0x44);
        assert_eq!(bus.tcdm_read16(0x12), 0x1122);

        bus.write8(Region::Prcm, prcm::DDR_SUBSYS_APE_MINBW, 0x01);
        assert_eq!(bus.read8(Region::Prcm, prcm::DDR_SUBSYS_APE_MINBW), 0x01);
    }
}
