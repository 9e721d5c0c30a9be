//! PRCMU register and shared-memory access
//!
//! All hardware access goes through the [`Bus`] trait so the protocol code
//! is independent of how the regions are reached. [`MmioBus`] is the
//! bare-metal implementation over memory-mapped addresses.

use volatile::Volatile;

/// Address region an offset refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// PRCM register block
    Prcm,
    /// Shared data memory holding the mailboxes
    Tcdm,
    /// Firmware program memory (version words)
    Tcpm,
}

/// Byte/halfword/word access to the PRCMU regions.
///
/// Multi-byte values are little-endian. Implementations must not block:
/// the interrupt dispatcher uses this trait.
pub trait Bus: Send + Sync {
    fn read8(&self, region: Region, offset: usize) -> u8;
    fn read16(&self, region: Region, offset: usize) -> u16;
    fn read32(&self, region: Region, offset: usize) -> u32;
    fn write8(&self, region: Region, offset: usize, value: u8);
    fn write16(&self, region: Region, offset: usize, value: u16);
    fn write32(&self, region: Region, offset: usize, value: u32);

    /// Copy `buf.len()` bytes starting at `offset` into `buf`.
    fn read_bytes(&self, region: Region, offset: usize, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read8(region, offset + i);
        }
    }

    /// Copy `data` to `offset`.
    fn write_bytes(&self, region: Region, offset: usize, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.write8(region, offset + i, byte);
        }
    }
}

/// Memory-mapped PRCMU regions
pub struct MmioBus {
    prcm_base: usize,
    tcdm_base: usize,
    tcpm_base: usize,
}

impl MmioBus {
    /// Create a bus over already-mapped regions.
    ///
    /// # Safety
    ///
    /// Each base must be the virtual address of the corresponding region,
    /// mapped as device memory for the lifetime of the returned value, and
    /// not accessed through any other path that assumes exclusive use.
    pub const unsafe fn new(prcm_base: usize, tcdm_base: usize, tcpm_base: usize) -> Self {
        Self {
            prcm_base,
            tcdm_base,
            tcpm_base,
        }
    }

    #[inline]
    fn addr(&self, region: Region, offset: usize) -> usize {
        let base = match region {
            Region::Prcm => self.prcm_base,
            Region::Tcdm => self.tcdm_base,
            Region::Tcpm => self.tcpm_base,
        };
        base + offset
    }

    #[inline]
    fn read<T: Copy>(&self, region: Region, offset: usize) -> T {
        // SAFETY: The address lies in a region mapped per `new`'s contract;
        // Volatile<T> is a transparent wrapper so the cast keeps the layout.
        let reg = unsafe { &*(self.addr(region, offset) as *const Volatile<T>) };
        reg.read()
    }

    #[inline]
    fn write<T: Copy>(&self, region: Region, offset: usize, value: T) {
        barrier();
        // SAFETY: See `read`. Device memory has no Rust-visible aliases.
        let reg = unsafe { &mut *(self.addr(region, offset) as *mut Volatile<T>) };
        reg.write(value);
    }
}

impl Bus for MmioBus {
    fn read8(&self, region: Region, offset: usize) -> u8 {
        self.read(region, offset)
    }

    fn read16(&self, region: Region, offset: usize) -> u16 {
        u16::from_le(self.read(region, offset))
    }

    fn read32(&self, region: Region, offset: usize) -> u32 {
        u32::from_le(self.read(region, offset))
    }

    fn write8(&self, region: Region, offset: usize, value: u8) {
        self.write(region, offset, value);
    }

    fn write16(&self, region: Region, offset: usize, value: u16) {
        self.write(region, offset, value.to_le());
    }

    fn write32(&self, region: Region, offset: usize, value: u32) {
        self.write(region, offset, value.to_le());
    }
}

/// Order shared-memory writes before the doorbell write that follows them.
#[inline]
fn barrier() {
    #[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
    // SAFETY: DMB has no side effects besides ordering memory accesses
    unsafe {
        core::arch::asm!("dmb sy", options(nostack));
    }

    #[cfg(not(any(target_arch = "aarch64", target_arch = "arm")))]
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}
