//! PRCMU wakeup bitmap translation
//!
//! The firmware reports and accepts wakeups as a 32-bit hardware bitmap.
//! Drivers name them either as an abstract PRCMU interrupt ([`PrcmuIrq`],
//! the contiguous interrupt range exposed to the kernel) or as a wakeup
//! source ([`WakeupSource`], what `enable_wakeups` accepts). Both are
//! translated through validated, array-backed tables built once.

use core::fmt::Debug;
use core::marker::PhantomData;

use bitflags::bitflags;
use lazy_static::lazy_static;

/// Hardware wakeup bits
pub mod wakeup_bit {
    pub const RTC: u32 = 1 << 0;
    pub const RTT0: u32 = 1 << 1;
    pub const RTT1: u32 = 1 << 2;
    pub const CD_IRQ: u32 = 1 << 3;
    pub const SRP_TIM: u32 = 1 << 4;
    pub const APE_REQ: u32 = 1 << 5;
    pub const USB: u32 = 1 << 6;
    pub const ABB: u32 = 1 << 7;
    pub const LOW_POWER_AUDIO: u32 = 1 << 8;
    pub const TEMP_SENSOR_LOW: u32 = 1 << 9;
    pub const ARM: u32 = 1 << 10;
    pub const AC_WAKE_ACK: u32 = 1 << 11;
    pub const TEMP_SENSOR_HIGH: u32 = 1 << 12;
    pub const MODEM_SW_RESET_REQ: u32 = 1 << 20;
    pub const GPIO0: u32 = 1 << 23;
    pub const GPIO1: u32 = 1 << 24;
    pub const GPIO2: u32 = 1 << 25;
    pub const GPIO3: u32 = 1 << 26;
    pub const GPIO4: u32 = 1 << 27;
    pub const GPIO5: u32 = 1 << 28;
    pub const GPIO6: u32 = 1 << 29;
    pub const GPIO7: u32 = 1 << 30;
    // Shares its bit with GPIO7
    pub const AC_REL_ACK: u32 = 1 << 30;
}

/// Size of the abstract PRCMU interrupt range
pub const NUM_PRCMU_WAKEUPS: usize = 23;

/// Number of wakeup sources accepted by `enable_wakeups`
pub const NUM_WAKEUP_SOURCES: usize = 7;

/// Dense index used to address a translation table
pub trait TableKey: Copy + Debug {
    fn index(self) -> usize;
}

/// Abstract PRCMU interrupt, offset from the configured IRQ base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrcmuIrq {
    Rtc = 0,
    Rtt0,
    Rtt1,
    CdIrq,
    SrpTim,
    ApeReq,
    Usb,
    Abb,
    LowPowerAudio,
    TempSensorLow,
    TempSensorHigh,
    Arm,
    AcWakeAck,
    ModemSwResetReq,
    Gpio0,
    Gpio1,
    Gpio2,
    Gpio3,
    Gpio4,
    Gpio5,
    Gpio6,
    Gpio7,
    AcRelAck,
}

impl PrcmuIrq {
    pub const ALL: [Self; NUM_PRCMU_WAKEUPS] = [
        Self::Rtc,
        Self::Rtt0,
        Self::Rtt1,
        Self::CdIrq,
        Self::SrpTim,
        Self::ApeReq,
        Self::Usb,
        Self::Abb,
        Self::LowPowerAudio,
        Self::TempSensorLow,
        Self::TempSensorHigh,
        Self::Arm,
        Self::AcWakeAck,
        Self::ModemSwResetReq,
        Self::Gpio0,
        Self::Gpio1,
        Self::Gpio2,
        Self::Gpio3,
        Self::Gpio4,
        Self::Gpio5,
        Self::Gpio6,
        Self::Gpio7,
        Self::AcRelAck,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Hardware wakeup bit of this interrupt
    pub fn wakeup_bit(self) -> u32 {
        IRQ_BITS.bit(self)
    }
}

impl TableKey for PrcmuIrq {
    fn index(self) -> usize {
        PrcmuIrq::index(self)
    }
}

/// Wakeup source accepted by `enable_wakeups`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WakeupSource {
    Rtc = 0,
    Rtt0,
    Rtt1,
    CdIrq,
    Usb,
    Abb,
    Arm,
}

impl WakeupSource {
    pub const ALL: [Self; NUM_WAKEUP_SOURCES] = [
        Self::Rtc,
        Self::Rtt0,
        Self::Rtt1,
        Self::CdIrq,
        Self::Usb,
        Self::Abb,
        Self::Arm,
    ];
}

impl TableKey for WakeupSource {
    fn index(self) -> usize {
        self as usize
    }
}

bitflags! {
    /// Set of wakeup sources, one flag per [`WakeupSource`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WakeupSet: u32 {
        const RTC = 1 << WakeupSource::Rtc as u32;
        const RTT0 = 1 << WakeupSource::Rtt0 as u32;
        const RTT1 = 1 << WakeupSource::Rtt1 as u32;
        const CD_IRQ = 1 << WakeupSource::CdIrq as u32;
        const USB = 1 << WakeupSource::Usb as u32;
        const ABB = 1 << WakeupSource::Abb as u32;
        const ARM = 1 << WakeupSource::Arm as u32;
    }
}

impl WakeupSet {
    pub fn sources(self) -> impl Iterator<Item = WakeupSource> {
        WakeupSource::ALL
            .into_iter()
            .filter(move |&source| self.contains(source.into()))
    }

    /// Hardware wakeup bitmap of the whole set
    pub fn hw_bits(self) -> u32 {
        WAKEUP_BITS.bits_of(self.sources())
    }
}

impl From<WakeupSource> for WakeupSet {
    fn from(source: WakeupSource) -> Self {
        Self::from_bits_retain(1 << source as u32)
    }
}

/// Key to hardware-bit table
///
/// Every key maps to exactly one hardware bit. Distinct keys may share a
/// bit (the hardware aliases some lines).
pub struct WakeupMap<K, const N: usize> {
    bits: [u32; N],
    _key: PhantomData<K>,
}

impl<K: TableKey, const N: usize> WakeupMap<K, N> {
    /// Build a table from `(key, bit)` pairs.
    ///
    /// # Panics
    ///
    /// If a key is out of range or listed twice, if a bit value is zero or
    /// has more than one bit set, or if any key is left without an entry.
    pub fn build(entries: &[(K, u32)]) -> Self {
        let mut bits = [0u32; N];

        for &(key, bit) in entries {
            let index = key.index();
            assert!(index < N, "wakeup table: {key:?} outside table of {N}");
            assert!(
                bit.count_ones() == 1,
                "wakeup table: {key:?} maps to {bit:#x}, expected a single bit"
            );
            assert!(bits[index] == 0, "wakeup table: {key:?} listed twice");
            bits[index] = bit;
        }

        if let Some(missing) = bits.iter().position(|&bit| bit == 0) {
            panic!("wakeup table: index {missing} has no entry");
        }

        Self {
            bits,
            _key: PhantomData,
        }
    }

    #[inline]
    pub fn bit(&self, key: K) -> u32 {
        self.bits[key.index()]
    }

    /// OR of the bits of every key
    pub fn bits_of<I: IntoIterator<Item = K>>(&self, keys: I) -> u32 {
        keys.into_iter().fold(0, |acc, key| acc | self.bit(key))
    }
}

lazy_static! {
    /// Abstract interrupt to hardware bit
    pub static ref IRQ_BITS: WakeupMap<PrcmuIrq, NUM_PRCMU_WAKEUPS> = WakeupMap::build(&[
        (PrcmuIrq::Rtc, wakeup_bit::RTC),
        (PrcmuIrq::Rtt0, wakeup_bit::RTT0),
        (PrcmuIrq::Rtt1, wakeup_bit::RTT1),
        (PrcmuIrq::CdIrq, wakeup_bit::CD_IRQ),
        (PrcmuIrq::SrpTim, wakeup_bit::SRP_TIM),
        (PrcmuIrq::ApeReq, wakeup_bit::APE_REQ),
        (PrcmuIrq::Usb, wakeup_bit::USB),
        (PrcmuIrq::Abb, wakeup_bit::ABB),
        (PrcmuIrq::LowPowerAudio, wakeup_bit::LOW_POWER_AUDIO),
        (PrcmuIrq::TempSensorLow, wakeup_bit::TEMP_SENSOR_LOW),
        (PrcmuIrq::TempSensorHigh, wakeup_bit::TEMP_SENSOR_HIGH),
        (PrcmuIrq::Arm, wakeup_bit::ARM),
        (PrcmuIrq::AcWakeAck, wakeup_bit::AC_WAKE_ACK),
        (PrcmuIrq::ModemSwResetReq, wakeup_bit::MODEM_SW_RESET_REQ),
        (PrcmuIrq::Gpio0, wakeup_bit::GPIO0),
        (PrcmuIrq::Gpio1, wakeup_bit::GPIO1),
        (PrcmuIrq::Gpio2, wakeup_bit::GPIO2),
        (PrcmuIrq::Gpio3, wakeup_bit::GPIO3),
        (PrcmuIrq::Gpio4, wakeup_bit::GPIO4),
        (PrcmuIrq::Gpio5, wakeup_bit::GPIO5),
        (PrcmuIrq::Gpio6, wakeup_bit::GPIO6),
        (PrcmuIrq::Gpio7, wakeup_bit::GPIO7),
        (PrcmuIrq::AcRelAck, wakeup_bit::AC_REL_ACK),
    ]);

    /// Wakeup source to hardware bit
    pub static ref WAKEUP_BITS: WakeupMap<WakeupSource, NUM_WAKEUP_SOURCES> = WakeupMap::build(&[
        (WakeupSource::Rtc, wakeup_bit::RTC),
        (WakeupSource::Rtt0, wakeup_bit::RTT0),
        (WakeupSource::Rtt1, wakeup_bit::RTT1),
        (WakeupSource::CdIrq, wakeup_bit::CD_IRQ),
        (WakeupSource::Usb, wakeup_bit::USB),
        (WakeupSource::Abb, wakeup_bit::ABB),
        (WakeupSource::Arm, wakeup_bit::ARM),
    ]);
}

/// Abstract interrupts whose hardware bit is set in `hw_bits`, in index
/// order.
pub fn fired_irqs(hw_bits: u32) -> impl Iterator<Item = PrcmuIrq> {
    PrcmuIrq::ALL
        .into_iter()
        .filter(move |irq| hw_bits & irq.wakeup_bit() != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irq_table() {
        assert_eq!(PrcmuIrq::Rtc.wakeup_bit(), 1 << 0);
        assert_eq!(PrcmuIrq::TempSensorHigh.wakeup_bit(), 1 << 12);
        assert_eq!(PrcmuIrq::ModemSwResetReq.wakeup_bit(), 1 << 20);
        assert_eq!(PrcmuIrq::Gpio0.wakeup_bit(), 1 << 23);
        assert_eq!(PrcmuIrq::AcRelAck.wakeup_bit(), PrcmuIrq::Gpio7.wakeup_bit());
    }

    #[test]
    fn test_irq_index_round_trip() {
        for (i, irq) in PrcmuIrq::ALL.iter().enumerate() {
            assert_eq!(irq.index(), i);
            assert_eq!(PrcmuIrq::from_index(i), Some(*irq));
        }
        assert_eq!(PrcmuIrq::from_index(NUM_PRCMU_WAKEUPS), None);
    }

    #[test]
    fn test_wakeup_set_bits() {
        assert_eq!(WakeupSet::empty().hw_bits(), 0);
        assert_eq!(
            (WakeupSet::RTC | WakeupSet::ABB | WakeupSet::ARM).hw_bits(),
            wakeup_bit::RTC | wakeup_bit::ABB | wakeup_bit::ARM
        );
        assert_eq!(WakeupSet::all().sources().count(), NUM_WAKEUP_SOURCES);
        assert_eq!(WakeupSet::from(WakeupSource::Usb), WakeupSet::USB);
    }

    #[test]
    fn test_fired_irqs_shared_bit() {
        let fired: Vec<_> = fired_irqs(wakeup_bit::GPIO7 | wakeup_bit::RTC).collect();
        assert_eq!(fired, [PrcmuIrq::Rtc, PrcmuIrq::Gpio7, PrcmuIrq::AcRelAck]);

        assert_eq!(
            IRQ_BITS.bits_of([PrcmuIrq::Gpio7, PrcmuIrq::AcRelAck]),
            wakeup_bit::GPIO7
        );
    }

    #[test]
    #[should_panic(expected = "has no entry")]
    fn test_build_missing_entry() {
        let _ = WakeupMap::<WakeupSource, NUM_WAKEUP_SOURCES>::build(&[
            (WakeupSource::Rtc, wakeup_bit::RTC),
        ]);
    }

    #[test]
    #[should_panic(expected = "single bit")]
    fn test_build_zero_entry() {
        let _ = WakeupMap::<WakeupSource, 1>::build(&[(WakeupSource::Rtc, 0)]);
    }

    #[test]
    #[should_panic(expected = "single bit")]
    fn test_build_multi_bit_entry() {
        let _ = WakeupMap::<WakeupSource, 1>::build(&[(WakeupSource::Rtc, 0b11)]);
    }

    #[test]
    #[should_panic(expected = "listed twice")]
    fn test_build_duplicate_key() {
        let _ = WakeupMap::<WakeupSource, 2>::build(&[
            (WakeupSource::Rtc, wakeup_bit::RTC),
            (WakeupSource::Rtc, wakeup_bit::RTT0),
        ]);
    }
}
