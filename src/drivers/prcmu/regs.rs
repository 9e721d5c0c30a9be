//! DB5500 PRCMU register map and TCDM mailbox layout.
//!
//! Three address regions are involved:
//! - **PRCM**: the power/reset/clock management register block (doorbell,
//!   interrupt status, clock management registers).
//! - **TCDM**: shared memory with the PRCMU firmware holding the eight
//!   request/acknowledge mailboxes.
//! - **TCPM**: firmware program memory, only read for the version words.
//!
//! Offsets are hardware-defined constants and are kept here, out of the
//! protocol code.

/// Number of mailboxes shared with the firmware.
pub const NUM_MAILBOXES: usize = 8;

/// Doorbell/interrupt bits for all mailboxes.
pub const ALL_MBOX_BITS: u32 = (1 << NUM_MAILBOXES) - 1;

/// Mailbox return codes.
pub const RC_SUCCESS: u8 = 0;
pub const RC_FAIL: u8 = 1;

/// PRCM register offsets.
#[allow(dead_code)]
pub mod prcm {
    pub const MBOX_CPU_VAL: usize = 0x0FC; // Doorbell pending bits (read)
    pub const MBOX_CPU_SET: usize = 0x100; // Doorbell set (write-one-to-set)
    pub const TCR: usize = 0x1C8; // Timer control
    pub const RESOUTN_SET: usize = 0x214; // RESOUTn pin set (write-one-to-set)
    pub const RESOUTN_CLR: usize = 0x218; // RESOUTn pin clear (write-one-to-clear)
    pub const CLKOCR: usize = 0x1CC; // CLKOUT source select
    pub const CLKODIV: usize = 0x1D0; // CLKOUT divider
    pub const APE_SOFTRST: usize = 0x228; // Software reset, fires a firmware interrupt
    pub const SEM: usize = 0x400; // Hardware semaphore shared with the firmware
    pub const DDR_SUBSYS_APE_MINBW: usize = 0x438; // DDR OPP request
    pub const ARM_IT1_CLEAR: usize = 0x48C; // Ack interrupt clear (write-one-to-clear)
    pub const ARM_IT1_VAL: usize = 0x494; // Ack interrupt status
}

/// RESOUTn pins, one bit per output
pub const NUM_RESOUTN: u8 = 3;

/// PRCM_SEM bits
pub mod sem {
    pub const PRCM_SEM: u32 = 1 << 0;
}

/// Fields shared by every `*_MGT` clock management register.
pub mod clk_mgt {
    pub const CLKPLLDIV_SHIFT: u32 = 0;
    pub const CLKPLLDIV_MASK: u32 = 0x1F << CLKPLLDIV_SHIFT;
    pub const CLKPLLSW_MASK: u32 = 0x7 << 5;
    pub const CLKEN: u32 = 1 << 8;
}

/// Clock management register offsets, one per register-controlled clock.
pub mod clk_mgt_offsets {
    pub const SGACLK: usize = 0x014;
    pub const UARTCLK: usize = 0x018;
    pub const MSP02CLK: usize = 0x01C;
    pub const I2CCLK: usize = 0x020;
    pub const SDMMCCLK: usize = 0x024;
    pub const PER1CLK: usize = 0x02C;
    pub const PER2CLK: usize = 0x030;
    pub const PER3CLK: usize = 0x034;
    pub const PER5CLK: usize = 0x038;
    pub const PER6CLK: usize = 0x03C;
    pub const PWMCLK: usize = 0x044;
    pub const SPARE1CLK: usize = 0x048;
    pub const IRDACLK: usize = 0x04C;
    pub const IRRCCLK: usize = 0x050;
    pub const HDMICLK: usize = 0x058;
    pub const APEATCLK: usize = 0x05C;
    pub const APETRACECLK: usize = 0x060;
    pub const MCDECLK: usize = 0x064;
    pub const DSIALTCLK: usize = 0x06C;
    pub const DMACLK: usize = 0x074;
    pub const B2R2CLK: usize = 0x078;
    pub const TVCLK: usize = 0x07C;
    pub const RNGCLK: usize = 0x284;
    pub const SIACLK: usize = 0x288;
    pub const SVACLK: usize = 0x28C;
}

/// PRCM_TCR bits
pub mod tcr {
    pub const TENSEL_MASK: u32 = 0xFF;
    pub const STOP_TIMERS: u32 = 1 << 16;
    pub const DOZE_MODE: u32 = 1 << 17;
}

/// PRCM_CLKOCR / PRCM_CLKODIV fields
pub mod clkout {
    pub const CLKOUT0_SEL0_SHIFT: u32 = 0;
    pub const CLKOUT0_SEL0_MASK: u32 = 0x7 << CLKOUT0_SEL0_SHIFT;
    pub const CLKOUT0_SEL_SHIFT: u32 = 3;
    pub const CLKOUT0_SEL_MASK: u32 = 0x3F << CLKOUT0_SEL_SHIFT;
    pub const CLKOUT1_SEL0_SHIFT: u32 = 16;
    pub const CLKOUT1_SEL0_MASK: u32 = 0x7 << CLKOUT1_SEL0_SHIFT;
    pub const CLKOUT1_SEL_SHIFT: u32 = 19;
    pub const CLKOUT1_SEL_MASK: u32 = 0x3F << CLKOUT1_SEL_SHIFT;

    pub const CLKOUT0_DIV_SHIFT: u32 = 0;
    pub const CLKOUT0_DIV_MASK: u32 = 0x7 << CLKOUT0_DIV_SHIFT;
    pub const CLKOUT1_DIV_SHIFT: u32 = 16;
    pub const CLKOUT1_DIV_MASK: u32 = 0x7 << CLKOUT1_DIV_SHIFT;

    // SEL0 field values
    pub const SEL0_SEL_CLK: u32 = 0x0;
    pub const SEL0_REF_CLK: u32 = 0x1;
    pub const SEL0_RTC_CLK0: u32 = 0x2;
    pub const SEL0_ULP_CLK: u32 = 0x3;

    // SEL field values (only meaningful with SEL0_SEL_CLK)
    pub const SEL_STATIC0: u32 = 0x0;
    pub const SEL_REFCLK: u32 = 0x1;
    pub const SEL_ULPCLK: u32 = 0x2;
    pub const SEL_ARMCLK: u32 = 0x3;
    pub const SEL_SYSACC0CLK: u32 = 0x4;
    pub const SEL_SOC0PLLCLK: u32 = 0x5;
    pub const SEL_SOC1PLLCLK: u32 = 0x6;
    pub const SEL_DDRPLLCLK: u32 = 0x7;
    pub const SEL_TVCLK: u32 = 0x8;
    pub const SEL_IRDACLK: u32 = 0x9;
}

/// TCPM offsets
pub mod tcpm {
    pub const FW_VERSION: usize = 0xA4; // Two words: board/fw, api
}

/// TCDM layout: mailbox headers, request and acknowledge regions.
pub mod tcdm {
    use super::NUM_MAILBOXES;

    pub const DDR_FREQUENCY: usize = 0x268; // 4 bytes
    pub const SHARE_INFO: usize = 0xEC8;
    pub const SHARE_INFO_HOTDOG: usize = SHARE_INFO + 62; // 2 bytes
    pub const SW_RST_REASON: usize = 0xFF8; // 2 bytes

    /// Header bytes: request headers 0-7 followed by ack headers 0-7.
    pub const MB_HEADER: usize = 0xFE8;
    pub const REQ_HEADER: usize = MB_HEADER;
    pub const ACK_HEADER: usize = MB_HEADER + NUM_MAILBOXES;

    pub const REQ_MB: [usize; NUM_MAILBOXES] =
        [0xFD8, 0xFCC, 0xFC4, 0xFC0, 0xF98, 0xF90, 0xF8C, 0xF84];
    pub const ACK_MB: [usize; NUM_MAILBOXES] =
        [0xF38, 0xF30, 0xF24, 0xF20, 0xF1C, 0xF14, 0xF0C, 0xF08];
}

/// Mailbox 0: power state transitions and wakeups.
pub mod mb0 {
    /// Request fields (relative to the mailbox request region)
    pub mod req {
        pub const AP_POWER_STATE: usize = 0x0;
        pub const ULP_CLOCK_STATE: usize = 0x1;
        pub const AP_PLL_STATE: usize = 0x2;
        pub const DDR_STATE: usize = 0x3;
        pub const ESRAM0_STATE: usize = 0x4;
        pub const WAKEUP_DBB: usize = 0x8;
        pub const WAKEUP_ABB: usize = 0xC;
    }

    /// Ack fields (relative to the mailbox ack region)
    pub mod ack {
        pub const AP_PWRSTTR_STATUS: usize = 0x0;
        pub const READ_POINTER: usize = 0x1;
        pub const WAKEUP_0_DBB: usize = 0x4;
        pub const WAKEUP_0_ABB: usize = 0x8;
        pub const WAKEUP_1_DBB: usize = 0x28;
        pub const WAKEUP_1_ABB: usize = 0x2C;
        pub const EVENT_ABB_NUMBERS: usize = 20;
    }

    pub mod header {
        /// Ack only
        pub const WAKE_UP: u8 = 0;
        pub const PWR_STATE_TRANS: u8 = 1;
        pub const WAKE_UP_CFG: u8 = 2;
        pub const RD_WAKE_UP_ACK: u8 = 3;
    }

    /// AP power state codes
    pub const AP_SLEEP: u8 = 2;
    pub const AP_DEEP_SLEEP: u8 = 3;
    pub const AP_IDLE: u8 = 4;

    pub const DDR_PWR_STATE_UNCHANGED: u8 = 0;

    /// ESRAM0 deep sleep state codes
    pub const OFF_ST: u8 = 0;
    pub const RET_ST: u8 = 1;
}

/// Mailbox 1: ARM/APE operating points.
pub mod mb1 {
    pub mod req {
        pub const ARM_OPP: usize = 0x0;
        pub const APE_OPP: usize = 0x1;
    }

    pub mod ack {
        pub const CURRENT_ARM_OPP: usize = 0x0;
        pub const CURRENT_APE_OPP: usize = 0x1;
        pub const ARM_VOLT_STATUS: usize = 0x2;
        pub const APE_VOLT_STATUS: usize = 0x3;
    }

    pub mod header {
        pub const ARM_OPP: u8 = 1;
        pub const APE_OPP: u8 = 2;
        pub const ARM_APE_OPP: u8 = 3;
    }

    /// Firmware OPP codes
    pub const ARM_100_OPP: u8 = 1;
    pub const ARM_50_OPP: u8 = 2;
    pub const ARM_EXT_OPP: u8 = 3;
    pub const APE_100_OPP: u8 = 1;
    pub const APE_50_OPP: u8 = 2;
}

/// Mailbox 2: EPOD, firmware clocks, PLLs.
pub mod mb2 {
    pub mod req {
        pub const EPOD_CLIENT: usize = 0x0;
        pub const EPOD_STATE: usize = 0x1;
        pub const CLK_CLIENT: usize = 0x2;
        pub const CLK_STATE: usize = 0x3;
        pub const PLL_CLIENT: usize = 0x4;
        pub const PLL_STATE: usize = 0x5;
    }

    pub mod ack {
        pub const EPOD_STATUS: usize = 0x2;
        pub const CLK_STATUS: usize = 0x6;
        pub const PLL_STATUS: usize = 0xA;
    }

    pub mod header {
        pub const EPOD_REQUEST: u8 = 1;
        pub const CLK_REQUEST: u8 = 2;
        pub const PLL_REQUEST: u8 = 3;
    }

    /// Firmware-managed clock clients
    pub const CLK_MSP1: u8 = 0;
    pub const CLK_CD: u8 = 1;

    /// PLL clients
    pub const PLL_SOC0: u8 = 0;
    pub const PLL_SOC1: u8 = 1;
    pub const PLL_DDR: u8 = 2;

    /// EPOD state codes
    pub const EPOD_OFF: u8 = 0;
    pub const EPOD_ON: u8 = 1;
    /// ESRAM12 on/off/retention codes
    pub const EPOD_OOR_OFF: u8 = 0;
    pub const EPOD_OOR_RET: u8 = 1;
    pub const EPOD_OOR_ON: u8 = 2;
}

/// Mailbox 3: system reference clock.
pub mod mb3 {
    pub mod req {
        pub const REFCLK_MGT: usize = 0x0;
    }

    pub mod ack {
        pub const REFCLK_REQ: usize = 0x0;
    }

    pub mod header {
        pub const REFCLK_REQUEST: u8 = 1;
    }

    pub const SYSCLK_OFF: u8 = 0;
    pub const SYSCLK_ON: u8 = 1;
}

/// Mailbox 4: thermal supervision (hotdog, hotmon, sampling period).
pub mod mb4 {
    pub mod req {
        pub const HOTDOG_THRESHOLD: usize = 32;
        pub const HOT_PERIOD: usize = 34;
        pub const HOTMON_LOW: usize = 36;
        pub const HOTMON_HIGH: usize = 38;
    }

    pub mod ack {
        pub const REQUESTS: usize = 0x0;
    }

    pub mod header {
        pub const CFG_HOTDOG: u8 = 7;
        pub const CFG_HOTMON: u8 = 8;
        pub const CFG_HOTPERIOD: u8 = 10;
    }

    pub mod ack_header {
        pub const CFG_HOTDOG: u8 = 5;
        pub const CFG_HOTMON: u8 = 6;
        pub const CFG_HOTPERIOD: u8 = 8;
    }

    /// Sampling period value that stops temperature sampling.
    pub const HOT_PERIOD_STOP: u16 = 0xFFFF;
}

/// Mailbox 5: I2C proxy to the analog baseband (ABB).
pub mod mb5 {
    pub mod req {
        pub const I2C_SLAVE: usize = 0;
        pub const I2C_REG: usize = 1;
        pub const I2C_SIZE: usize = 2;
        pub const I2C_DATA: usize = 4;
    }

    pub mod ack {
        pub const RETURN_CODE: usize = 0;
        pub const I2C_DATA: usize = 4;
    }

    pub mod header {
        pub const I2C_WRITE: u8 = 1;
        pub const I2C_READ: u8 = 2;
    }

    /// Largest transfer carried by one request.
    pub const MAX_TRANSFER: usize = 4;
}
