//! Register map for the clock-related peripherals of the SAMD5x/E5x. Addresses and field
//! layouts are from the datasheet (DS60001507), chapters 14 (GCLK), 15 (MCLK),
//! 28 (OSCCTRL), 29 (OSC32KCTRL), and 25 (NVMCTRL).
//!
//! Only the registers this crate touches are listed.

/// Non-volatile memory controller.
pub mod nvmctrl {
    pub const BASE: usize = 0x4100_4000;

    /// CTRLA, 16 bits.
    pub const CTRLA: usize = BASE + 0x00;

    reg_field!(u16, RWS, 8, 4);
}

/// Main clock controller: CPU and AHB/APB dividers.
pub mod mclk {
    pub const BASE: usize = 0x4000_0800;

    /// CPUDIV, 8 bits.
    pub const CPUDIV: usize = BASE + 0x05;
}

/// Oscillators controller: XOSC0/1, DFLL48M, FDPLL0/1.
pub mod oscctrl {
    pub const BASE: usize = 0x4000_1000;

    pub const STATUS: usize = BASE + 0x10;
    pub const XOSCCTRL0: usize = BASE + 0x14;
    pub const XOSCCTRL1: usize = BASE + 0x18;

    // STATUS
    reg_bits!(u32, XOSCRDY0 = 0, XOSCRDY1 = 1);

    // XOSCCTRLn
    reg_bits!(
        u32,
        XOSC_ENABLE = 1,
        XOSC_XTALEN = 2,
        XOSC_RUNSTDBY = 6,
        XOSC_ONDEMAND = 7,
        XOSC_LOWBUFGAIN = 8,
        XOSC_ENALC = 15,
        XOSC_CFDEN = 16,
        XOSC_SWBEN = 17,
    );
    reg_field!(u32, IPTAT, 9, 2);
    reg_field!(u32, IMULT, 11, 4);
    reg_field!(u32, STARTUP, 20, 4);
    reg_field!(u32, CFDPRESC, 24, 4);
}

/// 32 kHz oscillators controller: XOSC32K, OSCULP32K, and the RTC clock selection.
pub mod osc32kctrl {
    pub const BASE: usize = 0x4000_1400;

    pub const STATUS: usize = BASE + 0x0C;
    /// RTCCTRL, 8 bits.
    pub const RTCCTRL: usize = BASE + 0x10;
    /// XOSC32K, 16 bits.
    pub const XOSC32K: usize = BASE + 0x14;
    /// CFDCTRL, 8 bits.
    pub const CFDCTRL: usize = BASE + 0x16;
    /// EVCTRL, 8 bits.
    pub const EVCTRL: usize = BASE + 0x17;
    pub const OSCULP32K: usize = BASE + 0x1C;

    // STATUS
    reg_bits!(u32, XOSC32KRDY = 0);

    // XOSC32K
    reg_bits!(
        u16,
        XOSC32K_ENABLE = 1,
        XOSC32K_XTALEN = 2,
        XOSC32K_EN32K = 3,
        XOSC32K_EN1K = 4,
        XOSC32K_RUNSTDBY = 6,
        XOSC32K_ONDEMAND = 7,
    );
    reg_field!(u16, STARTUP, 8, 3);
    reg_field!(u16, CGM, 13, 2);

    pub const CGM_XT: u16 = 0x1;
    pub const CGM_HS: u16 = 0x2;

    // CFDCTRL and EVCTRL
    reg_bits!(u8, CFDCTRL_CFDEN = 0, EVCTRL_CFDEO = 0);

    // RTCCTRL
    reg_field!(u8, RTCSEL, 0, 3);

    // OSCULP32K
    reg_field!(u32, CALIB, 8, 6);
}

/// Generic clock controller.
pub mod gclk {
    pub const BASE: usize = 0x4000_1C00;

    /// Generic clock generators on this family.
    pub const NUM_GCLK: usize = 12;

    /// GENCTRLn, for generator `n`.
    pub const fn genctrl(n: usize) -> usize {
        BASE + 0x20 + 4 * n
    }

    reg_bits!(
        u32,
        GENEN = 8,
        IDC = 9,
        OOV = 10,
        OE = 11,
        DIVSEL = 12,
        RUNSTDBY = 13,
    );
    reg_field!(u32, SRC, 0, 4);
    reg_field!(u32, DIV, 16, 16);
}
