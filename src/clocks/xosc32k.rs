//! The 32.768 kHz external oscillator (XOSC32K), its clock failure detector, the
//! OSCULP32K calibration, and the RTC clock selection.

use cfg_if::cfg_if;

use crate::{reg_access::RegisterAccess, regs::osc32kctrl};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// XOSC32K start-up time. Sets the OSC32KCTRL_XOSC32K register, STARTUP field.
pub enum Xosc32kStartup {
    /// 62.6 ms
    Cycles2k = 0,
    /// 125 ms
    Cycles4k = 1,
    /// 500 ms
    Cycles16k = 2,
    /// 1 s
    Cycles32k = 3,
    /// 2 s
    Cycles64k = 4,
    /// 4 s
    Cycles128k = 5,
    /// 8 s
    Cycles256k = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// RTC clock source. Sets the OSC32KCTRL_RTCCTRL register, RTCSEL field.
pub enum RtcSel {
    UlpOsc1k = 0,
    UlpOsc32k = 1,
    Xosc1k = 4,
    Xosc32k = 5,
}

/// Settings for the 32 kHz oscillator block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Xosc32kConfig {
    pub enable: bool,
    /// High-speed gain mode. Otherwise standard.
    pub high_speed: bool,
    /// A crystal is connected across XIN32 and XOUT32. Otherwise, XIN32 takes an external
    /// clock.
    pub crystal: bool,
    /// Enable the 32 kHz output.
    pub en32k: bool,
    /// Enable the 1 kHz output.
    pub en1k: bool,
    pub run_standby: bool,
    pub on_demand: bool,
    /// Clock failure detection.
    pub clock_fail_detect: bool,
    /// Clock failure detector event output.
    pub clock_fail_event: bool,
    pub startup: Xosc32kStartup,
    /// OSCULP32K calibration value, 0 - 63. `None` leaves the factory value alone.
    pub calibration: Option<u8>,
    /// Clock source for the RTC. Written whether or not the oscillator is enabled.
    pub rtc_src: RtcSel,
}

impl Default for Xosc32kConfig {
    /// An always-on crystal with its 32 kHz and 1 kHz outputs enabled, feeding the RTC.
    fn default() -> Self {
        Self {
            enable: true,
            high_speed: false,
            crystal: true,
            en32k: true,
            en1k: true,
            run_standby: false,
            on_demand: false,
            clock_fail_detect: false,
            clock_fail_event: false,
            startup: Xosc32kStartup::Cycles32k,
            calibration: None,
            rtc_src: RtcSel::Xosc1k,
        }
    }
}

impl Xosc32kConfig {
    /// The largest value the OSCULP32K CALIB field holds.
    pub const MAX_CALIBRATION: u8 = 63;

    /// The OSC32KCTRL_XOSC32K value for this configuration.
    pub fn ctrl_bits(&self) -> u16 {
        let gain = if self.high_speed {
            osc32kctrl::CGM_HS
        } else {
            osc32kctrl::CGM_XT
        };

        let mut val = osc32kctrl::startup(self.startup as u16) | osc32kctrl::cgm(gain);

        let flags = [
            (self.enable, osc32kctrl::XOSC32K_ENABLE),
            (self.crystal, osc32kctrl::XOSC32K_XTALEN),
            (self.en32k, osc32kctrl::XOSC32K_EN32K),
            (self.en1k, osc32kctrl::XOSC32K_EN1K),
            (self.run_standby, osc32kctrl::XOSC32K_RUNSTDBY),
            (self.on_demand, osc32kctrl::XOSC32K_ONDEMAND),
        ];
        for (set, bit) in flags {
            if set {
                val |= bit;
            }
        }

        val
    }
}

/// Configure XOSC32K, its failure detector, and the RTC clock source.
///
/// If enabled and not on-demand, this blocks until the oscillator reports ready. There's
/// no timeout.
pub fn configure_xosc32k<R: RegisterAccess>(regs: &mut R, cfg: &Xosc32kConfig) {
    regs.write16(osc32kctrl::XOSC32K, cfg.ctrl_bits());

    let cfd = if cfg.clock_fail_detect {
        osc32kctrl::CFDCTRL_CFDEN
    } else {
        0
    };
    regs.write8(osc32kctrl::CFDCTRL, cfd);

    let cfdeo = if cfg.clock_fail_event {
        osc32kctrl::EVCTRL_CFDEO
    } else {
        0
    };
    regs.write8(osc32kctrl::EVCTRL, cfdeo);

    if let Some(calib) = cfg.calibration {
        let mut val = regs.read32(osc32kctrl::OSCULP32K);
        val &= !osc32kctrl::CALIB_MASK;
        val |= osc32kctrl::calib(calib as u32);

        // Writing the value back is opt-in. By default OSCULP32K keeps its factory value.
        cfg_if! {
            if #[cfg(feature = "commit-ulp-calibration")] {
                regs.write32(osc32kctrl::OSCULP32K, val);
                debug!("osculp32k: calibration {}", calib);
            } else {
                debug!("osculp32k: calibration {} computed ({}), not written", calib, val);
            }
        }
    }

    if cfg.enable && !cfg.on_demand {
        regs.wait_until_set(osc32kctrl::STATUS, osc32kctrl::XOSC32KRDY);
    }

    regs.write8(osc32kctrl::RTCCTRL, osc32kctrl::rtcsel(cfg.rtc_src as u8));

    debug!("xosc32k: enabled: {:?}, rtc: {:?}", cfg.enable, cfg.rtc_src);
}
