//! External high-frequency oscillators, XOSC0 and XOSC1. Each takes a crystal or an
//! external clock between 8 and 48 MHz.

use crate::{clocks::ClockError, reg_access::RegisterAccess, regs::oscctrl};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum XoscId {
    Xosc0,
    Xosc1,
}

impl XoscId {
    /// XOSCCTRLn register address.
    fn ctrl_reg(self) -> usize {
        match self {
            Self::Xosc0 => oscctrl::XOSCCTRL0,
            Self::Xosc1 => oscctrl::XOSCCTRL1,
        }
    }

    /// XOSCRDYn bit in OSCCTRL_STATUS.
    fn ready_bit(self) -> u32 {
        match self {
            Self::Xosc0 => oscctrl::XOSCRDY0,
            Self::Xosc1 => oscctrl::XOSCRDY1,
        }
    }
}

/// Settings for one external oscillator. Sets the OSCCTRL_XOSCCTRLn register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct XoscConfig {
    pub enable: bool,
    /// A crystal is connected across XIN and XOUT. Otherwise, XIN takes an external clock.
    pub crystal: bool,
    pub run_standby: bool,
    /// Only run while a peripheral requests the clock.
    pub on_demand: bool,
    pub low_buf_gain: bool,
    /// Automatic loop control, which reduces power once the crystal amplitude is reached.
    pub auto_loop_control: bool,
    /// Clock failure detection.
    pub clock_fail_detect: bool,
    /// Switch back to this oscillator once a detected failure clears.
    pub switch_back: bool,
    /// Start-up time, as 2^`startup` cycles of OSCULP32K (31 µs each). 0 - 15.
    pub startup: u8,
    /// Nominal frequency of the crystal or clock input, in Hz.
    pub freq: u32,
}

impl XoscConfig {
    /// The largest value the STARTUP field holds.
    pub const MAX_STARTUP: u8 = 15;

    /// A disabled oscillator of frequency `freq`.
    pub const fn disabled(freq: u32) -> Self {
        Self {
            enable: false,
            crystal: false,
            run_standby: false,
            on_demand: false,
            low_buf_gain: false,
            auto_loop_control: false,
            clock_fail_detect: false,
            switch_back: false,
            startup: 0,
            freq,
        }
    }

    /// An always-on crystal oscillator of frequency `freq`, with automatic loop control.
    pub const fn crystal(freq: u32) -> Self {
        Self {
            enable: true,
            crystal: true,
            auto_loop_control: true,
            startup: 6,
            ..Self::disabled(freq)
        }
    }

    /// The XOSCCTRLn value for this configuration.
    pub fn ctrl_bits(&self, id: XoscId) -> Result<u32, ClockError> {
        let gain = XoscGain::for_freq(self.freq).ok_or(ClockError::XoscFreqOutOfBand {
            xosc: id,
            freq: self.freq,
        })?;
        if self.startup > Self::MAX_STARTUP {
            return Err(ClockError::XoscStartupRange {
                xosc: id,
                startup: self.startup,
            });
        }

        let mut val = oscctrl::iptat(gain.iptat as u32)
            | oscctrl::imult(gain.imult as u32)
            | oscctrl::startup(self.startup as u32)
            | oscctrl::cfdpresc(gain.cfd_presc as u32);

        let flags = [
            (self.enable, oscctrl::XOSC_ENABLE),
            (self.crystal, oscctrl::XOSC_XTALEN),
            (self.run_standby, oscctrl::XOSC_RUNSTDBY),
            (self.on_demand, oscctrl::XOSC_ONDEMAND),
            (self.low_buf_gain, oscctrl::XOSC_LOWBUFGAIN),
            (self.auto_loop_control, oscctrl::XOSC_ENALC),
            (self.clock_fail_detect, oscctrl::XOSC_CFDEN),
            (self.switch_back, oscctrl::XOSC_SWBEN),
        ];
        for (set, bit) in flags {
            if set {
                val |= bit;
            }
        }

        Ok(val)
    }
}

/// Oscillator current and failure-detector settings that depend on the frequency.
/// Datasheet, table 28-7.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct XoscGain {
    /// Clock failure detector prescaler. CFDPRESC field.
    pub cfd_presc: u8,
    /// Oscillator current multiplier. IMULT field.
    pub imult: u8,
    /// Oscillator current reference. IPTAT field.
    pub iptat: u8,
}

impl XoscGain {
    /// Gain settings for a nominal frequency, or `None` at or below 8 MHz, where no band
    /// applies.
    pub fn for_freq(freq: u32) -> Option<Self> {
        let (cfd_presc, imult, iptat) = if freq > 32_000_000 {
            (0, 7, 3)
        } else if freq > 24_000_000 {
            (1, 6, 3)
        } else if freq > 16_000_000 {
            (2, 5, 3)
        } else if freq > 8_000_000 {
            (3, 4, 3)
        } else {
            return None;
        };

        Some(Self {
            cfd_presc,
            imult,
            iptat,
        })
    }
}

/// Configure an external oscillator, and return the XOSCCTRLn value it ends up with.
///
/// If enabled, this blocks until the oscillator reports ready. There's no timeout.
/// On-demand mode is applied after the oscillator is confirmed running: with it set,
/// the oscillator wouldn't start until something requested it, and we'd wait forever.
pub fn configure_xosc<R: RegisterAccess>(
    regs: &mut R,
    id: XoscId,
    cfg: &XoscConfig,
) -> Result<u32, ClockError> {
    let val = cfg.ctrl_bits(id)?;

    if cfg.enable {
        regs.write32(id.ctrl_reg(), val & !oscctrl::XOSC_ONDEMAND);
        regs.wait_until_set(oscctrl::STATUS, id.ready_bit());

        if cfg.on_demand {
            regs.modify32(id.ctrl_reg(), 0, oscctrl::XOSC_ONDEMAND);
        }
    } else {
        regs.write32(id.ctrl_reg(), val);
    }

    debug!("{:?}: {} Hz, enabled: {:?}", id, cfg.freq, cfg.enable);

    Ok(val)
}
