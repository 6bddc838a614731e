//! The target clock tree state.

use super::{
    ClockCfg, ClockError, CpuDiv, DpllId, DpllRef, FdpllConfig, GclkConfig, GclkSet, GclkSrc,
    NUM_GCLK, Xosc32kConfig, XoscConfig, XoscGain, XoscId,
};
use crate::flash;

/// DFLL48M frequency in open-loop mode, as at reset.
pub const DFLL_FREQ: u32 = 48_000_000;
/// XOSC32K and OSCULP32K frequency.
pub const OSC32K_FREQ: u32 = 32_768;

/// A complete clock tree configuration. `ClockTree::apply` writes it.
///
/// Oscillators that the board doesn't have, or that should be left alone, are `None`.
/// Generators are only written if they're in `gclk_pre` or `gclk_post`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockConfig {
    /// Flash read wait states at `cpu_frequency`. 0 - 15.
    pub wait_states: u8,
    pub cpu_div: CpuDiv,
    /// The CPU frequency this configuration results in, in Hz.
    pub cpu_frequency: u32,
    /// Generators to configure before the PLLs: ones the PLLs don't feed.
    pub gclk_pre: GclkSet,
    /// Generators to configure after the PLLs: ones that may use PLL outputs.
    pub gclk_post: GclkSet,
    pub gclk: [GclkConfig; NUM_GCLK],
    pub xosc32k: Option<Xosc32kConfig>,
    pub xosc0: Option<XoscConfig>,
    pub xosc1: Option<XoscConfig>,
    pub fdpll: [Option<FdpllConfig>; 2],
}

impl ClockConfig {
    /// The reset clocking: DFLL48M through GCLK0 to the CPU, undivided. Use this as a
    /// baseline, or pass it to `ClockTree::initialize` on a board with no external
    /// oscillators.
    pub const fn power_up() -> Self {
        let mut gclk = [GclkConfig::DISABLED; NUM_GCLK];
        gclk[0] = GclkConfig {
            improve_duty_cycle: true,
            ..GclkConfig::new(GclkSrc::Dfll, 1)
        };

        Self {
            wait_states: flash::wait_states_for(DFLL_FREQ),
            cpu_div: CpuDiv::Div1,
            cpu_frequency: DFLL_FREQ,
            gclk_pre: GclkSet::EMPTY.with(0),
            gclk_post: GclkSet::EMPTY,
            gclk,
            xosc32k: None,
            xosc0: None,
            xosc1: None,
            fdpll: [None, None],
        }
    }

    /// Check for configuration errors that can be detected without touching hardware.
    pub fn validate(&self) -> Result<(), ClockError> {
        for (id, xosc) in [(XoscId::Xosc0, &self.xosc0), (XoscId::Xosc1, &self.xosc1)] {
            if let Some(cfg) = xosc {
                if XoscGain::for_freq(cfg.freq).is_none() {
                    return Err(ClockError::XoscFreqOutOfBand {
                        xosc: id,
                        freq: cfg.freq,
                    });
                }
                if cfg.startup > XoscConfig::MAX_STARTUP {
                    return Err(ClockError::XoscStartupRange {
                        xosc: id,
                        startup: cfg.startup,
                    });
                }
            }
        }

        if let Some(Xosc32kConfig {
            calibration: Some(calib),
            ..
        }) = self.xosc32k
        {
            if calib > Xosc32kConfig::MAX_CALIBRATION {
                return Err(ClockError::UlpCalibrationRange(calib));
            }
        }

        let all = self.gclk_pre.union(self.gclk_post);
        if !all.out_of_range().is_empty() {
            return Err(ClockError::GclkSetRange(all.out_of_range()));
        }

        if !self.gclk_pre.is_disjoint(self.gclk_post) {
            return Err(ClockError::GclkSetOverlap(
                self.gclk_pre.intersection(self.gclk_post),
            ));
        }

        for n in all.iter() {
            let cfg = &self.gclk[n];
            if cfg.enable && cfg.div > GclkConfig::max_div(n) {
                return Err(ClockError::GclkDividerRange {
                    gclk: n as u8,
                    div: cfg.div,
                });
            }
        }

        Ok(())
    }

    /// The CPU frequency implied by GCLK0 and the CPU divider, if GCLK0's source is known.
    pub fn derived_cpu_frequency(&self) -> Option<u32> {
        self.gclk_frequency(0).map(|f| f / self.cpu_div.value())
    }

    /// Frequency of a generator source. `depth` bounds the walk through chained
    /// generators and PLLs.
    fn source_freq(&self, src: GclkSrc, depth: usize) -> Option<u32> {
        match src {
            GclkSrc::Xosc0 => enabled_xosc_freq(&self.xosc0),
            GclkSrc::Xosc1 => enabled_xosc_freq(&self.xosc1),
            GclkSrc::GclkIn => None,
            GclkSrc::Gclk1 => self.gclk_freq_bounded(1, depth + 1),
            GclkSrc::OscUlp32k => Some(OSC32K_FREQ),
            GclkSrc::Xosc32k => match self.xosc32k {
                Some(cfg) if cfg.enable && cfg.en32k => Some(OSC32K_FREQ),
                _ => None,
            },
            GclkSrc::Dfll => Some(DFLL_FREQ),
            GclkSrc::Dpll0 => self.dpll_freq(DpllId::Dpll0, depth + 1),
            GclkSrc::Dpll1 => self.dpll_freq(DpllId::Dpll1, depth + 1),
        }
    }

    fn gclk_freq_bounded(&self, gclk: usize, depth: usize) -> Option<u32> {
        if gclk >= NUM_GCLK || depth > NUM_GCLK {
            return None;
        }

        let cfg = &self.gclk[gclk];
        if !cfg.enable {
            return None;
        }

        self.source_freq(cfg.source, depth)
            .map(|f| cfg.output_freq(f))
    }

    fn dpll_freq(&self, id: DpllId, depth: usize) -> Option<u32> {
        let cfg = self.fdpll[id as usize]?;
        if !cfg.enable {
            return None;
        }

        let ref_freq = match cfg.reference {
            DpllRef::Gclk(n) => self.gclk_freq_bounded(n as usize, depth + 1)?,
            DpllRef::Xosc32k => self.source_freq(GclkSrc::Xosc32k, depth)?,
            DpllRef::Xosc0 => cfg.xosc_ref_freq(enabled_xosc_freq(&self.xosc0)?),
            DpllRef::Xosc1 => cfg.xosc_ref_freq(enabled_xosc_freq(&self.xosc1)?),
        };

        Some(cfg.output_freq(ref_freq))
    }
}

fn enabled_xosc_freq(xosc: &Option<XoscConfig>) -> Option<u32> {
    match xosc {
        Some(cfg) if cfg.enable => Some(cfg.freq),
        _ => None,
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::power_up()
    }
}

impl ClockCfg for ClockConfig {
    fn cpu_frequency(&self) -> u32 {
        self.cpu_frequency
    }

    fn gclk_frequency(&self, gclk: usize) -> Option<u32> {
        self.gclk_freq_bounded(gclk, 0)
    }
}
