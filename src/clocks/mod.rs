//! Clock tree configuration. Build a [`ClockConfig`] describing the target state (or start
//! from `ClockConfig::default()`), then hand it to a [`ClockTree`], which applies it in an
//! order that keeps flash reads valid throughout.

mod config;
pub mod fdpll;
pub mod gclk;
pub mod mclk;
mod tree;
pub mod xosc;
pub mod xosc32k;

pub use config::{ClockConfig, DFLL_FREQ, OSC32K_FREQ};
pub use fdpll::{DpllId, DpllRef, FdpllConfig, FdpllStage, FdpllUnimplemented};
pub use gclk::{DivSel, GclkConfig, GclkSet, GclkSrc};
pub use mclk::CpuDiv;
pub use tree::ClockTree;
pub use xosc::{XoscConfig, XoscGain, XoscId};
pub use xosc32k::{RtcSel, Xosc32kConfig, Xosc32kStartup};

pub use crate::regs::gclk::NUM_GCLK;

/// This trait allows you to return information about a clock configuration's speeds.
/// It's used for configuring peripherals.
pub trait ClockCfg {
    /// CPU clock speed, in Hz.
    fn cpu_frequency(&self) -> u32;

    /// Output of generic clock generator `gclk`, in Hz. `None` if it's disabled, doesn't
    /// exist, or its source frequency isn't known (eg GCLK_IN).
    fn gclk_frequency(&self, gclk: usize) -> Option<u32>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Clock configuration errors. These are all detected before any register is written.
pub enum ClockError {
    /// The XOSC's nominal frequency is at or below 8 MHz, outside every gain band.
    XoscFreqOutOfBand { xosc: XoscId, freq: u32 },
    /// The XOSC start-up time doesn't fit in the 4-bit STARTUP field.
    XoscStartupRange { xosc: XoscId, startup: u8 },
    /// The OSCULP32K calibration value doesn't fit in the 6-bit CALIB field.
    UlpCalibrationRange(u8),
    /// A PLL was requested, but the PLL stage doesn't support it.
    NotImplemented(DpllId),
    /// These generators are in both the pre- and post-PLL sets.
    GclkSetOverlap(GclkSet),
    /// These bits of a generator set don't correspond to a generator.
    GclkSetRange(GclkSet),
    /// The divider doesn't fit in the generator's DIV field.
    GclkDividerRange { gclk: u8, div: u16 },
}
