//! Fractional digital PLLs, FDPLL0 and FDPLL1.
//!
//! Driving the PLLs isn't implemented yet. `ClockTree` calls into a [`FdpllStage`] between
//! the two generator sets; the only stage provided here, [`FdpllUnimplemented`], rejects
//! any configuration that asks for a PLL.

use crate::{clocks::ClockError, reg_access::RegisterAccess};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DpllId {
    Dpll0,
    Dpll1,
}

impl DpllId {
    pub const ALL: [Self; 2] = [Self::Dpll0, Self::Dpll1];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// PLL reference clock. Sets the OSCCTRL_DPLLCTRLBn register, REFCLK field.
pub enum DpllRef {
    /// The peripheral channel of this PLL, fed by the given generator.
    Gclk(u8),
    Xosc32k,
    Xosc0,
    Xosc1,
}

/// Settings for one FDPLL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FdpllConfig {
    pub enable: bool,
    pub on_demand: bool,
    pub run_standby: bool,
    pub reference: DpllRef,
    /// Integer part of the loop divider ratio. 13 bits.
    pub ldr: u16,
    /// Fractional part of the loop divider ratio, in 32nds.
    pub ldr_frac: u8,
    /// XOSC reference divider: the reference is f_xosc / (2 * (`xosc_div` + 1)). 11 bits.
    pub xosc_div: u16,
    /// Don't gate the output while the PLL is unlocked.
    pub lock_bypass: bool,
    pub wake_up_fast: bool,
}

impl FdpllConfig {
    /// Output frequency for a given frequency at the reference input:
    /// f_ref * (`ldr` + 1 + `ldr_frac` / 32). Saturates at `u32::MAX`.
    pub fn output_freq(&self, ref_freq: u32) -> u32 {
        let ref_freq = ref_freq as u64;
        let out = ref_freq * (self.ldr as u64 + 1) + ref_freq * self.ldr_frac as u64 / 32;
        u32::try_from(out).unwrap_or(u32::MAX)
    }

    /// Reference frequency after the XOSC divider, for an XOSC reference at `xosc_freq`.
    pub fn xosc_ref_freq(&self, xosc_freq: u32) -> u32 {
        xosc_freq / (2 * (self.xosc_div as u32 + 1))
    }
}

/// The frequency multiplier step of a clock tree transition.
pub trait FdpllStage {
    /// Return an error if this stage can't apply `cfgs`. Called before any register is
    /// written.
    fn check(&self, cfgs: &[Option<FdpllConfig>; 2]) -> Result<(), ClockError>;

    /// Apply `cfgs`. Called after the pre-PLL generator set, and before the post-PLL set.
    fn configure<R: RegisterAccess>(
        &mut self,
        regs: &mut R,
        cfgs: &[Option<FdpllConfig>; 2],
    ) -> Result<(), ClockError>;
}

/// A placeholder stage: accepts configurations with no PLLs, and rejects the rest with
/// `ClockError::NotImplemented`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FdpllUnimplemented;

impl FdpllStage for FdpllUnimplemented {
    fn check(&self, cfgs: &[Option<FdpllConfig>; 2]) -> Result<(), ClockError> {
        for (id, cfg) in DpllId::ALL.iter().zip(cfgs) {
            if cfg.is_some() {
                return Err(ClockError::NotImplemented(*id));
            }
        }
        Ok(())
    }

    fn configure<R: RegisterAccess>(
        &mut self,
        _regs: &mut R,
        cfgs: &[Option<FdpllConfig>; 2],
    ) -> Result<(), ClockError> {
        self.check(cfgs)
    }
}
