//! Applies a `ClockConfig`, ordering the writes so the CPU never runs faster than flash can
//! supply instructions.

use super::{
    ClockConfig, FdpllStage, FdpllUnimplemented, XoscId, gclk, mclk, xosc, xosc32k,
};
use crate::{Result, flash, reg_access::RegisterAccess};

/// Owns the clock registers, the PLL stage, and the CPU frequency currently in effect.
///
/// Create one per device, early in boot, and call [`initialize`](Self::initialize).
/// Later changes go through [`apply`](Self::apply) (or [`reconfigure`](Self::reconfigure)
/// if anything else might be running).
pub struct ClockTree<R, P = FdpllUnimplemented> {
    regs: R,
    fdpll: P,
    /// CPU frequency, in Hz. 0 until the first configuration is applied.
    cpu_frequency: u32,
}

impl<R: RegisterAccess> ClockTree<R> {
    pub const fn new(regs: R) -> Self {
        Self::with_fdpll_stage(regs, FdpllUnimplemented)
    }
}

impl<R: RegisterAccess, P: FdpllStage> ClockTree<R, P> {
    pub const fn with_fdpll_stage(regs: R, fdpll: P) -> Self {
        Self {
            regs,
            fdpll,
            cpu_frequency: 0,
        }
    }

    /// Apply the power-up configuration. Call this once, before anything else uses the
    /// clocks. It doesn't depend on any other initialization having run.
    pub fn initialize(&mut self, power_up: &'static ClockConfig) -> Result<()> {
        self.cpu_frequency = 0;
        self.apply(power_up)
    }

    /// Transition from the current clock tree to `config`.
    ///
    /// Call this only before other code is running, or with everything else excluded (eg
    /// in a critical section; see [`reconfigure`](Self::reconfigure)).
    ///
    /// The configuration is checked first; on error, no register has been written. The
    /// exception is an error from the PLL stage's `configure`, which comes after the
    /// oscillators and `gclk_pre`; the tracked frequency is then left unchanged.
    ///
    /// Panics, before any write, if `config.wait_states` doesn't fit the RWS field.
    /// Writes happen in this order:
    /// - Flash wait states, if the CPU is speeding up
    /// - XOSC32K, XOSC0, XOSC1; whichever are present
    /// - CPU divider
    /// - Generators in `gclk_pre`
    /// - PLLs
    /// - Generators in `gclk_post`
    /// - Flash wait states, if the CPU is slowing down or staying the same
    ///
    /// Enabled oscillators are waited on until ready, without a timeout.
    pub fn apply(&mut self, config: &ClockConfig) -> Result<()> {
        assert!(
            config.wait_states <= flash::MAX_WAIT_STATES,
            "Flash wait states must fit in the RWS field (0 - 15)."
        );
        if let Err(e) = config.validate() {
            warn!("clocks: invalid config: {:?}", e);
            return Err(e.into());
        }
        self.fdpll.check(&config.fdpll)?;

        let current = self.cpu_frequency;
        let target = config.cpu_frequency;
        info!("clocks: {} Hz -> {} Hz", current, target);

        if let Some(derived) = config.derived_cpu_frequency() {
            if derived != target {
                warn!(
                    "clocks: GCLK0 and CPU divider give {} Hz, config says {} Hz",
                    derived,
                    target
                );
            }
        }

        // Speeding up: flash must already be slow enough for the new clock.
        if target > current {
            flash::set_wait_states(&mut self.regs, config.wait_states);
        }

        if let Some(cfg) = &config.xosc32k {
            xosc32k::configure_xosc32k(&mut self.regs, cfg);
        }
        if let Some(cfg) = &config.xosc0 {
            xosc::configure_xosc(&mut self.regs, XoscId::Xosc0, cfg)?;
        }
        if let Some(cfg) = &config.xosc1 {
            xosc::configure_xosc(&mut self.regs, XoscId::Xosc1, cfg)?;
        }

        mclk::set_cpu_div(&mut self.regs, config.cpu_div);

        gclk::configure_gclk_set(&mut self.regs, config.gclk_pre, &config.gclk);
        self.fdpll.configure(&mut self.regs, &config.fdpll)?;
        gclk::configure_gclk_set(&mut self.regs, config.gclk_post, &config.gclk);

        // Slowing down: only relax flash timing once the clock already is slower.
        if target <= current {
            flash::set_wait_states(&mut self.regs, config.wait_states);
        }

        self.cpu_frequency = target;
        Ok(())
    }

    /// [`apply`](Self::apply), inside a critical section.
    pub fn reconfigure(&mut self, config: &ClockConfig) -> Result<()> {
        critical_section::with(|_| self.apply(config))
    }

    /// The CPU frequency in effect, in Hz. 0 if nothing has been applied yet.
    pub fn cpu_frequency(&self) -> u32 {
        self.cpu_frequency
    }

    /// Release the register access and PLL stage.
    pub fn free(self) -> (R, P) {
        (self.regs, self.fdpll)
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use super::*;
    use crate::{
        Error,
        clocks::{
            ClockError, CpuDiv, DpllId, DpllRef, FdpllConfig, GclkConfig, GclkSet, GclkSrc,
            Xosc32kConfig, XoscConfig,
        },
        reg_access::mock::MockBus,
        regs::{gclk::genctrl, mclk as mclk_regs, nvmctrl, osc32kctrl, oscctrl},
    };

    static POWER_UP: ClockConfig = ClockConfig::power_up();

    /// Stands in for a PLL driver; writes a marker so its position in the sequence shows.
    struct MarkerStage;

    // DPLL0CTRLA
    const MARKER: usize = oscctrl::BASE + 0x30;

    impl FdpllStage for MarkerStage {
        fn check(&self, _cfgs: &[Option<FdpllConfig>; 2]) -> core::result::Result<(), ClockError> {
            Ok(())
        }

        fn configure<R: RegisterAccess>(
            &mut self,
            regs: &mut R,
            _cfgs: &[Option<FdpllConfig>; 2],
        ) -> core::result::Result<(), ClockError> {
            regs.write32(MARKER, 0x2);
            Ok(())
        }
    }

    /// Fails partway through, after writing its first register.
    struct FailingStage;

    impl FdpllStage for FailingStage {
        fn check(&self, _cfgs: &[Option<FdpllConfig>; 2]) -> core::result::Result<(), ClockError> {
            Ok(())
        }

        fn configure<R: RegisterAccess>(
            &mut self,
            regs: &mut R,
            _cfgs: &[Option<FdpllConfig>; 2],
        ) -> core::result::Result<(), ClockError> {
            regs.write32(MARKER, 0x2);
            Err(ClockError::NotImplemented(DpllId::Dpll0))
        }
    }

    fn config(freq: u32) -> ClockConfig {
        let mut cfg = ClockConfig {
            wait_states: flash::wait_states_for(freq),
            cpu_frequency: freq,
            xosc0: Some(XoscConfig::crystal(12_000_000)),
            gclk_pre: GclkSet::EMPTY.with(0).with(2),
            gclk_post: GclkSet::EMPTY.with(1).with(3),
            ..Default::default()
        };
        cfg.gclk[0] = GclkConfig::new(GclkSrc::Dfll, (48_000_000 / freq) as u16);
        cfg.gclk[1] = GclkConfig::new(GclkSrc::Xosc32k, 32);
        cfg.gclk[2] = GclkConfig::new(GclkSrc::Xosc0, 1);
        cfg.gclk[3] = GclkConfig::new(GclkSrc::Dfll, 48);
        cfg.gclk[4] = GclkConfig::new(GclkSrc::Dfll, 4);
        cfg
    }

    fn tree_at(freq: u32) -> ClockTree<MockBus, MarkerStage> {
        let mut tree = ClockTree::with_fdpll_stage(MockBus::new(), MarkerStage);
        tree.apply(&config(freq)).unwrap();
        tree.regs.clear_log();
        tree
    }

    fn rws(bus: &MockBus) -> u32 {
        (bus.get(nvmctrl::CTRLA) >> 8) & 0xF
    }

    #[test]
    fn speeding_up_sets_wait_states_first() {
        let mut tree = tree_at(12_000_000);
        assert_eq!(rws(&tree.regs), 0);

        tree.apply(&config(48_000_000)).unwrap();

        assert_eq!(
            tree.regs.written_addrs(),
            [
                nvmctrl::CTRLA,
                oscctrl::XOSCCTRL0,
                mclk_regs::CPUDIV,
                genctrl(0),
                genctrl(2),
                MARKER,
                genctrl(1),
                genctrl(3),
            ]
        );
        assert_eq!(tree.regs.writes()[0], (nvmctrl::CTRLA, 1 << 8));
        assert!(!tree.regs.written_addrs().contains(&genctrl(4)));
        assert_eq!(tree.cpu_frequency(), 48_000_000);
    }

    #[test]
    fn slowing_down_sets_wait_states_last() {
        let mut tree = tree_at(48_000_000);
        assert_eq!(rws(&tree.regs), 1);

        tree.apply(&config(12_000_000)).unwrap();

        let addrs = tree.regs.written_addrs();
        assert_eq!(addrs.first(), Some(&oscctrl::XOSCCTRL0));
        assert_eq!(addrs.last(), Some(&nvmctrl::CTRLA));
        assert_eq!(addrs.iter().filter(|a| **a == nvmctrl::CTRLA).count(), 1);
        assert_eq!(rws(&tree.regs), 0);
        assert_eq!(tree.cpu_frequency(), 12_000_000);
    }

    #[test]
    fn first_apply_counts_as_speeding_up() {
        let mut tree = ClockTree::with_fdpll_stage(MockBus::new(), MarkerStage);
        tree.apply(&config(24_000_000)).unwrap();
        assert_eq!(tree.regs.written_addrs()[0], nvmctrl::CTRLA);
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let cfg = config(48_000_000);

        let mut once = ClockTree::with_fdpll_stage(MockBus::new(), MarkerStage);
        once.apply(&cfg).unwrap();

        let mut twice = ClockTree::with_fdpll_stage(MockBus::new(), MarkerStage);
        twice.apply(&cfg).unwrap();
        twice.regs.clear_log();
        twice.apply(&cfg).unwrap();

        assert_eq!(once.regs.mem, twice.regs.mem);
        assert_eq!(once.cpu_frequency(), twice.cpu_frequency());
        // Same frequency takes the slowing-down path.
        assert_eq!(twice.regs.written_addrs().last(), Some(&nvmctrl::CTRLA));
    }

    #[test]
    fn initialize_then_apply_power_up() {
        let mut tree = ClockTree::new(MockBus::new());
        tree.initialize(&POWER_UP).unwrap();
        assert_eq!(tree.cpu_frequency(), POWER_UP.cpu_frequency);

        tree.apply(&POWER_UP).unwrap();
        assert_eq!(tree.cpu_frequency(), POWER_UP.cpu_frequency);
        tree.apply(&POWER_UP).unwrap();
        assert_eq!(tree.cpu_frequency(), POWER_UP.cpu_frequency);

        let (bus, _) = tree.free();
        assert_eq!(bus.get(genctrl(0)), POWER_UP.gclk[0].genctrl_bits());
        assert_eq!(bus.get(mclk_regs::CPUDIV), CpuDiv::Div1 as u32);
    }

    #[test]
    fn initialize_resets_tracked_frequency() {
        let mut tree = tree_at(48_000_000);
        tree.initialize(&POWER_UP).unwrap();
        // From 0, so the wait states go first even though 48 MHz is already running.
        assert_eq!(tree.regs.written_addrs()[0], nvmctrl::CTRLA);
    }

    #[test]
    fn absent_oscillators_untouched() {
        let mut tree = ClockTree::new(MockBus::new());
        tree.apply(&ClockConfig::default()).unwrap();

        let addrs = tree.regs.written_addrs();
        for reg in [
            oscctrl::XOSCCTRL0,
            oscctrl::XOSCCTRL1,
            osc32kctrl::XOSC32K,
            osc32kctrl::RTCCTRL,
        ] {
            assert!(!addrs.contains(&reg));
        }
    }

    #[test]
    fn oscillator_order() {
        let cfg = ClockConfig {
            xosc32k: Some(Xosc32kConfig::default()),
            xosc0: Some(XoscConfig::crystal(16_000_000)),
            xosc1: Some(XoscConfig::crystal(32_000_000)),
            ..Default::default()
        };
        let mut tree = ClockTree::new(MockBus::new());
        tree.apply(&cfg).unwrap();

        let addrs = tree.regs.written_addrs();
        let pos = |reg: usize| addrs.iter().position(|a| *a == reg).unwrap();
        assert!(pos(osc32kctrl::XOSC32K) < pos(oscctrl::XOSCCTRL0));
        assert!(pos(oscctrl::XOSCCTRL0) < pos(oscctrl::XOSCCTRL1));
        assert!(pos(oscctrl::XOSCCTRL1) < pos(mclk_regs::CPUDIV));
    }

    #[test]
    fn unimplemented_pll_rejected_before_any_write() {
        let mut tree = ClockTree::new(MockBus::new());
        tree.initialize(&POWER_UP).unwrap();
        tree.regs.clear_log();

        let mut cfg = config(48_000_000);
        cfg.fdpll[1] = Some(FdpllConfig {
            enable: true,
            on_demand: false,
            run_standby: false,
            reference: DpllRef::Xosc0,
            ldr: 19,
            ldr_frac: 0,
            xosc_div: 0,
            lock_bypass: false,
            wake_up_fast: false,
        });

        assert_eq!(
            tree.apply(&cfg),
            Err(Error::ClockError(ClockError::NotImplemented(DpllId::Dpll1)))
        );
        assert!(tree.regs.log.is_empty());
        assert_eq!(tree.cpu_frequency(), 48_000_000);
    }

    #[test]
    fn out_of_band_xosc_rejected_before_any_write() {
        let mut tree = tree_at(12_000_000);
        let cfg = ClockConfig {
            xosc1: Some(XoscConfig::crystal(4_000_000)),
            ..config(48_000_000)
        };

        assert_eq!(
            tree.apply(&cfg),
            Err(Error::ClockError(ClockError::XoscFreqOutOfBand {
                xosc: XoscId::Xosc1,
                freq: 4_000_000
            }))
        );
        assert!(tree.regs.log.is_empty());
        assert_eq!(tree.cpu_frequency(), 12_000_000);
    }

    #[test]
    fn wait_states_past_field_panic_before_any_write() {
        let mut tree = tree_at(48_000_000);
        let cfg = ClockConfig {
            wait_states: 16,
            ..config(12_000_000)
        };

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = tree.apply(&cfg);
        }));

        assert!(result.is_err());
        assert!(tree.regs.log.is_empty());
        assert_eq!(tree.cpu_frequency(), 48_000_000);
    }

    #[test]
    fn failing_pll_stage_keeps_tracked_frequency() {
        let mut tree = ClockTree::with_fdpll_stage(MockBus::new(), FailingStage);
        tree.apply(&config(12_000_000)).unwrap_err();
        assert_eq!(tree.cpu_frequency(), 0);

        tree.cpu_frequency = 12_000_000;
        tree.regs.clear_log();

        assert_eq!(
            tree.apply(&config(48_000_000)),
            Err(Error::ClockError(ClockError::NotImplemented(DpllId::Dpll0)))
        );
        assert_eq!(tree.cpu_frequency(), 12_000_000);

        // Everything up to the PLL stage went out; the post set didn't.
        assert_eq!(
            tree.regs.written_addrs(),
            [
                nvmctrl::CTRLA,
                oscctrl::XOSCCTRL0,
                mclk_regs::CPUDIV,
                genctrl(0),
                genctrl(2),
                MARKER,
            ]
        );
    }

    #[test]
    fn reconfigure_in_critical_section() {
        let mut tree = tree_at(12_000_000);
        tree.reconfigure(&config(24_000_000)).unwrap();
        assert_eq!(tree.cpu_frequency(), 24_000_000);

        let writes: Vec<_> = tree.regs.writes();
        assert_eq!(writes[0], (nvmctrl::CTRLA, 0));
    }
}
