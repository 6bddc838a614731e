//! Generic clock generators. Each one selects a source, divides it, and distributes the
//! result to peripherals (and, for GCLK0, to the CPU via MCLK).

use crate::{
    reg_access::RegisterAccess,
    regs::gclk::{self, NUM_GCLK},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// Generator clock source. Sets the GCLK_GENCTRLn register, SRC field.
pub enum GclkSrc {
    Xosc0 = 0x0,
    Xosc1 = 0x1,
    /// The GCLK_IN[n] pin.
    GclkIn = 0x2,
    /// The output of generator 1.
    Gclk1 = 0x3,
    OscUlp32k = 0x4,
    Xosc32k = 0x5,
    Dfll = 0x6,
    Dpll0 = 0x7,
    Dpll1 = 0x8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// How `div` is interpreted. Sets the GCLK_GENCTRLn register, DIVSEL field.
pub enum DivSel {
    /// Divide by `div`. 0 and 1 both divide by 1.
    Linear = 0,
    /// Divide by 2^(`div` + 1).
    Pow2 = 1,
}

/// Settings for one generic clock generator. A disabled generator ignores every other
/// field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GclkConfig {
    pub enable: bool,
    pub source: GclkSrc,
    /// Divider. 16 bits on GCLK1, 8 bits on the others.
    pub div: u16,
    pub div_sel: DivSel,
    /// Improve duty cycle; gives 50/50 output with odd dividers.
    pub improve_duty_cycle: bool,
    /// Drive the output onto the GCLK_IO[n] pin.
    pub output_enable: bool,
    /// GCLK_IO[n] level while the output is off.
    pub output_off_value: bool,
    pub run_standby: bool,
}

impl GclkConfig {
    pub const DISABLED: Self = Self {
        enable: false,
        source: GclkSrc::Dfll,
        div: 0,
        div_sel: DivSel::Linear,
        improve_duty_cycle: false,
        output_enable: false,
        output_off_value: false,
        run_standby: false,
    };

    /// An enabled generator dividing `source` linearly by `div`.
    pub const fn new(source: GclkSrc, div: u16) -> Self {
        Self {
            enable: true,
            source,
            div,
            ..Self::DISABLED
        }
    }

    /// The GENCTRLn value for this configuration. Zero if disabled.
    pub fn genctrl_bits(&self) -> u32 {
        if !self.enable {
            return 0;
        }

        let mut val = gclk::src(self.source as u32) | gclk::GENEN | gclk::div(self.div as u32);

        let flags = [
            (self.improve_duty_cycle, gclk::IDC),
            (self.output_off_value, gclk::OOV),
            (self.output_enable, gclk::OE),
            (self.div_sel == DivSel::Pow2, gclk::DIVSEL),
            (self.run_standby, gclk::RUNSTDBY),
        ];
        for (set, bit) in flags {
            if set {
                val |= bit;
            }
        }

        val
    }

    /// The output frequency, given the source frequency.
    pub fn output_freq(&self, src_freq: u32) -> u32 {
        match self.div_sel {
            DivSel::Linear => match self.div {
                0 | 1 => src_freq,
                d => src_freq / d as u32,
            },
            DivSel::Pow2 => {
                let shift = (self.div as u32 + 1).min(31);
                src_freq >> shift
            }
        }
    }

    /// The largest divider generator `gclk` accepts.
    pub fn max_div(gclk: usize) -> u16 {
        if gclk == 1 { u16::MAX } else { u8::MAX as u16 }
    }
}

/// A set of generators, as a bitmask: bit `n` is generator `n`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GclkSet(u16);

impl GclkSet {
    pub const EMPTY: Self = Self(0);
    /// Every generator on the device.
    pub const ALL: Self = Self((1 << NUM_GCLK) - 1);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// This set, plus generator `gclk`. Panics if `gclk` is 16 or more.
    pub const fn with(self, gclk: usize) -> Self {
        assert!(gclk < 16, "GclkSet holds generators 0 - 15.");
        Self(self.0 | (1 << gclk))
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub const fn contains(&self, gclk: usize) -> bool {
        gclk < 16 && self.0 & (1 << gclk) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn intersection(&self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_disjoint(&self, other: Self) -> bool {
        self.intersection(other).is_empty()
    }

    /// Bits naming generators this device doesn't have.
    pub const fn out_of_range(&self) -> Self {
        Self(self.0 & !Self::ALL.0)
    }

    /// Generator numbers in the set, ascending.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..16).filter(move |n| self.contains(*n))
    }
}

/// Write one generator's control register, at `regaddr`. No synchronization wait is
/// needed.
pub fn configure_gclk<R: RegisterAccess>(regs: &mut R, regaddr: usize, cfg: &GclkConfig) {
    regs.write32(regaddr, cfg.genctrl_bits());
}

/// Configure the generators in `set`, in ascending order, using the matching entries of
/// `cfgs`. Generators outside the set aren't touched.
pub fn configure_gclk_set<R: RegisterAccess>(
    regs: &mut R,
    set: GclkSet,
    cfgs: &[GclkConfig; NUM_GCLK],
) {
    let mut remaining = set.bits();

    for (n, cfg) in cfgs.iter().enumerate() {
        if remaining == 0 {
            break;
        }

        let mask = 1 << n;
        if remaining & mask != 0 {
            remaining &= !mask;
            configure_gclk(regs, gclk::genctrl(n), cfg);
            trace!("gclk{}: {:?} / {}", n, cfg.source, cfg.div);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg_access::mock::MockBus;

    fn cfgs() -> [GclkConfig; NUM_GCLK] {
        let mut cfgs = [GclkConfig::DISABLED; NUM_GCLK];
        for (n, cfg) in cfgs.iter_mut().enumerate() {
            *cfg = GclkConfig::new(GclkSrc::Dfll, n as u16 + 1);
        }
        cfgs
    }

    #[test]
    fn disabled_is_all_zero() {
        let cfg = GclkConfig {
            enable: false,
            source: GclkSrc::Xosc1,
            div: 200,
            div_sel: DivSel::Pow2,
            improve_duty_cycle: true,
            output_enable: true,
            output_off_value: true,
            run_standby: true,
        };
        assert_eq!(cfg.genctrl_bits(), 0);

        let mut bus = MockBus::new();
        bus.mem.insert(gclk::genctrl(5), 0xFFFF_FFFF);
        configure_gclk(&mut bus, gclk::genctrl(5), &cfg);
        assert_eq!(bus.writes(), [(gclk::genctrl(5), 0)]);
    }

    #[test]
    fn enabled_word() {
        let cfg = GclkConfig {
            improve_duty_cycle: true,
            run_standby: true,
            ..GclkConfig::new(GclkSrc::Dpll0, 3)
        };
        assert_eq!(
            cfg.genctrl_bits(),
            0x7 | gclk::GENEN | gclk::IDC | gclk::RUNSTDBY | (3 << 16)
        );

        let pow2 = GclkConfig {
            div_sel: DivSel::Pow2,
            output_enable: true,
            output_off_value: true,
            ..GclkConfig::new(GclkSrc::Xosc0, 1)
        };
        assert_eq!(
            pow2.genctrl_bits(),
            gclk::GENEN | gclk::DIVSEL | gclk::OE | gclk::OOV | (1 << 16)
        );
    }

    #[test]
    fn set_touches_only_members_in_order() {
        let cfgs = cfgs();
        let set = GclkSet::EMPTY.with(7).with(0).with(3).with(11);

        let mut bus = MockBus::new();
        configure_gclk_set(&mut bus, set, &cfgs);

        assert_eq!(
            bus.writes(),
            [
                (gclk::genctrl(0), cfgs[0].genctrl_bits()),
                (gclk::genctrl(3), cfgs[3].genctrl_bits()),
                (gclk::genctrl(7), cfgs[7].genctrl_bits()),
                (gclk::genctrl(11), cfgs[11].genctrl_bits()),
            ]
        );
    }

    #[test]
    fn empty_set_writes_nothing() {
        let mut bus = MockBus::new();
        configure_gclk_set(&mut bus, GclkSet::EMPTY, &cfgs());
        assert!(bus.log.is_empty());
    }

    #[test]
    fn every_mask_hits_exactly_its_members() {
        let cfgs = cfgs();
        for bits in 0..(1u16 << NUM_GCLK) {
            let set = GclkSet::from_bits(bits);
            let mut bus = MockBus::new();
            configure_gclk_set(&mut bus, set, &cfgs);

            let expected: std::vec::Vec<usize> = set.iter().map(gclk::genctrl).collect();
            assert_eq!(bus.written_addrs(), expected, "mask {:#05x}", bits);
        }
    }

    #[test]
    fn output_frequency() {
        let lin = GclkConfig::new(GclkSrc::Dfll, 4);
        assert_eq!(lin.output_freq(48_000_000), 12_000_000);
        assert_eq!(GclkConfig::new(GclkSrc::Dfll, 0).output_freq(48_000_000), 48_000_000);

        let pow2 = GclkConfig {
            div_sel: DivSel::Pow2,
            ..GclkConfig::new(GclkSrc::Xosc32k, 4)
        };
        assert_eq!(pow2.output_freq(32_768), 1_024);
    }

    #[test]
    #[should_panic]
    fn with_past_mask_width() {
        let _ = GclkSet::EMPTY.with(16);
    }

    #[test]
    fn set_ops() {
        let a = GclkSet::EMPTY.with(0).with(2);
        let b = GclkSet::EMPTY.with(1).with(3);
        assert!(a.is_disjoint(b));
        assert!(!a.is_disjoint(b.with(2)));
        assert_eq!(a.union(b).bits(), 0b1111);
        assert_eq!(GclkSet::from_bits(0x3001).out_of_range().bits(), 0x3000);
        assert_eq!(a.iter().collect::<std::vec::Vec<_>>(), [0, 2]);
        // Representable, but rejected later by `ClockConfig::validate`.
        assert_eq!(GclkSet::EMPTY.with(15).out_of_range().bits(), 1 << 15);
    }
}
