//! CPU clock divider (MCLK.CPUDIV).

use crate::{reg_access::RegisterAccess, regs::mclk};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// Division of GCLK0 to get the CPU clock. Sets the MCLK_CPUDIV register. The encoding is
/// one-hot, so the register value is also the divisor.
pub enum CpuDiv {
    Div1 = 0x01,
    Div2 = 0x02,
    Div4 = 0x04,
    Div8 = 0x08,
    Div16 = 0x10,
    Div32 = 0x20,
    Div64 = 0x40,
    Div128 = 0x80,
}

impl CpuDiv {
    pub fn value(&self) -> u32 {
        *self as u32
    }
}

/// Write the CPU divider. It takes effect immediately; there's nothing to wait on.
pub fn set_cpu_div<R: RegisterAccess>(regs: &mut R, div: CpuDiv) {
    regs.write8(mclk::CPUDIV, div as u8);
    trace!("mclk: cpu div {}", div.value());
}
