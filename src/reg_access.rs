//! Register access used by the clock drivers.
//!
//! The drivers never dereference addresses themselves; they go through
//! [`RegisterAccess`]. On hardware this is [`Mmio`]. Tests use a recording bus, which
//! lets them check the order register writes happen in.

use core::hint::spin_loop;

/// Byte, halfword, and word access to memory-mapped registers at absolute addresses.
///
/// Implementations may assume they have exclusive access to the clock registers for the
/// duration of a call; nothing here locks.
pub trait RegisterAccess {
    fn read8(&mut self, addr: usize) -> u8;
    fn read16(&mut self, addr: usize) -> u16;
    fn read32(&mut self, addr: usize) -> u32;

    fn write8(&mut self, addr: usize, value: u8);
    fn write16(&mut self, addr: usize, value: u16);
    fn write32(&mut self, addr: usize, value: u32);

    /// Clear the bits in `clear`, then set the bits in `set`, leaving the rest untouched.
    fn modify16(&mut self, addr: usize, clear: u16, set: u16) {
        let val = self.read16(addr);
        self.write16(addr, (val & !clear) | set);
    }

    /// Clear the bits in `clear`, then set the bits in `set`, leaving the rest untouched.
    fn modify32(&mut self, addr: usize, clear: u32, set: u32) {
        let val = self.read32(addr);
        self.write32(addr, (val & !clear) | set);
    }

    /// Block until any bit of `mask` reads as set in the word at `addr`.
    ///
    /// There is no timeout: an oscillator that never starts hangs here. Override this to
    /// bound the wait if your environment needs it.
    fn wait_until_set(&mut self, addr: usize, mask: u32) {
        while self.read32(addr) & mask == 0 {
            spin_loop();
        }
    }

    /// Make sure preceding writes have completed before continuing. Called after changing
    /// flash wait states, before any clock source is touched.
    fn barrier(&mut self) {}
}

/// Volatile access to the real peripheral registers.
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Take access to the clock registers.
    ///
    /// # Safety
    /// Only one `Mmio` may be driving the clock peripherals at a time, and only on a
    /// SAMD5x/E5x, where the addresses in `regs` are valid.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl RegisterAccess for Mmio {
    fn read8(&mut self, addr: usize) -> u8 {
        unsafe { core::ptr::read_volatile(addr as *const u8) }
    }

    fn read16(&mut self, addr: usize) -> u16 {
        unsafe { core::ptr::read_volatile(addr as *const u16) }
    }

    fn read32(&mut self, addr: usize) -> u32 {
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    fn write8(&mut self, addr: usize, value: u8) {
        unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
    }

    fn write16(&mut self, addr: usize, value: u16) {
        unsafe { core::ptr::write_volatile(addr as *mut u16, value) }
    }

    fn write32(&mut self, addr: usize, value: u32) {
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }

    fn barrier(&mut self) {
        #[cfg(target_arch = "arm")]
        {
            cortex_m::asm::dsb();
            cortex_m::asm::isb();
        }
    }
}

/// A register bus backed by a map, which records every access in order.
#[cfg(test)]
pub(crate) mod mock {
    use std::{collections::BTreeMap, vec::Vec};

    use super::RegisterAccess;
    use crate::regs::{osc32kctrl, oscctrl};

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Access {
        Read { addr: usize },
        Write { addr: usize, value: u32 },
    }

    pub struct MockBus {
        pub mem: BTreeMap<usize, u32>,
        pub log: Vec<Access>,
    }

    impl MockBus {
        /// A bus where every oscillator reports ready.
        pub fn new() -> Self {
            let mut mem = BTreeMap::new();
            mem.insert(oscctrl::STATUS, 0xFFFF_FFFF);
            mem.insert(osc32kctrl::STATUS, 0xFFFF_FFFF);
            Self {
                mem,
                log: Vec::new(),
            }
        }

        pub fn get(&self, addr: usize) -> u32 {
            self.mem.get(&addr).copied().unwrap_or(0)
        }

        /// Writes only, as `(addr, value)`, in the order they happened.
        pub fn writes(&self) -> Vec<(usize, u32)> {
            self.log
                .iter()
                .filter_map(|a| match *a {
                    Access::Write { addr, value } => Some((addr, value)),
                    Access::Read { .. } => None,
                })
                .collect()
        }

        /// Addresses written, in order.
        pub fn written_addrs(&self) -> Vec<usize> {
            self.writes().into_iter().map(|(a, _)| a).collect()
        }

        pub fn clear_log(&mut self) {
            self.log.clear();
        }

        fn read(&mut self, addr: usize) -> u32 {
            self.log.push(Access::Read { addr });
            self.get(addr)
        }

        fn write(&mut self, addr: usize, value: u32) {
            self.log.push(Access::Write { addr, value });
            self.mem.insert(addr, value);
        }
    }

    impl RegisterAccess for MockBus {
        fn read8(&mut self, addr: usize) -> u8 {
            self.read(addr) as u8
        }

        fn read16(&mut self, addr: usize) -> u16 {
            self.read(addr) as u16
        }

        fn read32(&mut self, addr: usize) -> u32 {
            self.read(addr)
        }

        fn write8(&mut self, addr: usize, value: u8) {
            self.write(addr, value as u32)
        }

        fn write16(&mut self, addr: usize, value: u16) {
            self.write(addr, value as u32)
        }

        fn write32(&mut self, addr: usize, value: u32) {
            self.write(addr, value)
        }
    }
}
