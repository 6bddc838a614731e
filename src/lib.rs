//! Clock tree configuration for the Microchip SAMD5x/SAME5x family.
//!
//! Describe the oscillators, generic clock generators, CPU divider, and flash wait states
//! you want in a [`clocks::ClockConfig`], then apply it with a [`clocks::ClockTree`]:
//!
//! ```no_run
//! use samd5x_clocks::{clocks::{ClockConfig, ClockTree}, reg_access::Mmio};
//!
//! static CLOCKS: ClockConfig = ClockConfig::power_up();
//!
//! let mut tree = ClockTree::new(unsafe { Mmio::steal() });
//! tree.initialize(&CLOCKS).unwrap();
//! ```
//!
//! Register access goes through the [`reg_access::RegisterAccess`] trait, so the
//! sequencing can run against something other than the hardware.

#![cfg_attr(not(test), no_std)]

// Must come first, so the logging macros are visible to the rest of the crate.
#[macro_use]
mod fmt;
#[macro_use]
mod macros;

pub mod clocks;
pub mod error;
pub mod flash;
pub mod reg_access;
pub mod regs;

pub use error::{Error, Result};
