//! Flash (NVM) read wait states.
//!
//! The CPU must never fetch from flash faster than the array can deliver. Raise the wait
//! states before speeding the clock up, and lower them only once it's already slower;
//! `ClockTree::apply` handles that ordering.

use crate::{reg_access::RegisterAccess, regs::nvmctrl};

/// The largest value the 4-bit RWS field holds.
pub const MAX_WAIT_STATES: u8 = 15;

// Maximum CPU frequency for 0, 1, 2, ... wait states, with VDD above 2.7V.
// Datasheet, NVM characteristics table.
const WS_LIMITS: [u32; 5] = [24_000_000, 51_000_000, 77_000_000, 101_000_000, 119_000_000];

/// Set the number of flash read wait states. Only the RWS field of NVMCTRL.CTRLA is
/// modified.
///
/// Panics if `count` is larger than [`MAX_WAIT_STATES`]; that's a malformed configuration,
/// not something to recover from.
pub fn set_wait_states<R: RegisterAccess>(regs: &mut R, count: u8) {
    assert!(
        count <= MAX_WAIT_STATES,
        "Flash wait states must fit in the RWS field (0 - 15)."
    );

    regs.modify16(
        nvmctrl::CTRLA,
        nvmctrl::RWS_MASK,
        nvmctrl::rws(count as u16),
    );
    // The new setting must be in effect before the clock changes.
    regs.barrier();

    debug!("flash: {} wait states", count);
}

/// Read back the wait states currently in effect.
pub fn wait_states<R: RegisterAccess>(regs: &mut R) -> u8 {
    ((regs.read16(nvmctrl::CTRLA) & nvmctrl::RWS_MASK) >> nvmctrl::RWS_SHIFT) as u8
}

/// The fewest wait states that are safe with the CPU running at `hz`.
pub const fn wait_states_for(hz: u32) -> u8 {
    let mut ws = 0;
    while ws < WS_LIMITS.len() {
        if hz <= WS_LIMITS[ws] {
            return ws as u8;
        }
        ws += 1;
    }
    WS_LIMITS.len() as u8
}
