//! Brings the clock tree up from reset: the 32 kHz crystal, then GCLK0 from the DFLL at
//! 48 MHz, with a 32 kHz generator for the RTC and peripherals. Prints the result over RTT.

#![deny(warnings)]
#![no_std]
#![no_main]

use cortex_m_rt::entry;

use hal::{
    clocks::{ClockConfig, ClockTree, GclkConfig, GclkSrc, Xosc32kConfig},
    reg_access::Mmio,
};

use panic_probe as _;

static POWER_UP: ClockConfig = ClockConfig::power_up();

fn board_clocks() -> ClockConfig {
    let mut cfg = ClockConfig {
        xosc32k: Some(Xosc32kConfig::default()),
        ..ClockConfig::power_up()
    };
    cfg.gclk[3] = GclkConfig::new(GclkSrc::Xosc32k, 1);
    cfg.gclk_post = cfg.gclk_post.with(3);
    cfg
}

#[entry]
fn main() -> ! {
    rtt_target::rtt_init_defmt!();

    // Safety: nothing else in this program touches the clock registers.
    let mut clocks = ClockTree::new(unsafe { Mmio::steal() });
    clocks.initialize(&POWER_UP).unwrap();
    clocks.apply(&board_clocks()).unwrap();

    defmt::println!("CPU running at {} Hz", clocks.cpu_frequency());

    loop {
        cortex_m::asm::wfi();
    }
}

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
