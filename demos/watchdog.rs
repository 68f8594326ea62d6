#![no_std]
#![no_main]

use panic_halt as _;
use atmega328p_hal::{
    drivers::SerialConsole,
    hal::{Mmio, System, Usart, UsartConfig, WatchdogConfig, WatchdogCycles, WatchdogMode},
};

fn delay_ms(ms: u16) {
    for _ in 0..ms {
        for _ in 0..4000u16 {
            avr_device::asm::nop();
        }
    }
}

#[avr_device::entry]
fn main() -> ! {
    let regs = Mmio::take().unwrap();
    let system = System::new(&regs);

    // Read first: a pending WDRF keeps the watchdog forced on
    let cause = system.reset_cause();
    system.set_watchdog(WatchdogConfig::DISABLED);

    let usart = Usart::new(&regs);
    usart.init(&UsartConfig::default()).unwrap();
    let mut console = SerialConsole::new(usart);
    console.debug("MCUSR", cause.bits());
    if cause.watchdog() {
        console.write_line("last reset: watchdog");
    }

    system.set_watchdog(WatchdogConfig {
        mode: WatchdogMode::Reset,
        cycles: WatchdogCycles::S2,
    });

    for round in 0..10u8 {
        console.debug("feeding", round);
        system.reset_watchdog();
        delay_ms(500);
    }

    console.write_line("starving the watchdog");
    loop {}
}
