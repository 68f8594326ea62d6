#![no_std]
#![no_main]

use panic_halt as _;
use atmega328p_hal::hal::{Gpio, Mmio, Pin, PinConfig, Port};

/// Roughly `ms` milliseconds at 16MHz
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
    let gpio = Gpio::new(&regs);

    // Arduino Uno on-board LED
    let led = Pin::new(Port::B, 5).unwrap();
    gpio.configure(led, PinConfig::OUTPUT).unwrap();

    loop {
        gpio.toggle(led).unwrap();
        delay_ms(500);
    }
}
