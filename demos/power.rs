#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use panic_halt as _;
use atmega328p_hal::{
    drivers::SerialConsole,
    hal::{
        Gpio, Mmio, Module, Pin, PinConfig, Port, Power, SleepMode, System, Usart, UsartConfig,
        WatchdogConfig, WatchdogCycles, WatchdogMode,
    },
};

#[avr_device::interrupt(atmega328p)]
fn WDT() {}

#[avr_device::entry]
fn main() -> ! {
    let regs = Mmio::take().unwrap();
    let power = Power::new(&regs);
    let system = System::new(&regs);

    for module in [Module::Adc, Module::Spi, Module::Timer1, Module::Timer2, Module::Twi] {
        power.set_module_power(module, false);
    }

    let usart = Usart::new(&regs);
    usart.init(&UsartConfig::default()).unwrap();
    let mut console = SerialConsole::new(usart);

    let gpio = Gpio::new(&regs);
    let led = Pin::new(Port::B, 5).unwrap();
    gpio.configure(led, PinConfig::OUTPUT).unwrap();

    // Interrupt-only watchdog as a 1s wake-up source; also enables interrupts
    system.set_watchdog(WatchdogConfig {
        mode: WatchdogMode::Interrupt,
        cycles: WatchdogCycles::S1,
    });

    loop {
        console.write_line("sleeping");
        // Let the last byte leave the shift register before the clock stops
        for _ in 0..20000u16 {
            avr_device::asm::nop();
        }
        power.set_sleep_mode(SleepMode::PowerDown);
        gpio.toggle(led).unwrap();
    }
}
