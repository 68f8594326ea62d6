#![no_std]
#![no_main]

use panic_halt as _;
use atmega328p_hal::{
    drivers::SerialConsole,
    hal::{Mmio, Usart, UsartConfig},
};

#[avr_device::entry]
fn main() -> ! {
    let regs = Mmio::take().unwrap();
    let usart = Usart::new(&regs);
    usart.init(&UsartConfig::default()).unwrap();

    let mut console = SerialConsole::new(usart);
    console.write_line("ATmega328P echo, 9600 8N1");

    loop {
        let c = console.read_char();
        if c == b'\r' {
            console.write_char(b'\n');
        } else {
            console.write_char(c);
        }
    }
}
