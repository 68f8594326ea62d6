#![no_std]
#![no_main]

use panic_halt as _;
use atmega328p_hal::{
    drivers::SerialConsole,
    hal::{BitRate, Mmio, RegisterSize, Twi, Usart, UsartConfig},
};
use ufmt::uwriteln;

/// 24C32 with A2..A0 tied low
const AT24C32: u8 = 0x50;

#[avr_device::entry]
fn main() -> ! {
    let regs = Mmio::take().unwrap();
    let usart = Usart::new(&regs);
    usart.init(&UsartConfig::default()).unwrap();
    let mut console = SerialConsole::new(usart);

    let twi = Twi::new(&regs);
    twi.init(BitRate::Standard100k);

    match twi.write_memory(AT24C32, 0x0100, RegisterSize::Two, b"twi ok") {
        Ok(()) => console.write_line("page written"),
        Err(e) => console.debug("write failed, status", e.code()),
    }

    // Write cycle takes up to 10ms; poll for the address ACK
    while twi.write_memory(AT24C32, 0x0100, RegisterSize::Two, &[]).is_err() {}
    twi.send_stop();

    let mut buffer = [0u8; 6];
    match twi.read_memory(AT24C32, 0x0100, RegisterSize::Two, &mut buffer) {
        Ok(()) => {
            for byte in buffer {
                console.write_hex(byte);
                console.write_char(b' ');
            }
            console.write_char(b'\n');
        }
        Err(e) => {
            uwriteln!(&mut console, "read failed: {:?}", e.code()).ok();
        }
    }

    loop {
        avr_device::asm::sleep();
    }
}
