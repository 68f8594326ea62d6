#![no_std]
#![no_main]

use panic_halt as _;
use atmega328p_hal::{
    drivers::SerialConsole,
    hal::{Eeprom, Mmio, Usart, UsartConfig},
};
use ufmt::uwriteln;

const BOOT_COUNTER: u16 = 0x0000;
const GREETING: u16 = 0x0010;

#[avr_device::entry]
fn main() -> ! {
    let regs = Mmio::take().unwrap();
    let usart = Usart::new(&regs);
    usart.init(&UsartConfig::default()).unwrap();
    let mut console = SerialConsole::new(usart);

    let eeprom = Eeprom::new(&regs);
    let boots = eeprom.read_byte(BOOT_COUNTER).unwrap_or(0).wrapping_add(1);
    eeprom.write_byte(BOOT_COUNTER, boots);
    uwriteln!(&mut console, "boot #{} (capacity {} bytes)", boots, eeprom.capacity()).ok();

    // Rewrites nothing once the text is stored
    let programmed = eeprom.update(GREETING, b"hello, eeprom");
    uwriteln!(&mut console, "greeting: {} bytes checked", programmed).ok();

    let mut buffer = [0u8; 13];
    eeprom.read(GREETING, &mut buffer);
    if let Ok(text) = core::str::from_utf8(&buffer) {
        console.write_line(text);
    }

    // Out of range writes are truncated, not faulted
    let written = eeprom.write(eeprom.capacity() as u16 - 2, &[1, 2, 3]);
    console.debug("written at end", written as u8);

    loop {
        avr_device::asm::sleep();
    }
}
