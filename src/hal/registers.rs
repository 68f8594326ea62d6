//! ATmega328P register addresses and bit positions.
//!
//! Addresses are data-space addresses (I/O space + 0x20), bit positions are
//! as named in the data sheet.

use super::register::Reg;

// I/O ports
pub const PINB: Reg = Reg(0x23);
pub const DDRB: Reg = Reg(0x24);
pub const PORTB: Reg = Reg(0x25);
pub const PINC: Reg = Reg(0x26);
pub const DDRC: Reg = Reg(0x27);
pub const PORTC: Reg = Reg(0x28);
pub const PIND: Reg = Reg(0x29);
pub const DDRD: Reg = Reg(0x2A);
pub const PORTD: Reg = Reg(0x2B);

// EEPROM
pub const EECR: Reg = Reg(0x3F);
pub const EEDR: Reg = Reg(0x40);
pub const EEARL: Reg = Reg(0x41);
pub const EEARH: Reg = Reg(0x42);

pub const EERE: u8 = 0;
pub const EEPE: u8 = 1;
pub const EEMPE: u8 = 2;
pub const EERIE: u8 = 3;
pub const EEPM0: u8 = 4;
pub const EEPM1: u8 = 5;

// Sleep mode control
pub const SMCR: Reg = Reg(0x53);

pub const SE: u8 = 0;
pub const SM0: u8 = 1;

// MCU status (reset cause)
pub const MCUSR: Reg = Reg(0x54);

pub const PORF: u8 = 0;
pub const EXTRF: u8 = 1;
pub const BORF: u8 = 2;
pub const WDRF: u8 = 3;

// Status register
pub const SREG: Reg = Reg(0x5F);

pub const SREG_I: u8 = 7;

// Watchdog
pub const WDTCSR: Reg = Reg(0x60);

pub const WDP0: u8 = 0;
pub const WDE: u8 = 3;
pub const WDCE: u8 = 4;
pub const WDP3: u8 = 5;
pub const WDIE: u8 = 6;

// Power reduction
pub const PRR: Reg = Reg(0x64);

// TWI
pub const TWBR: Reg = Reg(0xB8);
pub const TWSR: Reg = Reg(0xB9);
pub const TWDR: Reg = Reg(0xBB);
pub const TWCR: Reg = Reg(0xBC);

pub const TWPS0: u8 = 0;
pub const TWPS1: u8 = 1;
/// Status bits TWS7..TWS3 of TWSR
pub const TWSR_STATUS_MASK: u8 = 0xF8;

pub const TWEN: u8 = 2;
pub const TWSTO: u8 = 4;
pub const TWSTA: u8 = 5;
pub const TWEA: u8 = 6;
pub const TWINT: u8 = 7;

// USART0
pub const UCSR0A: Reg = Reg(0xC0);
pub const UCSR0B: Reg = Reg(0xC1);
pub const UCSR0C: Reg = Reg(0xC2);
pub const UBRR0L: Reg = Reg(0xC4);
pub const UBRR0H: Reg = Reg(0xC5);
pub const UDR0: Reg = Reg(0xC6);

pub const U2X0: u8 = 1;
pub const UPE0: u8 = 2;
pub const DOR0: u8 = 3;
pub const FE0: u8 = 4;
pub const UDRE0: u8 = 5;
pub const RXC0: u8 = 7;

pub const UCSZ02: u8 = 2;
pub const TXEN0: u8 = 3;
pub const RXEN0: u8 = 4;

pub const UCSZ00: u8 = 1;
pub const UCSZ01: u8 = 2;
pub const USBS0: u8 = 3;
pub const UPM00: u8 = 4;
pub const UPM01: u8 = 5;
pub const UMSEL00: u8 = 6;
pub const UMSEL01: u8 = 7;
