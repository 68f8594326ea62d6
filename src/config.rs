//! Configuration constants for the ATmega328P HAL

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// Default USART baud rate
pub const USART_BAUD: u32 = 9600;

/// EEPROM capacity in bytes
///
/// The ATmega328P carries 1 KiB of EEPROM; smaller parts of the family can
/// hand their own size to [`Eeprom::with_capacity`](crate::hal::Eeprom::with_capacity).
pub const EEPROM_SIZE: usize = 1024;

/// TWBR value for 100kHz SCL with a prescaler of 1 at 16MHz
pub const TWI_BIT_RATE_STANDARD: u8 = 72;

/// TWBR value for 400kHz SCL with a prescaler of 1 at 16MHz
pub const TWI_BIT_RATE_FAST: u8 = 12;
