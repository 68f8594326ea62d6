//! Register-level hardware abstraction for the ATmega328P.
//!
//! Every driver borrows a [`RegisterFile`](hal::RegisterFile) instead of
//! naming memory-mapped registers directly. On the AVR target that is
//! [`hal::Mmio`]; on the host it is `testing::MockRegisters` (feature
//! `testing`), so the same driver code runs in unit tests.
//!
//! ```ignore
//! let regs = Mmio::take().unwrap();
//! let gpio = Gpio::new(&regs);
//! let led = Pin::new(Port::B, 5)?;
//! gpio.configure(led, PinConfig::OUTPUT);
//! gpio.toggle(led);
//! ```
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod drivers;
pub mod hal;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use drivers::SerialConsole;
pub use hal::{
    Eeprom, Gpio, Pin, PinConfig, PinState, Port, Power, System, Twi, Usart, UsartConfig,
};
