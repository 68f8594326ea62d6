pub mod register;
pub mod registers;

#[cfg(target_arch = "avr")]
pub mod mmio;

pub mod eeprom;
pub mod gpio;
pub mod power;
pub mod system;
pub mod twi;
pub mod usart;

// Re-export commonly used types
pub use eeprom::Eeprom;
pub use gpio::{Gpio, Pin, PinConfig, PinState, Port};
pub use power::{Module, Power, SleepMode};
pub use register::{Instructions, Reg, RegisterFile};
pub use system::{System, WatchdogConfig, WatchdogCycles, WatchdogMode};
pub use twi::{BitRate, RegisterSize, Twi, TwiError};
pub use usart::{Usart, UsartConfig, UsartError};

#[cfg(target_arch = "avr")]
pub use mmio::Mmio;
