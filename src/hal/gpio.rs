//! Digital I/O for ports B, C and D.
//!
//! Each pin is driven by one bit in three registers: DDRx (direction), PORTx
//! (output level, or pull-up select while input) and PINx (input snapshot).
//! Together DDRx and PORTx encode four [`ElectricalState`]s; [`Gpio::configure`]
//! orders its writes so a pin never passes through an undefined state on the
//! way from one to another.

use super::register::{bit, clear_bit, set_bit, write_bit, Reg, RegisterFile};
use super::registers::{DDRB, DDRC, DDRD, PINB, PINC, PIND, PORTB, PORTC, PORTD};
use core::convert::Infallible;
use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// Pin index above 7
    PinOutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    B,
    C,
    D,
}

impl Port {
    #[inline]
    pub const fn ddr(self) -> Reg {
        match self {
            Port::B => DDRB,
            Port::C => DDRC,
            Port::D => DDRD,
        }
    }

    #[inline]
    pub const fn port(self) -> Reg {
        match self {
            Port::B => PORTB,
            Port::C => PORTC,
            Port::D => PORTD,
        }
    }

    #[inline]
    pub const fn pin(self) -> Reg {
        match self {
            Port::B => PINB,
            Port::C => PINC,
            Port::D => PIND,
        }
    }
}

/// A (port, index) pair. Only used to compute register addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin {
    port: Port,
    index: u8,
}

impl Pin {
    pub const fn new(port: Port, index: u8) -> Result<Self, GpioError> {
        if index > 7 {
            return Err(GpioError::PinOutOfRange);
        }
        Ok(Self { port, index })
    }

    #[inline]
    pub const fn port(self) -> Port {
        self.port
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.index
    }

    #[inline]
    const fn mask(self) -> u8 {
        bit(self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Output,
    Input,
}

/// Target configuration for [`Gpio::configure`].
///
/// `pull_up` only matters for inputs; a driven output has no pull resistor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    pub direction: Direction,
    pub pull_up: bool,
}

impl PinConfig {
    pub const OUTPUT: Self = Self {
        direction: Direction::Output,
        pull_up: false,
    };
    pub const INPUT_PULL_UP: Self = Self {
        direction: Direction::Input,
        pull_up: true,
    };
    pub const INPUT_FLOATING: Self = Self {
        direction: Direction::Input,
        pull_up: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    Low,
    High,
}

impl From<bool> for PinState {
    fn from(high: bool) -> Self {
        if high {
            PinState::High
        } else {
            PinState::Low
        }
    }
}

/// The four states a DDRx/PORTx bit pair can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ElectricalState {
    OutputLow,
    OutputHigh,
    InputPullUp,
    InputFloating,
}

impl ElectricalState {
    pub const fn from_bits(direction: bool, level: bool) -> Self {
        match (direction, level) {
            (true, false) => ElectricalState::OutputLow,
            (true, true) => ElectricalState::OutputHigh,
            (false, true) => ElectricalState::InputPullUp,
            (false, false) => ElectricalState::InputFloating,
        }
    }

    /// `(direction, level)` bit pair
    pub const fn bits(self) -> (bool, bool) {
        match self {
            ElectricalState::OutputLow => (true, false),
            ElectricalState::OutputHigh => (true, true),
            ElectricalState::InputPullUp => (false, true),
            ElectricalState::InputFloating => (false, false),
        }
    }
}

/// GPIO driver for all three ports.
pub struct Gpio<'a, R> {
    regs: &'a R,
}

impl<'a, R: RegisterFile> Gpio<'a, R> {
    pub fn new(regs: &'a R) -> Self {
        Self { regs }
    }

    /// Move `pin` to the state described by `config`.
    ///
    /// DDRx and PORTx are sampled once on entry and every decision is made
    /// against that snapshot, so an interrupt touching the same port halfway
    /// through cannot change which path is taken.
    ///
    /// - to output: a pull-up left in PORTx is cleared first, so the pin
    ///   comes up driving low rather than high.
    /// - to input with pull-up: an output-low pin is first driven high, then
    ///   released.
    /// - to input without pull-up: an output-high pin is first driven low,
    ///   then released.
    pub fn configure(&self, pin: Pin, config: PinConfig) -> Result<(), GpioError> {
        let ddr = pin.port.ddr();
        let port = pin.port.port();
        let n = pin.index;

        let ddr_value = self.regs.read(ddr);
        let port_value = self.regs.read(port);
        let from = ElectricalState::from_bits(
            ddr_value & pin.mask() != 0,
            port_value & pin.mask() != 0,
        );
        trace!("gpio: configure {} from {}", pin, from);

        match config.direction {
            Direction::Output => {
                if from == ElectricalState::InputPullUp {
                    clear_bit(self.regs, port, n);
                }
                set_bit(self.regs, ddr, n);
            }
            Direction::Input if config.pull_up => {
                if from == ElectricalState::OutputLow {
                    set_bit(self.regs, port, n);
                }
                clear_bit(self.regs, ddr, n);
                set_bit(self.regs, port, n);
            }
            Direction::Input => {
                if from == ElectricalState::OutputHigh {
                    set_bit(self.regs, ddr, n);
                    clear_bit(self.regs, port, n);
                }
                clear_bit(self.regs, ddr, n);
                clear_bit(self.regs, port, n);
            }
        }

        Ok(())
    }

    /// Drive the output level. On an input pin this switches the pull-up.
    pub fn write(&self, pin: Pin, state: PinState) -> Result<(), GpioError> {
        write_bit(self.regs, pin.port.port(), pin.index, state == PinState::High);
        Ok(())
    }

    pub fn toggle(&self, pin: Pin) -> Result<(), GpioError> {
        invert_via_snapshot(self.regs, pin);
        Ok(())
    }

    /// Instantaneous level from PINx.
    pub fn read(&self, pin: Pin) -> Result<PinState, GpioError> {
        Ok(PinState::from(self.regs.read(pin.port.pin()) & pin.mask() != 0))
    }

    /// Current DDRx/PORTx state of `pin`.
    pub fn state(&self, pin: Pin) -> ElectricalState {
        ElectricalState::from_bits(
            self.regs.read(pin.port.ddr()) & pin.mask() != 0,
            self.regs.read(pin.port.port()) & pin.mask() != 0,
        )
    }

    /// `embedded-hal` handle for a single pin.
    pub fn pin(&self, pin: Pin) -> GpioPin<'a, R> {
        GpioPin {
            regs: self.regs,
            pin,
        }
    }
}

/// Invert PORTx[n] by writing a one to PINx[n].
///
/// Writing PINx is a hardware toggle, not a store: only the target bit may be
/// written as one, so this is a plain write and never a read-modify-write.
#[inline]
pub fn invert_via_snapshot<R: RegisterFile + ?Sized>(regs: &R, pin: Pin) {
    regs.write(pin.port.pin(), pin.mask());
}

/// Single pin bound to a register file, for use with `embedded-hal` drivers.
pub struct GpioPin<'a, R> {
    regs: &'a R,
    pin: Pin,
}

impl<'a, R: RegisterFile> GpioPin<'a, R> {
    pub fn id(&self) -> Pin {
        self.pin
    }

    pub fn configure(&mut self, config: PinConfig) -> Result<(), GpioError> {
        Gpio::new(self.regs).configure(self.pin, config)
    }
}

impl<'a, R: RegisterFile> OutputPin for GpioPin<'a, R> {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        clear_bit(self.regs, self.pin.port.port(), self.pin.index);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        set_bit(self.regs, self.pin.port.port(), self.pin.index);
        Ok(())
    }
}

impl<'a, R: RegisterFile> StatefulOutputPin for GpioPin<'a, R> {
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.regs.read(self.pin.port.port()) & self.pin.mask() != 0)
    }

    fn is_set_low(&self) -> Result<bool, Self::Error> {
        self.is_set_high().map(|high| !high)
    }
}

impl<'a, R: RegisterFile> ToggleableOutputPin for GpioPin<'a, R> {
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Self::Error> {
        invert_via_snapshot(self.regs, self.pin);
        Ok(())
    }
}

impl<'a, R: RegisterFile> InputPin for GpioPin<'a, R> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.regs.read(self.pin.port.pin()) & self.pin.mask() != 0)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
