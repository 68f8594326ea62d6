//! TWI (I2C) master driver.
//!
//! Every bus step writes a command word to TWCR, busy-waits for TWINT and
//! reads the status code from TWSR. The composite transactions check each
//! status against the one the protocol expects; on a mismatch they release
//! the bus with a stop condition and hand the raw code back to the caller.

use super::register::{bit, clear_bit, wait_until, RegisterFile};
use super::registers::{
    TWBR, TWCR, TWDR, TWEA, TWEN, TWINT, TWPS0, TWPS1, TWSR, TWSR_STATUS_MASK, TWSTA, TWSTO,
};
use crate::config::{TWI_BIT_RATE_FAST, TWI_BIT_RATE_STANDARD};
use embedded_hal::blocking::i2c;

/// Clear TWINT and keep the peripheral enabled
const START_TRANSMISSION: u8 = bit(TWINT) | bit(TWEN);
const START_RECEIVING_ACK: u8 = START_TRANSMISSION | bit(TWEA);
const START_RECEIVING_NACK: u8 = START_TRANSMISSION;
const START_CONDITION: u8 = START_TRANSMISSION | bit(TWSTA);
const STOP_CONDITION: u8 = START_TRANSMISSION | bit(TWSTO);

/// SLA+R/W byte for a 7-bit slave address.
fn address_byte(slave: u8, read: bool) -> u8 {
    debug_assert!(slave <= 0x7F, "TWI slave address must be 7-bit");
    (slave & 0x7F) << 1 | read as u8
}

/// TWI speed presets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitRate {
    Standard100k,
    Fast400k,
}

impl BitRate {
    const fn twbr(self) -> u8 {
        match self {
            BitRate::Standard100k => TWI_BIT_RATE_STANDARD,
            BitRate::Fast400k => TWI_BIT_RATE_FAST,
        }
    }
}

/// Width of the register address sent after the slave address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterSize {
    One,
    Two,
}

/// TWI master-mode status codes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TwiStatus {
    BusError = 0x00,
    StartTransmitted = 0x08,
    RepStartTransmitted = 0x10,
    AddrWriteAck = 0x18,
    AddrWriteNack = 0x20,
    DataWriteAck = 0x28,
    DataWriteNack = 0x30,
    ArbitrationLost = 0x38,
    AddrReadAck = 0x40,
    AddrReadNack = 0x48,
    DataReadAck = 0x50,
    DataReadNack = 0x58,
    NoInfo = 0xF8,
}

impl TwiStatus {
    pub fn from_code(code: u8) -> Option<Self> {
        let status = match code {
            0x00 => TwiStatus::BusError,
            0x08 => TwiStatus::StartTransmitted,
            0x10 => TwiStatus::RepStartTransmitted,
            0x18 => TwiStatus::AddrWriteAck,
            0x20 => TwiStatus::AddrWriteNack,
            0x28 => TwiStatus::DataWriteAck,
            0x30 => TwiStatus::DataWriteNack,
            0x38 => TwiStatus::ArbitrationLost,
            0x40 => TwiStatus::AddrReadAck,
            0x48 => TwiStatus::AddrReadNack,
            0x50 => TwiStatus::DataReadAck,
            0x58 => TwiStatus::DataReadNack,
            0xF8 => TwiStatus::NoInfo,
            _ => return None,
        };
        Some(status)
    }

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// A transaction was aborted; carries the status code that ended it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiError {
    code: u8,
}

impl TwiError {
    /// Raw TWSR status bits
    pub const fn code(self) -> u8 {
        self.code
    }

    pub fn status(self) -> Option<TwiStatus> {
        TwiStatus::from_code(self.code)
    }
}

/// TWI peripheral driver
pub struct Twi<'a, R> {
    regs: &'a R,
}

impl<'a, R: RegisterFile> Twi<'a, R> {
    pub fn new(regs: &'a R) -> Self {
        Self { regs }
    }

    /// Prescaler 1, the bit rate for `rate` at 16MHz, peripheral enabled.
    pub fn init(&self, rate: BitRate) {
        clear_bit(self.regs, TWSR, TWPS1);
        clear_bit(self.regs, TWSR, TWPS0);
        self.regs.write(TWBR, rate.twbr());
        self.regs.write(TWCR, bit(TWEN));
    }

    /// Issue a (repeated) start condition and return the status code.
    pub fn send_start(&self) -> u8 {
        self.command(START_CONDITION)
    }

    /// Issue a stop condition. Does not wait for it to complete.
    pub fn send_stop(&self) {
        self.regs.write(TWCR, STOP_CONDITION);
    }

    pub fn transmit_byte(&self, byte: u8) -> u8 {
        self.regs.write(TWDR, byte);
        self.command(START_TRANSMISSION)
    }

    /// Clock in one byte; `ack_more` acknowledges it so the slave keeps
    /// sending, otherwise it is NACKed as the last byte.
    ///
    /// Returns `(status, data)`.
    pub fn receive_byte(&self, ack_more: bool) -> (u8, u8) {
        let status = self.command(if ack_more {
            START_RECEIVING_ACK
        } else {
            START_RECEIVING_NACK
        });
        (status, self.regs.read(TWDR))
    }

    /// Send a register address, high byte first for two-byte addresses.
    /// Stops after the high byte if it is not acknowledged.
    pub fn transmit_register_address(&self, reg: u16, size: RegisterSize) -> u8 {
        if size == RegisterSize::Two {
            let status = self.transmit_byte((reg >> 8) as u8);
            if status != TwiStatus::DataWriteAck.code() {
                return status;
            }
        }
        self.transmit_byte(reg as u8)
    }

    /// start, SLA+W, register address, `data`, stop.
    ///
    /// With empty `data` no stop condition is sent and the bus stays claimed
    /// for a following repeated start; [`Twi::read_memory`] relies on this.
    pub fn write_memory(
        &self,
        slave: u8,
        reg: u16,
        size: RegisterSize,
        data: &[u8],
    ) -> Result<(), TwiError> {
        self.require(self.send_start(), TwiStatus::StartTransmitted)?;
        self.require(
            self.transmit_byte(address_byte(slave, false)),
            TwiStatus::AddrWriteAck,
        )?;
        self.require(
            self.transmit_register_address(reg, size),
            TwiStatus::DataWriteAck,
        )?;
        self.transmit_all(data)?;

        if !data.is_empty() {
            self.send_stop();
        }
        Ok(())
    }

    /// Select `reg` with a data-less write, then repeated start, SLA+R and
    /// `data.len()` bytes, the last one NACKed, then stop.
    pub fn read_memory(
        &self,
        slave: u8,
        reg: u16,
        size: RegisterSize,
        data: &mut [u8],
    ) -> Result<(), TwiError> {
        self.write_memory(slave, reg, size, &[])?;

        self.require(self.send_start(), TwiStatus::RepStartTransmitted)?;
        self.require(
            self.transmit_byte(address_byte(slave, true)),
            TwiStatus::AddrReadAck,
        )?;
        self.receive_all(data)?;

        self.send_stop();
        Ok(())
    }

    /// Write the command word and wait for the hardware to finish the step.
    fn command(&self, control: u8) -> u8 {
        self.regs.write(TWCR, control);
        wait_until(self.regs, TWCR, TWINT, true);
        let status = self.regs.read(TWSR) & TWSR_STATUS_MASK;
        trace!("twi: command {=u8:#x} -> status {=u8:#x}", control, status);
        status
    }

    fn require(&self, status: u8, expected: TwiStatus) -> Result<(), TwiError> {
        if status == expected.code() {
            return Ok(());
        }
        warn!(
            "twi: expected status {=u8:#x}, got {=u8:#x}",
            expected.code(),
            status
        );
        self.send_stop();
        Err(TwiError { code: status })
    }

    fn transmit_all(&self, data: &[u8]) -> Result<(), TwiError> {
        for &byte in data {
            self.require(self.transmit_byte(byte), TwiStatus::DataWriteAck)?;
        }
        Ok(())
    }

    fn receive_all(&self, data: &mut [u8]) -> Result<(), TwiError> {
        let last = data.len().saturating_sub(1);
        for (i, slot) in data.iter_mut().enumerate() {
            let more = i < last;
            let (status, byte) = self.receive_byte(more);
            *slot = byte;
            let expected = if more {
                TwiStatus::DataReadAck
            } else {
                TwiStatus::DataReadNack
            };
            self.require(status, expected)?;
        }
        Ok(())
    }

    fn start_addressed(&self, address: u8, read: bool, repeated: bool) -> Result<(), TwiError> {
        let (started, acked) = match (repeated, read) {
            (false, false) => (TwiStatus::StartTransmitted, TwiStatus::AddrWriteAck),
            (false, true) => (TwiStatus::StartTransmitted, TwiStatus::AddrReadAck),
            (true, false) => (TwiStatus::RepStartTransmitted, TwiStatus::AddrWriteAck),
            (true, true) => (TwiStatus::RepStartTransmitted, TwiStatus::AddrReadAck),
        };
        self.require(self.send_start(), started)?;
        self.require(self.transmit_byte(address_byte(address, read)), acked)
    }
}

impl<'a, R: RegisterFile> i2c::Write for Twi<'a, R> {
    type Error = TwiError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.start_addressed(address, false, false)?;
        self.transmit_all(bytes)?;
        self.send_stop();
        Ok(())
    }
}

impl<'a, R: RegisterFile> i2c::Read for Twi<'a, R> {
    type Error = TwiError;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.start_addressed(address, true, false)?;
        self.receive_all(buffer)?;
        self.send_stop();
        Ok(())
    }
}

impl<'a, R: RegisterFile> i2c::WriteRead for Twi<'a, R> {
    type Error = TwiError;

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.start_addressed(address, false, false)?;
        self.transmit_all(bytes)?;
        self.start_addressed(address, true, true)?;
        self.receive_all(buffer)?;
        self.send_stop();
        Ok(())
    }
}
