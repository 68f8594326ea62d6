//! Blocking byte access to the on-chip EEPROM.
//!
//! Out-of-range requests are not errors: `read`, `write` and `update` stop at
//! the first address past the end and return how many bytes they handled.

use super::register::{bit, wait_until, RegisterFile};
use super::registers::{EEARH, EEARL, EECR, EEDR, EEMPE, EEPE, EEPM0, EEPM1, EERE, EERIE};
use crate::config::EEPROM_SIZE;

/// EEAR is 16 bits wide
const ADDRESS_SPACE: usize = 0x1_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProgrammingMode {
    /// Erase and write in one operation
    Atomic,
    EraseOnly,
    WriteOnly,
}

impl ProgrammingMode {
    /// EEPM1:0 field value
    const fn bits(self) -> u8 {
        match self {
            ProgrammingMode::Atomic => 0,
            ProgrammingMode::EraseOnly => bit(EEPM0),
            ProgrammingMode::WriteOnly => bit(EEPM1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EepromSettings {
    pub mode: ProgrammingMode,
    /// Raise EE_READY while no write is pending
    pub interrupt: bool,
}

impl Default for EepromSettings {
    fn default() -> Self {
        Self {
            mode: ProgrammingMode::Atomic,
            interrupt: false,
        }
    }
}

pub struct Eeprom<'a, R> {
    regs: &'a R,
    capacity: usize,
}

impl<'a, R: RegisterFile> Eeprom<'a, R> {
    pub fn new(regs: &'a R) -> Self {
        Self::with_capacity(regs, EEPROM_SIZE)
    }

    /// Capacities beyond the 16-bit address space are clamped to it.
    pub fn with_capacity(regs: &'a R, capacity: usize) -> Self {
        Self {
            regs,
            capacity: capacity.min(ADDRESS_SPACE),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Write the programming mode and ready-interrupt enable.
    pub fn set_mode(&self, settings: EepromSettings) {
        self.wait_ready();

        let mut eecr = self.regs.read(EECR);
        eecr &= !(bit(EEPM1) | bit(EEPM0) | bit(EERIE) | bit(EEMPE));
        eecr |= settings.mode.bits();
        if settings.interrupt {
            eecr |= bit(EERIE);
        }
        self.regs.write(EECR, eecr);
    }

    /// Read from `address` into `data`; returns the number of bytes read.
    pub fn read(&self, address: u16, data: &mut [u8]) -> usize {
        for (i, slot) in data.iter_mut().enumerate() {
            let Some(target) = self.in_range(address, i) else {
                return i;
            };
            self.wait_ready();
            self.set_address(target);
            let eecr = self.regs.read(EECR);
            self.regs.write(EECR, eecr | bit(EERE));
            *slot = self.regs.read(EEDR);
        }
        data.len()
    }

    /// Write `data` starting at `address`; returns the number of bytes written.
    pub fn write(&self, address: u16, data: &[u8]) -> usize {
        for (i, &byte) in data.iter().enumerate() {
            let Some(target) = self.in_range(address, i) else {
                return i;
            };
            self.program(target, byte);
        }
        data.len()
    }

    /// Like [`Eeprom::write`], but skips cells that already hold the value.
    pub fn update(&self, address: u16, data: &[u8]) -> usize {
        for (i, &byte) in data.iter().enumerate() {
            let Some(target) = self.in_range(address, i) else {
                return i;
            };
            let mut current = [0u8];
            self.read(target, &mut current);
            if current[0] != byte {
                self.program(target, byte);
            }
        }
        data.len()
    }

    pub fn read_byte(&self, address: u16) -> Option<u8> {
        let mut byte = [0u8];
        (self.read(address, &mut byte) == 1).then_some(byte[0])
    }

    pub fn write_byte(&self, address: u16, value: u8) -> bool {
        self.write(address, &[value]) == 1
    }

    fn in_range(&self, address: u16, offset: usize) -> Option<u16> {
        let target = address as usize + offset;
        if target < self.capacity {
            Some(target as u16)
        } else {
            trace!("eeprom: address {} out of range", target);
            None
        }
    }

    fn wait_ready(&self) {
        wait_until(self.regs, EECR, EEPE, false);
    }

    fn set_address(&self, address: u16) {
        self.regs.write(EEARH, (address >> 8) as u8);
        self.regs.write(EEARL, address as u8);
    }

    /// Arm with EEMPE, then fire with EEPE. The hardware drops the write
    /// unless EEPE follows EEMPE within four cycles, so both values are
    /// computed up front and written back to back.
    fn program(&self, address: u16, byte: u8) {
        self.wait_ready();
        self.set_address(address);
        self.regs.write(EEDR, byte);

        let armed = (self.regs.read(EECR) | bit(EEMPE)) & !bit(EEPE);
        self.regs.write(EECR, armed);
        self.regs.write(EECR, armed | bit(EEPE));
    }
}
