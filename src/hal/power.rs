use super::register::{bit, clear_bit, set_bit, write_bit, Instructions, RegisterFile};
use super::registers::{PRR, SE, SMCR, SM0};

/// SM2:0 encodings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SleepMode {
    Idle = 0,
    AdcNoiseReduction = 1,
    PowerDown = 2,
    PowerSave = 3,
    Standby = 6,
    ExtendedStandby = 7,
}

/// Peripherals gated by the power reduction register, by PRR bit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Module {
    Adc = 0,
    Usart0 = 1,
    Spi = 2,
    Timer1 = 3,
    Timer0 = 5,
    Timer2 = 6,
    Twi = 7,
}

pub struct Power<'a, R> {
    regs: &'a R,
}

impl<'a, R: RegisterFile + Instructions> Power<'a, R> {
    pub fn new(regs: &'a R) -> Self {
        Self { regs }
    }

    /// Select `mode`, sleep until an interrupt wakes the core, then clear
    /// the sleep enable bit again.
    ///
    /// Returns only after wake-up; with interrupts disabled and no wake
    /// source configured this never returns.
    pub fn set_sleep_mode(&self, mode: SleepMode) {
        self.regs.write(SMCR, (mode as u8) << SM0);
        set_bit(self.regs, SMCR, SE);
        debug!("power: sleeping in {}", mode);
        self.regs.sleep();
        clear_bit(self.regs, SMCR, SE);
    }

    /// `on` clears the module's PRR bit so its clock runs.
    pub fn set_module_power(&self, module: Module, on: bool) {
        write_bit(self.regs, PRR, module as u8, !on);
    }

    pub fn is_powered(&self, module: Module) -> bool {
        self.regs.read(PRR) & bit(module as u8) == 0
    }
}
