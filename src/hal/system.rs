//! Reset cause and watchdog timer.

use super::register::{bit, clear_bit, Instructions, RegisterFile};
use super::registers::{BORF, EXTRF, MCUSR, PORF, WDCE, WDE, WDIE, WDP0, WDP3, WDRF, WDTCSR};

/// Decoded MCUSR flags as returned by [`System::get_reset_status`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetCause(u8);

impl ResetCause {
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn power_on(self) -> bool {
        self.0 & bit(PORF) != 0
    }

    pub const fn external(self) -> bool {
        self.0 & bit(EXTRF) != 0
    }

    pub const fn brown_out(self) -> bool {
        self.0 & bit(BORF) != 0
    }

    pub const fn watchdog(self) -> bool {
        self.0 & bit(WDRF) != 0
    }

    /// No flag set: nothing happened since the last read.
    pub const fn is_empty(self) -> bool {
        self.0 & (bit(PORF) | bit(EXTRF) | bit(BORF) | bit(WDRF)) == 0
    }
}

impl From<u8> for ResetCause {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

/// What the watchdog does when it expires
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogMode {
    Disabled,
    Interrupt,
    Reset,
    InterruptAndReset,
}

impl WatchdogMode {
    const fn bits(self) -> u8 {
        match self {
            WatchdogMode::Disabled => 0,
            WatchdogMode::Interrupt => bit(WDIE),
            WatchdogMode::Reset => bit(WDE),
            WatchdogMode::InterruptAndReset => bit(WDIE) | bit(WDE),
        }
    }
}

/// Watchdog oscillator cycles before expiry, named by the nominal timeout at 5V
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum WatchdogCycles {
    Ms16 = 0,
    Ms32 = 1,
    Ms64 = 2,
    Ms125 = 3,
    Ms250 = 4,
    Ms500 = 5,
    S1 = 6,
    S2 = 7,
    S4 = 8,
    S8 = 9,
}

impl WatchdogCycles {
    pub const ALL: [WatchdogCycles; 10] = [
        WatchdogCycles::Ms16,
        WatchdogCycles::Ms32,
        WatchdogCycles::Ms64,
        WatchdogCycles::Ms125,
        WatchdogCycles::Ms250,
        WatchdogCycles::Ms500,
        WatchdogCycles::S1,
        WatchdogCycles::S2,
        WatchdogCycles::S4,
        WatchdogCycles::S8,
    ];

    /// Oscillator cycles, 2K through 1024K.
    pub const fn cycles(self) -> u32 {
        2048 << self as u32
    }

    pub const fn timeout_ms(self) -> u16 {
        match self {
            WatchdogCycles::Ms16 => 16,
            WatchdogCycles::Ms32 => 32,
            WatchdogCycles::Ms64 => 64,
            WatchdogCycles::Ms125 => 125,
            WatchdogCycles::Ms250 => 250,
            WatchdogCycles::Ms500 => 500,
            WatchdogCycles::S1 => 1000,
            WatchdogCycles::S2 => 2000,
            WatchdogCycles::S4 => 4000,
            WatchdogCycles::S8 => 8000,
        }
    }

    /// WDP2:0 hold the low three bits of the step, WDP3 the fourth.
    const fn bits(self) -> u8 {
        let step = self as u8;
        (step & 0b111) << WDP0 | (step >> 3) << WDP3
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchdogConfig {
    pub mode: WatchdogMode,
    pub cycles: WatchdogCycles,
}

impl WatchdogConfig {
    pub const DISABLED: Self = Self {
        mode: WatchdogMode::Disabled,
        cycles: WatchdogCycles::Ms16,
    };

    /// WDTCSR value to commit once the change window is open.
    pub const fn control_value(&self) -> u8 {
        match self.mode {
            WatchdogMode::Disabled => 0,
            mode => mode.bits() | self.cycles.bits(),
        }
    }
}

pub struct System<'a, R> {
    regs: &'a R,
}

impl<'a, R: RegisterFile + Instructions> System<'a, R> {
    pub fn new(regs: &'a R) -> Self {
        Self { regs }
    }

    /// Read and clear MCUSR. A second call reports 0 until the next reset.
    pub fn get_reset_status(&self) -> u8 {
        let status = self.regs.read(MCUSR);
        self.regs.write(MCUSR, 0);
        status
    }

    pub fn reset_cause(&self) -> ResetCause {
        ResetCause::from_bits(self.get_reset_status())
    }

    /// Apply `config` through the timed change sequence.
    ///
    /// WDRF overrides WDE, so it is cleared before the change window opens.
    /// The final value must land within four cycles of setting WDCE, hence it
    /// is computed up front. Interrupts are enabled on return.
    pub fn set_watchdog(&self, config: WatchdogConfig) {
        let value = config.control_value();
        trace!("watchdog: {} -> WDTCSR={=u8:#x}", config, value);

        self.regs.interrupts_disable();
        self.regs.watchdog_reset();
        clear_bit(self.regs, MCUSR, WDRF);
        let current = self.regs.read(WDTCSR);
        self.regs.write(WDTCSR, current | bit(WDCE) | bit(WDE));
        self.regs.write(WDTCSR, value);
        self.regs.interrupts_enable();
    }

    #[inline]
    pub fn reset_watchdog(&self) {
        self.regs.watchdog_reset();
    }
}
