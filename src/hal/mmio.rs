//! Memory-mapped register file of the running MCU.

use super::register::{Instructions, Reg, RegisterFile};
use avr_device::interrupt::Mutex;
use core::cell::Cell;

static TAKEN: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

/// Volatile access to the real peripheral registers.
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Claim the register file. Returns `None` after the first call.
    pub fn take() -> Option<Self> {
        avr_device::interrupt::free(|cs| {
            let taken = TAKEN.borrow(cs);
            if taken.get() {
                None
            } else {
                taken.set(true);
                Some(Self { _private: () })
            }
        })
    }

    /// Create another handle regardless of [`Mmio::take`].
    ///
    /// # Safety
    /// Drivers built on separate handles do not coordinate register access.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl RegisterFile for Mmio {
    #[inline(always)]
    fn read(&self, reg: Reg) -> u8 {
        // SAFETY: `Reg` values are data-space addresses of 8-bit registers.
        unsafe { core::ptr::read_volatile(reg.addr() as usize as *const u8) }
    }

    #[inline(always)]
    fn write(&self, reg: Reg, value: u8) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(reg.addr() as usize as *mut u8, value) }
    }
}

impl Instructions for Mmio {
    #[inline(always)]
    fn sleep(&self) {
        avr_device::asm::sleep()
    }

    #[inline(always)]
    fn watchdog_reset(&self) {
        avr_device::asm::wdr()
    }

    #[inline(always)]
    fn interrupts_disable(&self) {
        avr_device::interrupt::disable();
    }

    #[inline(always)]
    fn interrupts_enable(&self) {
        // SAFETY: callers re-enable interrupts only after finishing a
        // sequence that needed them off.
        unsafe { avr_device::interrupt::enable() }
    }
}
