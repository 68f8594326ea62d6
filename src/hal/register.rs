//! Register file abstraction and bit-level access primitives.
//!
//! Every driver in this crate talks to the hardware through a [`RegisterFile`]
//! reference instead of naming memory-mapped addresses directly. On the target
//! this is [`Mmio`](crate::hal::Mmio); on the host it is
//! [`MockRegisters`](crate::testing::MockRegisters) or a peripheral simulator
//! layered on top of it.

/// Data-space address of an 8-bit peripheral register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reg(pub u8);

impl Reg {
    /// Raw data-space address
    #[inline]
    pub const fn addr(self) -> u8 {
        self.0
    }
}

/// Byte-addressable register storage.
///
/// Accesses go through shared references: the hardware implementation is
/// volatile memory, test doubles use interior mutability.
pub trait RegisterFile {
    fn read(&self, reg: Reg) -> u8;
    fn write(&self, reg: Reg, value: u8);
}

/// CPU instructions the drivers need that are not register accesses.
pub trait Instructions {
    /// `sleep`: halt the core until a qualifying interrupt arrives
    fn sleep(&self);
    /// `wdr`: reload the watchdog countdown
    fn watchdog_reset(&self);
    /// `cli`
    fn interrupts_disable(&self);
    /// `sei`
    fn interrupts_enable(&self);
}

impl<T: RegisterFile + ?Sized> RegisterFile for &T {
    #[inline]
    fn read(&self, reg: Reg) -> u8 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&self, reg: Reg, value: u8) {
        (**self).write(reg, value)
    }
}

impl<T: Instructions + ?Sized> Instructions for &T {
    #[inline]
    fn sleep(&self) {
        (**self).sleep()
    }

    #[inline]
    fn watchdog_reset(&self) {
        (**self).watchdog_reset()
    }

    #[inline]
    fn interrupts_disable(&self) {
        (**self).interrupts_disable()
    }

    #[inline]
    fn interrupts_enable(&self) {
        (**self).interrupts_enable()
    }
}

/// Mask with only `bit` set.
#[inline]
pub const fn bit(bit: u8) -> u8 {
    1 << bit
}

/// Read-modify-write that sets a single bit.
#[inline]
pub fn set_bit<R: RegisterFile + ?Sized>(regs: &R, reg: Reg, n: u8) {
    let value = regs.read(reg);
    regs.write(reg, value | bit(n));
}

/// Read-modify-write that clears a single bit.
#[inline]
pub fn clear_bit<R: RegisterFile + ?Sized>(regs: &R, reg: Reg, n: u8) {
    let value = regs.read(reg);
    regs.write(reg, value & !bit(n));
}

/// Set or clear a single bit depending on `level`.
#[inline]
pub fn write_bit<R: RegisterFile + ?Sized>(regs: &R, reg: Reg, n: u8, level: bool) {
    if level {
        set_bit(regs, reg, n)
    } else {
        clear_bit(regs, reg, n)
    }
}

#[inline]
pub fn bit_is_set<R: RegisterFile + ?Sized>(regs: &R, reg: Reg, n: u8) -> bool {
    regs.read(reg) & bit(n) != 0
}

/// Busy-poll until `reg[n]` reads as `level`.
///
/// There is no timeout: a peripheral that never raises the flag hangs the
/// caller. All driver polling goes through here.
#[inline]
pub fn wait_until<R: RegisterFile + ?Sized>(regs: &R, reg: Reg, n: u8, level: bool) {
    while bit_is_set(regs, reg, n) != level {
        core::hint::spin_loop();
    }
}
