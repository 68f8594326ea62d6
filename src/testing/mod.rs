//! Host-side register file double.
//!
//! [`MockRegisters`] is plain byte storage for the 256 low data-space
//! addresses plus a bounded journal of every driver write and CPU instruction,
//! so tests can check intermediate register states and sequencing. It models
//! no peripheral behaviour; tests that need a flag to flip wrap it in a small
//! simulator implementing [`RegisterFile`] and use [`MockRegisters::poke`] for
//! the "hardware" side.

use crate::hal::register::{bit, Instructions, Reg, RegisterFile};
use crate::hal::registers::{SREG, SREG_I};
use core::cell::RefCell;
use heapless::Vec;

/// Number of journal entries kept before further events are dropped.
pub const JOURNAL_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Write(Reg, u8),
    Sleep,
    WatchdogReset,
    InterruptsDisabled,
    InterruptsEnabled,
}

pub struct MockRegisters {
    memory: RefCell<[u8; 256]>,
    journal: RefCell<Vec<Event, JOURNAL_CAPACITY>>,
    overflowed: RefCell<bool>,
}

impl MockRegisters {
    pub const fn new() -> Self {
        Self {
            memory: RefCell::new([0; 256]),
            journal: RefCell::new(Vec::new()),
            overflowed: RefCell::new(false),
        }
    }

    /// Zero every register and forget the journal.
    pub fn reset(&self) {
        *self.memory.borrow_mut() = [0; 256];
        self.clear_events();
    }

    /// Read without side effects.
    pub fn peek(&self, reg: Reg) -> u8 {
        self.memory.borrow()[reg.addr() as usize]
    }

    /// Store without journaling; the "hardware" side of a simulation.
    pub fn poke(&self, reg: Reg, value: u8) {
        self.memory.borrow_mut()[reg.addr() as usize] = value;
    }

    pub fn events(&self) -> Vec<Event, JOURNAL_CAPACITY> {
        self.journal.borrow().clone()
    }

    /// Values written to `reg`, oldest first.
    pub fn writes_to(&self, reg: Reg) -> Vec<u8, JOURNAL_CAPACITY> {
        self.journal
            .borrow()
            .iter()
            .filter_map(|event| match *event {
                Event::Write(r, value) if r == reg => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&self) {
        self.journal.borrow_mut().clear();
        *self.overflowed.borrow_mut() = false;
    }

    /// True when events were dropped because the journal was full.
    pub fn journal_overflowed(&self) -> bool {
        *self.overflowed.borrow()
    }

    fn record(&self, event: Event) {
        if self.journal.borrow_mut().push(event).is_err() {
            *self.overflowed.borrow_mut() = true;
        }
    }
}

impl Default for MockRegisters {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile for MockRegisters {
    fn read(&self, reg: Reg) -> u8 {
        self.peek(reg)
    }

    fn write(&self, reg: Reg, value: u8) {
        self.poke(reg, value);
        self.record(Event::Write(reg, value));
    }
}

impl Instructions for MockRegisters {
    fn sleep(&self) {
        self.record(Event::Sleep);
    }

    fn watchdog_reset(&self) {
        self.record(Event::WatchdogReset);
    }

    fn interrupts_disable(&self) {
        self.poke(SREG, self.peek(SREG) & !bit(SREG_I));
        self.record(Event::InterruptsDisabled);
    }

    fn interrupts_enable(&self) {
        self.poke(SREG, self.peek(SREG) | bit(SREG_I));
        self.record(Event::InterruptsEnabled);
    }
}
