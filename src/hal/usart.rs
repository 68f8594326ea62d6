//! USART0 driver: blocking byte transfers plus `embedded-hal` serial traits.

use super::register::{bit, clear_bit, set_bit, wait_until, write_bit, RegisterFile};
use super::registers::{
    DOR0, FE0, RXC0, RXEN0, TXEN0, U2X0, UBRR0H, UBRR0L, UCSR0A, UCSR0B, UCSR0C, UCSZ00,
    UCSZ01, UCSZ02, UDR0, UDRE0, UMSEL00, UMSEL01, UPE0, UPM00, UPM01, USBS0,
};
use crate::config::{CPU_FREQ_HZ, USART_BAUD};
use core::convert::Infallible;
use embedded_hal::serial;

/// Largest value UBRR0 (12 bits) can hold
const UBRR_MAX: u32 = 0x0FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartError {
    /// Stop bits other than 1 or 2
    InvalidStopBits(u8),
    /// Data bits outside 5..=9
    InvalidDataBits(u8),
    /// Zero baud rate, or a divisor that does not fit UBRR0
    BaudRateOutOfRange,
}

/// Receive-side error flags latched in UCSR0A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError {
    Framing,
    Overrun,
    Parity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartMode {
    AsyncNormal,
    AsyncDoubleSpeed,
    SyncMaster,
}

impl UsartMode {
    /// Clock divider between CPU clock and baud clock
    pub const fn prescaler(self) -> u32 {
        match self {
            UsartMode::AsyncNormal => 16,
            UsartMode::AsyncDoubleSpeed => 8,
            UsartMode::SyncMaster => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartDirection {
    Transmit,
    Receive,
    TransmitReceive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsartConfig {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
    pub mode: UsartMode,
    pub direction: UsartDirection,
}

impl Default for UsartConfig {
    /// 9600 8N1, asynchronous, both directions
    fn default() -> Self {
        Self {
            baud_rate: USART_BAUD,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            mode: UsartMode::AsyncNormal,
            direction: UsartDirection::TransmitReceive,
        }
    }
}

/// UBRR0 value for `baud_rate` in `mode`: `F_CPU / prescaler / baud - 1`.
pub fn baud_divisor(baud_rate: u32, mode: UsartMode) -> Result<u16, UsartError> {
    if baud_rate == 0 {
        return Err(UsartError::BaudRateOutOfRange);
    }
    let ticks = CPU_FREQ_HZ / mode.prescaler() / baud_rate;
    if ticks == 0 || ticks - 1 > UBRR_MAX {
        return Err(UsartError::BaudRateOutOfRange);
    }
    Ok((ticks - 1) as u16)
}

pub struct Usart<'a, R> {
    regs: &'a R,
}

impl<'a, R: RegisterFile> Usart<'a, R> {
    pub fn new(regs: &'a R) -> Self {
        Self { regs }
    }

    /// Configure frame format, baud rate and enabled directions.
    ///
    /// The configuration is validated before any register is touched. TX/RX
    /// enable bits are written last, so the peripheral stays off while the
    /// frame format is being changed.
    pub fn init(&self, config: &UsartConfig) -> Result<(), UsartError> {
        if !matches!(config.stop_bits, 1 | 2) {
            warn!("usart: rejected {} stop bits", config.stop_bits);
            return Err(UsartError::InvalidStopBits(config.stop_bits));
        }
        if !(5..=9).contains(&config.data_bits) {
            warn!("usart: rejected {} data bits", config.data_bits);
            return Err(UsartError::InvalidDataBits(config.data_bits));
        }
        let divisor = baud_divisor(config.baud_rate, config.mode)?;

        // Let an ongoing transmission drain first
        wait_until(self.regs, UCSR0A, UDRE0, true);

        self.set_mode(config.mode);
        self.set_parity(config.parity);
        write_bit(self.regs, UCSR0C, USBS0, config.stop_bits == 2);
        self.set_data_bits(config.data_bits);
        self.set_divisor(divisor);
        self.set_direction(config.direction);

        debug!("usart: {} baud, ubrr {}", config.baud_rate, divisor);
        Ok(())
    }

    fn set_mode(&self, mode: UsartMode) {
        let (synchronous, double_speed) = match mode {
            UsartMode::AsyncNormal => (false, false),
            UsartMode::AsyncDoubleSpeed => (false, true),
            UsartMode::SyncMaster => (true, false),
        };
        // UMSEL0 = 0b00 asynchronous, 0b01 synchronous
        clear_bit(self.regs, UCSR0C, UMSEL01);
        write_bit(self.regs, UCSR0C, UMSEL00, synchronous);
        write_bit(self.regs, UCSR0A, U2X0, double_speed);
    }

    fn set_parity(&self, parity: Parity) {
        let (upm1, upm0) = match parity {
            Parity::None => (false, false),
            Parity::Even => (true, false),
            Parity::Odd => (true, true),
        };
        write_bit(self.regs, UCSR0C, UPM01, upm1);
        write_bit(self.regs, UCSR0C, UPM00, upm0);
    }

    /// UCSZ0[2:0]: 5..8 bits map to 0b000..0b011, 9 bits is 0b111.
    fn set_data_bits(&self, data_bits: u8) {
        let size = match data_bits {
            9 => 0b111,
            n => n - 5,
        };
        write_bit(self.regs, UCSR0C, UCSZ00, size & 0b001 != 0);
        write_bit(self.regs, UCSR0C, UCSZ01, size & 0b010 != 0);
        write_bit(self.regs, UCSR0B, UCSZ02, size & 0b100 != 0);
    }

    fn set_divisor(&self, divisor: u16) {
        // UBRR0L last: writing it latches the new rate
        self.regs.write(UBRR0H, (divisor >> 8) as u8);
        self.regs.write(UBRR0L, divisor as u8);
    }

    fn set_direction(&self, direction: UsartDirection) {
        let (tx, rx) = match direction {
            UsartDirection::Transmit => (true, false),
            UsartDirection::Receive => (false, true),
            UsartDirection::TransmitReceive => (true, true),
        };
        write_bit(self.regs, UCSR0B, TXEN0, tx);
        write_bit(self.regs, UCSR0B, RXEN0, rx);
    }

    /// Hand `data` to the transmitter byte by byte.
    ///
    /// Returns once the last byte has been accepted into the data register,
    /// not when it has left the shift register.
    pub fn transmit(&self, data: &[u8]) {
        for &byte in data {
            self.write_byte(byte);
        }
    }

    /// Fill `data` with received bytes, blocking for each one.
    pub fn receive(&self, data: &mut [u8]) {
        for slot in data.iter_mut() {
            *slot = self.read_byte();
        }
    }

    pub fn write_byte(&self, byte: u8) {
        wait_until(self.regs, UCSR0A, UDRE0, true);
        self.regs.write(UDR0, byte);
    }

    pub fn read_byte(&self) -> u8 {
        wait_until(self.regs, UCSR0A, UDRE0, true);
        wait_until(self.regs, UCSR0A, RXC0, true);
        self.regs.read(UDR0)
    }

    /// Error flag latched for the byte currently in UDR0, if any.
    pub fn errors(&self) -> Option<ReadError> {
        let status = self.regs.read(UCSR0A);
        if status & bit(FE0) != 0 {
            Some(ReadError::Framing)
        } else if status & bit(DOR0) != 0 {
            Some(ReadError::Overrun)
        } else if status & bit(UPE0) != 0 {
            Some(ReadError::Parity)
        } else {
            None
        }
    }

    /// Turn the transmitter and receiver off.
    pub fn disable(&self) {
        clear_bit(self.regs, UCSR0B, TXEN0);
        clear_bit(self.regs, UCSR0B, RXEN0);
    }

    /// Re-enable both directions after [`Usart::disable`].
    pub fn enable(&self) {
        set_bit(self.regs, UCSR0B, TXEN0);
        set_bit(self.regs, UCSR0B, RXEN0);
    }
}

impl<'a, R: RegisterFile> serial::Write<u8> for Usart<'a, R> {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.regs.read(UCSR0A) & bit(UDRE0) == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.regs.write(UDR0, word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        if self.regs.read(UCSR0A) & bit(UDRE0) == 0 {
            return Err(nb::Error::WouldBlock);
        }
        Ok(())
    }
}

impl<'a, R: RegisterFile> serial::Read<u8> for Usart<'a, R> {
    type Error = ReadError;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.regs.read(UCSR0A) & bit(RXC0) == 0 {
            return Err(nb::Error::WouldBlock);
        }
        // Flags must be sampled before UDR0 is read
        let error = self.errors();
        let byte = self.regs.read(UDR0);
        match error {
            Some(error) => Err(nb::Error::Other(error)),
            None => Ok(byte),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::register::{bit_is_set, Reg};
    use crate::testing::{Event, MockRegisters};
    use core::cell::RefCell;
    use embedded_hal::serial::{Read, Write};

    fn idle_regs() -> MockRegisters {
        let regs = MockRegisters::new();
        regs.poke(UCSR0A, bit(UDRE0));
        regs
    }

    /// Serves bytes from a queue through UDR0 and flags RXC0 while any remain.
    struct RxSim {
        regs: MockRegisters,
        pending: RefCell<std::collections::VecDeque<u8>>,
    }

    impl RxSim {
        fn new(bytes: &[u8]) -> Self {
            let sim = Self {
                regs: idle_regs(),
                pending: RefCell::new(bytes.iter().copied().collect()),
            };
            sim.refresh();
            sim
        }

        fn refresh(&self) {
            let status = self.regs.peek(UCSR0A) & !bit(RXC0);
            match self.pending.borrow().front() {
                Some(&byte) => {
                    self.regs.poke(UDR0, byte);
                    self.regs.poke(UCSR0A, status | bit(RXC0));
                }
                None => self.regs.poke(UCSR0A, status),
            }
        }
    }

    impl RegisterFile for RxSim {
        fn read(&self, reg: Reg) -> u8 {
            let value = self.regs.read(reg);
            if reg == UDR0 {
                self.pending.borrow_mut().pop_front();
                self.refresh();
            }
            value
        }

        fn write(&self, reg: Reg, value: u8) {
            self.regs.write(reg, value)
        }
    }

    /// Transmitter still busy: UDRE0 reads clear for the first `polls` reads
    /// of UCSR0A. Counts configuration writes made before it sets.
    struct BusyTxSim {
        regs: MockRegisters,
        polls: core::cell::Cell<u32>,
        early_writes: core::cell::Cell<usize>,
    }

    impl RegisterFile for BusyTxSim {
        fn read(&self, reg: Reg) -> u8 {
            if reg == UCSR0A {
                let left = self.polls.get().saturating_sub(1);
                self.polls.set(left);
                if left == 0 {
                    self.regs.poke(UCSR0A, self.regs.peek(UCSR0A) | bit(UDRE0));
                }
            }
            self.regs.read(reg)
        }

        fn write(&self, reg: Reg, value: u8) {
            let config = [UCSR0A, UCSR0B, UCSR0C, UBRR0H, UBRR0L];
            if config.contains(&reg) && !bit_is_set(&self.regs, UCSR0A, UDRE0) {
                self.early_writes.set(self.early_writes.get() + 1);
            }
            self.regs.write(reg, value);
        }
    }

    #[test]
    fn init_waits_for_transmitter_to_drain() {
        let sim = BusyTxSim {
            regs: MockRegisters::new(),
            polls: core::cell::Cell::new(4),
            early_writes: core::cell::Cell::new(0),
        };

        Usart::new(&sim).init(&UsartConfig::default()).unwrap();

        assert_eq!(sim.polls.get(), 0);
        assert_eq!(sim.early_writes.get(), 0);
        assert_eq!(sim.regs.peek(UBRR0L), 103);
    }

    #[test]
    fn divisor_for_9600_baud_async_normal_is_103() {
        assert_eq!(baud_divisor(9600, UsartMode::AsyncNormal), Ok(103));
        assert_eq!(baud_divisor(115_200, UsartMode::AsyncDoubleSpeed), Ok(16));
        assert_eq!(baud_divisor(1_000_000, UsartMode::SyncMaster), Ok(7));
    }

    #[test]
    fn divisor_out_of_range_is_rejected() {
        assert_eq!(baud_divisor(0, UsartMode::AsyncNormal), Err(UsartError::BaudRateOutOfRange));
        // 16 MHz / 16 / 100 - 1 = 9999 does not fit 12 bits
        assert_eq!(baud_divisor(100, UsartMode::AsyncNormal), Err(UsartError::BaudRateOutOfRange));
        assert_eq!(
            baud_divisor(CPU_FREQ_HZ, UsartMode::AsyncNormal),
            Err(UsartError::BaudRateOutOfRange)
        );
    }

    #[test]
    fn init_writes_baud_divisor() {
        let regs = idle_regs();
        Usart::new(&regs).init(&UsartConfig::default()).unwrap();
        assert_eq!(regs.peek(UBRR0H), 0);
        assert_eq!(regs.peek(UBRR0L), 103);
    }

    #[test]
    fn init_writes_high_divisor_byte() {
        let regs = idle_regs();
        let config = UsartConfig {
            baud_rate: 2400,
            ..UsartConfig::default()
        };
        Usart::new(&regs).init(&config).unwrap();
        // 16 MHz / 16 / 2400 - 1 = 415 = 0x19F
        assert_eq!(regs.peek(UBRR0H), 0x01);
        assert_eq!(regs.peek(UBRR0L), 0x9F);
    }

    #[test]
    fn stop_bits_must_be_one_or_two() {
        for stop_bits in [0, 3] {
            let regs = idle_regs();
            let config = UsartConfig {
                stop_bits,
                ..UsartConfig::default()
            };
            assert_eq!(
                Usart::new(&regs).init(&config),
                Err(UsartError::InvalidStopBits(stop_bits))
            );
            assert!(regs.events().is_empty());
        }

        let regs = idle_regs();
        let config = UsartConfig {
            stop_bits: 2,
            ..UsartConfig::default()
        };
        Usart::new(&regs).init(&config).unwrap();
        assert!(bit_is_set(&regs, UCSR0C, USBS0));
    }

    #[test]
    fn data_bits_outside_five_to_nine_are_rejected() {
        for data_bits in [4, 10] {
            let regs = idle_regs();
            let config = UsartConfig {
                data_bits,
                ..UsartConfig::default()
            };
            assert_eq!(
                Usart::new(&regs).init(&config),
                Err(UsartError::InvalidDataBits(data_bits))
            );
        }
    }

    #[test]
    fn data_bit_field_patterns() {
        let cases = [
            (5, 0b00, false),
            (6, 0b01, false),
            (7, 0b10, false),
            (8, 0b11, false),
            (9, 0b11, true),
        ];
        for (data_bits, ucsz, ucsz2) in cases {
            let regs = idle_regs();
            // Leftover 9-bit setting must be cleared for smaller frames
            regs.poke(UCSR0B, bit(UCSZ02));
            let config = UsartConfig {
                data_bits,
                ..UsartConfig::default()
            };
            Usart::new(&regs).init(&config).unwrap();

            assert_eq!((regs.peek(UCSR0C) >> UCSZ00) & 0b11, ucsz, "{} bits", data_bits);
            assert_eq!(bit_is_set(&regs, UCSR0B, UCSZ02), ucsz2, "{} bits", data_bits);
        }
    }

    #[test]
    fn parity_field_patterns() {
        for (parity, upm) in [(Parity::None, 0b00), (Parity::Even, 0b10), (Parity::Odd, 0b11)] {
            let regs = idle_regs();
            let config = UsartConfig {
                parity,
                ..UsartConfig::default()
            };
            Usart::new(&regs).init(&config).unwrap();
            assert_eq!((regs.peek(UCSR0C) >> UPM00) & 0b11, upm);
        }
    }

    #[test]
    fn mode_selects_umsel_and_double_speed() {
        let cases = [
            (UsartMode::AsyncNormal, 0b00, false),
            (UsartMode::AsyncDoubleSpeed, 0b00, true),
            (UsartMode::SyncMaster, 0b01, false),
        ];
        for (mode, umsel, u2x) in cases {
            let regs = idle_regs();
            let config = UsartConfig {
                mode,
                baud_rate: 9600,
                ..UsartConfig::default()
            };
            Usart::new(&regs).init(&config).unwrap();
            assert_eq!(regs.peek(UCSR0C) >> UMSEL00, umsel);
            assert_eq!(bit_is_set(&regs, UCSR0A, U2X0), u2x);
        }
    }

    #[test]
    fn direction_bits_are_written_last() {
        let cases = [
            (UsartDirection::Transmit, true, false),
            (UsartDirection::Receive, false, true),
            (UsartDirection::TransmitReceive, true, true),
        ];
        for (direction, tx, rx) in cases {
            let regs = idle_regs();
            let config = UsartConfig {
                direction,
                ..UsartConfig::default()
            };
            Usart::new(&regs).init(&config).unwrap();

            assert_eq!(bit_is_set(&regs, UCSR0B, TXEN0), tx);
            assert_eq!(bit_is_set(&regs, UCSR0B, RXEN0), rx);

            let events = regs.events();
            let last_baud = events
                .iter()
                .rposition(|e| matches!(e, Event::Write(UBRR0L, _)))
                .unwrap();
            let first_enable = events
                .iter()
                .position(|e| match *e {
                    Event::Write(UCSR0B, v) => v & (bit(TXEN0) | bit(RXEN0)) != 0,
                    _ => false,
                })
                .unwrap();
            assert!(first_enable > last_baud);
        }
    }

    #[test]
    fn transmit_writes_each_byte_to_data_register() {
        let regs = idle_regs();
        Usart::new(&regs).transmit(b"AT\r");
        assert_eq!(regs.writes_to(UDR0).as_slice(), b"AT\r");
    }

    #[test]
    fn receive_reads_one_byte_per_rxc() {
        let sim = RxSim::new(&[0x10, 0x20, 0x30]);
        let mut buffer = [0u8; 3];
        Usart::new(&sim).receive(&mut buffer);
        assert_eq!(buffer, [0x10, 0x20, 0x30]);
    }

    #[test]
    fn nb_write_would_block_while_data_register_full() {
        let regs = MockRegisters::new();
        let mut usart = Usart::new(&regs);
        assert_eq!(usart.write(b'x'), Err(nb::Error::WouldBlock));
        assert_eq!(usart.flush(), Err(nb::Error::WouldBlock));

        regs.poke(UCSR0A, bit(UDRE0));
        assert_eq!(usart.write(b'x'), Ok(()));
        assert_eq!(regs.writes_to(UDR0).as_slice(), b"x");
    }

    #[test]
    fn nb_read_reports_line_errors() {
        let sim = RxSim::new(&[0x55]);
        let mut usart = Usart::new(&sim);
        sim.regs.poke(UCSR0A, sim.regs.peek(UCSR0A) | bit(FE0));
        assert_eq!(usart.read(), Err(nb::Error::Other(ReadError::Framing)));
        assert_eq!(usart.read(), Err(nb::Error::WouldBlock));

        let sim = RxSim::new(&[0x55]);
        let mut usart = Usart::new(&sim);
        assert_eq!(usart.read(), Ok(0x55));
    }

    #[test]
    fn disable_and_enable_toggle_both_directions() {
        let regs = idle_regs();
        let usart = Usart::new(&regs);
        usart.init(&UsartConfig::default()).unwrap();
        usart.disable();
        assert_eq!(regs.peek(UCSR0B) & (bit(TXEN0) | bit(RXEN0)), 0);
        usart.enable();
        assert_eq!(regs.peek(UCSR0B) & (bit(TXEN0) | bit(RXEN0)), bit(TXEN0) | bit(RXEN0));
    }
}
