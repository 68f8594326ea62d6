//! TWI master transactions against a simulated bus with one memory device.

use atmega328p_hal::hal::register::{bit, Reg, RegisterFile};
use atmega328p_hal::hal::registers::{TWCR, TWDR, TWEA, TWINT, TWSR, TWSTA, TWSTO};
use atmega328p_hal::hal::twi::{RegisterSize, Twi, TwiStatus};
use atmega328p_hal::testing::MockRegisters;
use core::cell::RefCell;
use embedded_hal::blocking::i2c::{Write, WriteRead};

const DEVICE: u8 = 0x50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusEvent {
    Start,
    RepeatedStart,
    Stop,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Addressing,
    PointerHigh,
    PointerLow,
    Writing,
    Reading,
    Ignored,
}

/// 24C-style memory: register pointer of `pointer_bytes` big-endian bytes,
/// auto-incrementing on every data byte.
struct MemoryDevice {
    memory: [u8; 256],
    pointer: u16,
    pointer_bytes: u8,
}

struct BusSim {
    regs: MockRegisters,
    device: RefCell<MemoryDevice>,
    phase: RefCell<Phase>,
    held: RefCell<bool>,
    log: RefCell<Vec<BusEvent>>,
}

impl BusSim {
    fn new(pointer_bytes: u8) -> Self {
        Self {
            regs: MockRegisters::new(),
            device: RefCell::new(MemoryDevice {
                memory: [0; 256],
                pointer: 0,
                pointer_bytes,
            }),
            phase: RefCell::new(Phase::Idle),
            held: RefCell::new(false),
            log: RefCell::new(Vec::new()),
        }
    }

    fn complete(&self, status: u8) {
        self.regs.poke(TWSR, status);
        self.regs.poke(TWCR, self.regs.peek(TWCR) | bit(TWINT));
    }

    fn start(&self) {
        let repeated = self.held.replace(true);
        self.log.borrow_mut().push(if repeated {
            BusEvent::RepeatedStart
        } else {
            BusEvent::Start
        });
        *self.phase.borrow_mut() = Phase::Addressing;
        self.complete(if repeated { 0x10 } else { 0x08 });
    }

    fn transmit(&self) {
        let byte = self.regs.peek(TWDR);
        let mut phase = self.phase.borrow_mut();
        let mut device = self.device.borrow_mut();
        let status = match *phase {
            Phase::Addressing => {
                let read = byte & 1 == 1;
                if byte >> 1 != DEVICE {
                    *phase = Phase::Ignored;
                    if read { 0x48 } else { 0x20 }
                } else if read {
                    *phase = Phase::Reading;
                    0x40
                } else {
                    *phase = if device.pointer_bytes == 2 {
                        Phase::PointerHigh
                    } else {
                        Phase::PointerLow
                    };
                    0x18
                }
            }
            Phase::PointerHigh => {
                device.pointer = u16::from(byte) << 8;
                *phase = Phase::PointerLow;
                0x28
            }
            Phase::PointerLow => {
                device.pointer = device.pointer & 0xFF00 | u16::from(byte);
                *phase = Phase::Writing;
                0x28
            }
            Phase::Writing => {
                let at = usize::from(device.pointer as u8);
                device.memory[at] = byte;
                device.pointer = device.pointer.wrapping_add(1);
                0x28
            }
            Phase::Idle | Phase::Reading | Phase::Ignored => 0x00,
        };
        drop(device);
        drop(phase);
        self.complete(status);
    }

    fn receive(&self, ack: bool) {
        let mut device = self.device.borrow_mut();
        let byte = device.memory[usize::from(device.pointer as u8)];
        device.pointer = device.pointer.wrapping_add(1);
        drop(device);
        self.regs.poke(TWDR, byte);
        self.complete(if ack { 0x50 } else { 0x58 });
    }

    fn events(&self) -> Vec<BusEvent> {
        self.log.borrow().clone()
    }
}

impl RegisterFile for BusSim {
    fn read(&self, reg: Reg) -> u8 {
        self.regs.read(reg)
    }

    fn write(&self, reg: Reg, value: u8) {
        self.regs.write(reg, value);
        if reg != TWCR || value & bit(TWINT) == 0 {
            return;
        }
        // The interrupt flag reads low until the step completes
        self.regs.poke(TWCR, value & !bit(TWINT));

        if value & bit(TWSTO) != 0 {
            *self.held.borrow_mut() = false;
            *self.phase.borrow_mut() = Phase::Idle;
            self.log.borrow_mut().push(BusEvent::Stop);
        } else if value & bit(TWSTA) != 0 {
            self.start();
        } else if *self.phase.borrow() == Phase::Reading {
            self.receive(value & bit(TWEA) != 0);
        } else {
            self.transmit();
        }
    }
}

#[test]
fn write_then_read_back_through_register_pointer() {
    let bus = BusSim::new(1);
    let twi = Twi::new(&bus);

    twi.write_memory(DEVICE, 0x20, RegisterSize::One, b"hello")
        .unwrap();
    assert_eq!(&bus.device.borrow().memory[0x20..0x25], b"hello");

    let mut buffer = [0u8; 4];
    twi.read_memory(DEVICE, 0x21, RegisterSize::One, &mut buffer)
        .unwrap();
    assert_eq!(&buffer, b"ello");
}

#[test]
fn read_has_no_stop_between_phases_and_one_repeated_start() {
    let bus = BusSim::new(1);
    let twi = Twi::new(&bus);

    let mut buffer = [0u8; 2];
    twi.read_memory(DEVICE, 0x00, RegisterSize::One, &mut buffer)
        .unwrap();

    assert_eq!(
        bus.events(),
        [BusEvent::Start, BusEvent::RepeatedStart, BusEvent::Stop]
    );
}

#[test]
fn two_byte_pointer_is_sent_high_byte_first() {
    let bus = BusSim::new(2);
    let twi = Twi::new(&bus);

    twi.write_memory(DEVICE, 0x0142, RegisterSize::Two, &[0xAB])
        .unwrap();

    // The simulated array is 256 bytes so only the low byte selects a cell
    assert_eq!(bus.device.borrow().memory[0x42], 0xAB);
    assert_eq!(bus.device.borrow().pointer, 0x0143);
}

#[test]
fn absent_device_reports_address_nack_and_releases_bus() {
    let bus = BusSim::new(1);
    let twi = Twi::new(&bus);

    let mut buffer = [0u8; 1];
    let error = twi
        .read_memory(0x51, 0x00, RegisterSize::One, &mut buffer)
        .unwrap_err();

    assert_eq!(error.status(), Some(TwiStatus::AddrWriteNack));
    assert_eq!(bus.events(), [BusEvent::Start, BusEvent::Stop]);
}

#[test]
fn embedded_hal_write_read() {
    let bus = BusSim::new(1);
    bus.device.borrow_mut().memory[0x10..0x13].copy_from_slice(&[7, 8, 9]);
    let mut twi = Twi::new(&bus);

    let mut buffer = [0u8; 3];
    twi.write_read(DEVICE, &[0x10], &mut buffer).unwrap();
    assert_eq!(buffer, [7, 8, 9]);
    assert_eq!(
        bus.events(),
        [BusEvent::Start, BusEvent::RepeatedStart, BusEvent::Stop]
    );

    twi.write(DEVICE, &[0x30, 1, 2]).unwrap();
    assert_eq!(&bus.device.borrow().memory[0x30..0x32], &[1, 2]);
}
