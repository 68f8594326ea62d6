use crate::hal::register::RegisterFile;
use crate::hal::Usart;
use core::convert::Infallible;

/// Character stream over USART0.
///
/// Output translates `\n` to `\r\n` for terminal emulators; input is passed
/// through untouched.
pub struct SerialConsole<'a, R> {
    usart: Usart<'a, R>,
}

impl<'a, R: RegisterFile> SerialConsole<'a, R> {
    /// Wrap an already initialized USART.
    pub fn new(usart: Usart<'a, R>) -> Self {
        Self { usart }
    }

    pub fn write_char(&mut self, c: u8) {
        if c == b'\n' {
            self.usart.write_byte(b'\r');
        }
        self.usart.write_byte(c);
    }

    pub fn write_str(&mut self, s: &str) {
        for &c in s.as_bytes() {
            self.write_char(c);
        }
    }

    pub fn write_line(&mut self, s: &str) {
        self.write_str(s);
        self.write_char(b'\n');
    }

    /// Block until a character arrives.
    pub fn read_char(&mut self) -> u8 {
        self.usart.read_byte()
    }

    /// Raw byte, no newline translation.
    pub fn write_byte(&mut self, byte: u8) {
        self.usart.write_byte(byte);
    }

    /// Two uppercase hex digits, no prefix.
    pub fn write_hex(&mut self, value: u8) {
        for nibble in [value >> 4, value & 0x0F] {
            let digit = match nibble {
                0..=9 => b'0' + nibble,
                _ => b'A' + nibble - 10,
            };
            self.usart.write_byte(digit);
        }
    }

    /// One `[DBG] label: 0xNN` line.
    pub fn debug(&mut self, label: &str, value: u8) {
        self.write_str("[DBG] ");
        self.write_str(label);
        self.write_str(": 0x");
        self.write_hex(value);
        self.write_char(b'\n');
    }

    pub fn release(self) -> Usart<'a, R> {
        self.usart
    }
}

impl<'a, R: RegisterFile> ufmt::uWrite for SerialConsole<'a, R> {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        SerialConsole::write_str(self, s);
        Ok(())
    }
}

impl<'a, R: RegisterFile> core::fmt::Write for SerialConsole<'a, R> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        SerialConsole::write_str(self, s);
        Ok(())
    }
}
