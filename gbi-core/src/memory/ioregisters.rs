use crate::cpu::InterruptType;
use crate::memory::address;
use gbi_proc_macros::EnumDisplay;

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumDisplay)]
pub enum IoRegister {
    JOYP,
    SB,
    SC,
    DIV,
    TIMA,
    TMA,
    TAC,
    IF,
    NR10,
    NR11,
    NR12,
    NR13,
    NR14,
    NR21,
    NR22,
    NR23,
    NR24,
    NR30,
    NR31,
    NR32,
    NR33,
    NR34,
    NR41,
    NR42,
    NR43,
    NR44,
    NR50,
    NR51,
    NR52,
    LCDC,
    STAT,
    SCY,
    SCX,
    LY,
    LYC,
    DMA,
    BGP,
    OBP0,
    OBP1,
    WY,
    WX,
}

impl IoRegister {
    /// Return the named hardware register at the given address, if there is one.
    pub fn from_address(address: u16) -> Option<Self> {
        let register = match address {
            0xFF00 => Self::JOYP,
            0xFF01 => Self::SB,
            0xFF02 => Self::SC,
            0xFF04 => Self::DIV,
            0xFF05 => Self::TIMA,
            0xFF06 => Self::TMA,
            0xFF07 => Self::TAC,
            0xFF0F => Self::IF,
            0xFF10 => Self::NR10,
            0xFF11 => Self::NR11,
            0xFF12 => Self::NR12,
            0xFF13 => Self::NR13,
            0xFF14 => Self::NR14,
            0xFF16 => Self::NR21,
            0xFF17 => Self::NR22,
            0xFF18 => Self::NR23,
            0xFF19 => Self::NR24,
            0xFF1A => Self::NR30,
            0xFF1B => Self::NR31,
            0xFF1C => Self::NR32,
            0xFF1D => Self::NR33,
            0xFF1E => Self::NR34,
            0xFF20 => Self::NR41,
            0xFF21 => Self::NR42,
            0xFF22 => Self::NR43,
            0xFF23 => Self::NR44,
            0xFF24 => Self::NR50,
            0xFF25 => Self::NR51,
            0xFF26 => Self::NR52,
            0xFF40 => Self::LCDC,
            0xFF41 => Self::STAT,
            0xFF42 => Self::SCY,
            0xFF43 => Self::SCX,
            0xFF44 => Self::LY,
            0xFF45 => Self::LYC,
            0xFF46 => Self::DMA,
            0xFF47 => Self::BGP,
            0xFF48 => Self::OBP0,
            0xFF49 => Self::OBP1,
            0xFF4A => Self::WY,
            0xFF4B => Self::WX,
            _ => return None,
        };

        Some(register)
    }

    /// Return the address for this hardware register.
    pub fn to_address(self) -> u16 {
        match self {
            Self::JOYP => 0xFF00,
            Self::SB => 0xFF01,
            Self::SC => 0xFF02,
            Self::DIV => 0xFF04,
            Self::TIMA => 0xFF05,
            Self::TMA => 0xFF06,
            Self::TAC => 0xFF07,
            Self::IF => 0xFF0F,
            Self::NR10 => 0xFF10,
            Self::NR11 => 0xFF11,
            Self::NR12 => 0xFF12,
            Self::NR13 => 0xFF13,
            Self::NR14 => 0xFF14,
            Self::NR21 => 0xFF16,
            Self::NR22 => 0xFF17,
            Self::NR23 => 0xFF18,
            Self::NR24 => 0xFF19,
            Self::NR30 => 0xFF1A,
            Self::NR31 => 0xFF1B,
            Self::NR32 => 0xFF1C,
            Self::NR33 => 0xFF1D,
            Self::NR34 => 0xFF1E,
            Self::NR41 => 0xFF20,
            Self::NR42 => 0xFF21,
            Self::NR43 => 0xFF22,
            Self::NR44 => 0xFF23,
            Self::NR50 => 0xFF24,
            Self::NR51 => 0xFF25,
            Self::NR52 => 0xFF26,
            Self::LCDC => 0xFF40,
            Self::STAT => 0xFF41,
            Self::SCY => 0xFF42,
            Self::SCX => 0xFF43,
            Self::LY => 0xFF44,
            Self::LYC => 0xFF45,
            Self::DMA => 0xFF46,
            Self::BGP => 0xFF47,
            Self::OBP0 => 0xFF48,
            Self::OBP1 => 0xFF49,
            Self::WY => 0xFF4A,
            Self::WX => 0xFF4B,
        }
    }

    fn relative_address(self) -> usize {
        (self.to_address() - address::IO_REGISTERS_START) as usize
    }
}

// Values the boot ROM leaves behind in the audio, LCD and palette registers
const POWER_ON_VALUES: [(IoRegister, u8); 19] = [
    (IoRegister::NR10, 0x80),
    (IoRegister::NR11, 0xBF),
    (IoRegister::NR12, 0xF3),
    (IoRegister::NR14, 0xBF),
    (IoRegister::NR21, 0x3F),
    (IoRegister::NR24, 0xBF),
    (IoRegister::NR30, 0x7F),
    (IoRegister::NR31, 0xFF),
    (IoRegister::NR32, 0x9F),
    (IoRegister::NR34, 0xBF),
    (IoRegister::NR41, 0xFF),
    (IoRegister::NR44, 0xBF),
    (IoRegister::NR50, 0x77),
    (IoRegister::NR51, 0xF3),
    (IoRegister::NR52, 0xF1),
    (IoRegister::LCDC, 0x91),
    (IoRegister::BGP, 0xFC),
    (IoRegister::OBP0, 0xFF),
    (IoRegister::OBP1, 0xFF),
];

// SC bits: transfer start (7) and internal clock (0)
const SERIAL_TRANSFER_REQUEST: u8 = 0x81;

/// A convenience view around the IF register.
pub struct InterruptFlags<'a>(&'a mut u8);

impl<'a> InterruptFlags<'a> {
    /// Returns the highest priority requested + enabled interrupt, or None if no enabled interrupts
    /// have been requested.
    pub fn highest_priority_interrupt(&self, ie_value: u8) -> Option<InterruptType> {
        let masked_if = *self.0 & ie_value;
        InterruptType::ALL
            .into_iter()
            .find(|interrupt_type| masked_if & interrupt_type.bit() != 0)
    }

    pub fn get(&self, interrupt_type: InterruptType) -> bool {
        *self.0 & interrupt_type.bit() != 0
    }

    /// Sets the bit for the given interrupt type.
    pub fn set(&mut self, interrupt_type: InterruptType) {
        *self.0 |= interrupt_type.bit();
    }

    /// Clears the bit for the given interrupt type.
    pub fn clear(&mut self, interrupt_type: InterruptType) {
        *self.0 &= !interrupt_type.bit();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoRegisters {
    contents: [u8; address::IO_REGISTERS_SIZE],
    serial_output: Vec<u8>,
}

impl IoRegisters {
    pub fn new() -> Self {
        let mut contents = [0; address::IO_REGISTERS_SIZE];
        for (register, value) in POWER_ON_VALUES {
            contents[register.relative_address()] = value;
        }

        Self {
            contents,
            serial_output: Vec::new(),
        }
    }

    /// Read the value at the given address in the I/O register range. Reads never have side
    /// effects.
    ///
    /// # Panics
    ///
    /// This method will panic if the address is outside of 0xFF00-0xFF7F.
    pub fn read_address(&self, address: u16) -> u8 {
        self.contents[relative_address(address)]
    }

    /// Assign a value at the given address in the I/O register range.
    ///
    /// A write to SC that requests an internally clocked transfer completes the transfer
    /// immediately: the byte in SB is captured as serial output and the serial interrupt is
    /// requested.
    ///
    /// # Panics
    ///
    /// This method will panic if the address is outside of 0xFF00-0xFF7F.
    pub fn write_address(&mut self, address: u16, value: u8) {
        let relative_addr = relative_address(address);

        if address == IoRegister::SC.to_address()
            && value & SERIAL_TRANSFER_REQUEST == SERIAL_TRANSFER_REQUEST
        {
            let byte = self.read_register(IoRegister::SB);
            log::debug!("Serial transfer of byte {byte:02X} ({:?})", char::from(byte));
            self.serial_output.push(byte);

            self.contents[relative_addr] = value & !0x80;
            self.interrupt_flags().set(InterruptType::Serial);
            return;
        }

        self.contents[relative_addr] = value;
    }

    /// Read the value from the given hardware register.
    pub fn read_register(&self, register: IoRegister) -> u8 {
        self.read_address(register.to_address())
    }

    /// Assign a value to the given hardware register.
    pub fn write_register(&mut self, register: IoRegister, value: u8) {
        self.write_address(register.to_address(), value);
    }

    /// Obtain a read/write view around the IF register (interrupt request flags).
    pub fn interrupt_flags(&mut self) -> InterruptFlags<'_> {
        InterruptFlags(&mut self.contents[IoRegister::IF.relative_address()])
    }

    /// Bytes sent over the serial port since the last call to `take_serial_output`.
    pub fn serial_output(&self) -> &[u8] {
        &self.serial_output
    }

    pub fn take_serial_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.serial_output)
    }
}

impl Default for IoRegisters {
    fn default() -> Self {
        Self::new()
    }
}

fn relative_address(address: u16) -> usize {
    assert!(
        (address::IO_REGISTERS_START..=address::IO_REGISTERS_END).contains(&address),
        "address is not an I/O register address: {address:04X}"
    );

    (address - address::IO_REGISTERS_START) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_values() {
        let registers = IoRegisters::new();

        assert_eq!(0x80, registers.read_register(IoRegister::NR10));
        assert_eq!(0xF1, registers.read_register(IoRegister::NR52));
        assert_eq!(0x91, registers.read_register(IoRegister::LCDC));
        assert_eq!(0xFC, registers.read_register(IoRegister::BGP));
        assert_eq!(0x00, registers.read_register(IoRegister::SB));
        assert_eq!(0x00, registers.read_register(IoRegister::IF));
    }

    #[test]
    fn address_round_trip() {
        for address in address::IO_REGISTERS_START..=address::IO_REGISTERS_END {
            if let Some(register) = IoRegister::from_address(address) {
                assert_eq!(address, register.to_address(), "{register}");
            }
        }
    }

    #[test]
    fn serial_transfer() {
        let mut registers = IoRegisters::new();

        registers.write_register(IoRegister::SB, b'O');
        registers.write_register(IoRegister::SC, 0x81);
        registers.write_register(IoRegister::SB, b'K');
        registers.write_register(IoRegister::SC, 0x81);

        assert_eq!(b"OK", registers.serial_output());
        assert_eq!(0x01, registers.read_register(IoRegister::SC));
        assert!(registers.interrupt_flags().get(InterruptType::Serial));

        assert_eq!(b"OK".to_vec(), registers.take_serial_output());
        assert!(registers.serial_output().is_empty());
    }

    #[test]
    fn serial_write_without_transfer() {
        let mut registers = IoRegisters::new();

        registers.write_register(IoRegister::SB, b'X');
        // External clock, no transfer start
        registers.write_register(IoRegister::SC, 0x01);
        registers.write_register(IoRegister::SC, 0x80);

        assert!(registers.serial_output().is_empty());
        assert_eq!(0x80, registers.read_register(IoRegister::SC));
        assert!(!registers.interrupt_flags().get(InterruptType::Serial));
    }
}
