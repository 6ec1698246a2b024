use crate::memory::address;
use gbi_proc_macros::EnumDisplay;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegister {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl CpuRegister {
    // Opcode bit patterns: 0=B, 1=C, 2=D, 3=E, 4=H, 5=L, 6=(HL), 7=A
    fn from_opcode_bits(bits: u8) -> Option<Self> {
        match bits & 0x07 {
            0x00 => Some(Self::B),
            0x01 => Some(Self::C),
            0x02 => Some(Self::D),
            0x03 => Some(Self::E),
            0x04 => Some(Self::H),
            0x05 => Some(Self::L),
            0x07 => Some(Self::A),
            _ => None,
        }
    }

    /// Decode the register encoded in bits 0-2 of an opcode. Returns None for the (HL) encoding.
    pub fn from_low_opcode_bits(opcode: u8) -> Option<Self> {
        Self::from_opcode_bits(opcode)
    }

    /// Decode the register encoded in bits 3-5 of an opcode. Returns None for the (HL) encoding.
    pub fn from_mid_opcode_bits(opcode: u8) -> Option<Self> {
        Self::from_opcode_bits(opcode >> 3)
    }

    pub fn to_opcode_bits(self) -> u8 {
        match self {
            Self::B => 0x00,
            Self::C => 0x01,
            Self::D => 0x02,
            Self::E => 0x03,
            Self::H => 0x04,
            Self::L => 0x05,
            Self::A => 0x07,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRegisterPair {
    AF,
    BC,
    DE,
    HL,
    SP,
}

/// The four CPU flags. Only packed into a byte where the hardware exposes them as one (the F half
/// of AF, including when AF is pushed to the stack).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    pub zero: bool,
    pub subtract: bool,
    pub half_carry: bool,
    pub carry: bool,
}

impl Flags {
    const ZERO_BIT: u8 = 1 << 7;
    const SUBTRACT_BIT: u8 = 1 << 6;
    const HALF_CARRY_BIT: u8 = 1 << 5;
    const CARRY_BIT: u8 = 1 << 4;

    pub fn new(zero: bool, subtract: bool, half_carry: bool, carry: bool) -> Self {
        Self {
            zero,
            subtract,
            half_carry,
            carry,
        }
    }

    /// Pack into the F register layout. The low nibble is always 0.
    pub fn to_byte(self) -> u8 {
        (if self.zero { Self::ZERO_BIT } else { 0 })
            | (if self.subtract { Self::SUBTRACT_BIT } else { 0 })
            | (if self.half_carry { Self::HALF_CARRY_BIT } else { 0 })
            | (if self.carry { Self::CARRY_BIT } else { 0 })
    }

    /// Unpack from the F register layout, ignoring the low nibble.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            zero: byte & Self::ZERO_BIT != 0,
            subtract: byte & Self::SUBTRACT_BIT != 0,
            half_carry: byte & Self::HALF_CARRY_BIT != 0,
            carry: byte & Self::CARRY_BIT != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumDisplay)]
pub enum CpuMode {
    #[default]
    Running,
    // HALT: suspended until an enabled interrupt is requested
    Halted,
    // STOP: suspended until a button press
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuRegisters {
    pub accumulator: u8,
    pub flags: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub ime: bool,
    // IME value requested by DI/EI, applied at the start of the following step
    pub pending_ime: Option<bool>,
    pub mode: CpuMode,
}

impl CpuRegisters {
    /// Create a register file holding the values the DMG boot ROM leaves behind when it jumps to
    /// the cartridge entry point.
    pub fn new() -> Self {
        Self {
            accumulator: 0x01,
            flags: Flags::from_byte(0xB0),
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: address::ENTRY_POINT,
            ime: false,
            pending_ime: None,
            mode: CpuMode::Running,
        }
    }

    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.accumulator, self.flags.to_byte()])
    }

    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    pub fn set_hl(&mut self, hl: u16) {
        let [h, l] = hl.to_be_bytes();
        self.h = h;
        self.l = l;
    }

    pub fn read_register(&self, register: CpuRegister) -> u8 {
        match register {
            CpuRegister::A => self.accumulator,
            CpuRegister::B => self.b,
            CpuRegister::C => self.c,
            CpuRegister::D => self.d,
            CpuRegister::E => self.e,
            CpuRegister::H => self.h,
            CpuRegister::L => self.l,
        }
    }

    pub fn set_register(&mut self, register: CpuRegister, value: u8) {
        match register {
            CpuRegister::A => {
                self.accumulator = value;
            }
            CpuRegister::B => {
                self.b = value;
            }
            CpuRegister::C => {
                self.c = value;
            }
            CpuRegister::D => {
                self.d = value;
            }
            CpuRegister::E => {
                self.e = value;
            }
            CpuRegister::H => {
                self.h = value;
            }
            CpuRegister::L => {
                self.l = value;
            }
        }
    }

    pub fn read_register_pair(&self, register_pair: CpuRegisterPair) -> u16 {
        match register_pair {
            CpuRegisterPair::AF => self.af(),
            CpuRegisterPair::BC => self.bc(),
            CpuRegisterPair::DE => self.de(),
            CpuRegisterPair::HL => self.hl(),
            CpuRegisterPair::SP => self.sp,
        }
    }

    /// Assign a 16-bit value to a register pair. For AF the low nibble of F is discarded.
    pub fn set_register_pair(&mut self, register_pair: CpuRegisterPair, value: u16) {
        let [msb, lsb] = value.to_be_bytes();
        match register_pair {
            CpuRegisterPair::AF => {
                self.accumulator = msb;
                self.flags = Flags::from_byte(lsb & 0xF0);
            }
            CpuRegisterPair::BC => {
                self.b = msb;
                self.c = lsb;
            }
            CpuRegisterPair::DE => {
                self.d = msb;
                self.e = lsb;
            }
            CpuRegisterPair::HL => {
                self.set_hl(value);
            }
            CpuRegisterPair::SP => {
                self.sp = value;
            }
        }
    }

    pub fn set_flags(&mut self, z: bool, n: bool, h: bool, c: bool) {
        self.flags = Flags::new(z, n, h, c);
    }

    /// Update only the flags that are passed as Some, leaving the rest unchanged.
    pub fn set_some_flags(
        &mut self,
        z: Option<bool>,
        n: Option<bool>,
        h: Option<bool>,
        c: Option<bool>,
    ) {
        if let Some(z) = z {
            self.flags.zero = z;
        }
        if let Some(n) = n {
            self.flags.subtract = n;
        }
        if let Some(h) = h {
            self.flags.half_carry = h;
        }
        if let Some(c) = c {
            self.flags.carry = c;
        }
    }

    pub fn zero_flag(&self) -> bool {
        self.flags.zero
    }

    pub fn carry_flag(&self) -> bool {
        self.flags.carry
    }
}

impl Default for CpuRegisters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_byte_layout() {
        assert_eq!(0x80, Flags::new(true, false, false, false).to_byte());
        assert_eq!(0x40, Flags::new(false, true, false, false).to_byte());
        assert_eq!(0x20, Flags::new(false, false, true, false).to_byte());
        assert_eq!(0x10, Flags::new(false, false, false, true).to_byte());
        assert_eq!(0xF0, Flags::from_byte(0xFF).to_byte());
        assert_eq!(Flags::default(), Flags::from_byte(0x0F));
    }

    #[test]
    fn register_pairs_are_high_low() {
        let mut registers = CpuRegisters::new();

        registers.set_register_pair(CpuRegisterPair::BC, 0x1234);
        assert_eq!(0x12, registers.b);
        assert_eq!(0x34, registers.c);

        registers.d = 0xAB;
        registers.e = 0xCD;
        assert_eq!(0xABCD, registers.de());

        registers.set_register_pair(CpuRegisterPair::AF, 0x56FF);
        assert_eq!(0x56, registers.accumulator);
        assert_eq!(0x56F0, registers.af());
    }

    #[test]
    fn opcode_bits_round_trip() {
        for register in [
            CpuRegister::A,
            CpuRegister::B,
            CpuRegister::C,
            CpuRegister::D,
            CpuRegister::E,
            CpuRegister::H,
            CpuRegister::L,
        ] {
            let bits = register.to_opcode_bits();
            assert_eq!(Some(register), CpuRegister::from_low_opcode_bits(bits));
            assert_eq!(Some(register), CpuRegister::from_mid_opcode_bits(bits << 3));
        }

        assert_eq!(None, CpuRegister::from_low_opcode_bits(0x06));
        assert_eq!(None, CpuRegister::from_mid_opcode_bits(0x36));
    }
}
