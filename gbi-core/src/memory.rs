pub mod address;
pub mod ioregisters;

use crate::memory::ioregisters::IoRegisters;
use gbi_proc_macros::EnumDisplay;
use thiserror::Error;

/// Value returned for reads from the unusable region (0xFEA0-0xFEFF).
pub const UNUSABLE_READ_VALUE: u8 = 0xFF;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LoadError {
    #[error("program is {len} bytes, larger than the ROM capacity of {capacity} bytes")]
    ProgramTooLarge { len: usize, capacity: usize },
}

/// One of the fixed regions of the 16-bit address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumDisplay)]
pub enum Region {
    #[display = "ROM bank 0"]
    RomBank0,
    #[display = "ROM bank 1"]
    RomBank1,
    #[display = "video RAM"]
    VideoRam,
    #[display = "external RAM"]
    ExternalRam,
    #[display = "work RAM bank 0"]
    WorkRamBank0,
    #[display = "work RAM bank 1"]
    WorkRamBank1,
    #[display = "echo RAM"]
    EchoRam,
    #[display = "OAM"]
    ObjectAttributeMemory,
    #[display = "unusable"]
    Unusable,
    #[display = "I/O registers"]
    IoRegisters,
    #[display = "high RAM"]
    HighRam,
    #[display = "interrupt enable"]
    InterruptEnable,
}

impl Region {
    pub const ALL: [Self; 12] = [
        Self::RomBank0,
        Self::RomBank1,
        Self::VideoRam,
        Self::ExternalRam,
        Self::WorkRamBank0,
        Self::WorkRamBank1,
        Self::EchoRam,
        Self::ObjectAttributeMemory,
        Self::Unusable,
        Self::IoRegisters,
        Self::HighRam,
        Self::InterruptEnable,
    ];

    /// Return the region that claims the given address. Every 16-bit address belongs to exactly
    /// one region.
    pub fn from_address(address: u16) -> Self {
        match address {
            address::ROM_BANK_0_START..=address::ROM_BANK_0_END => Self::RomBank0,
            address::ROM_BANK_1_START..=address::ROM_BANK_1_END => Self::RomBank1,
            address::VRAM_START..=address::VRAM_END => Self::VideoRam,
            address::EXTERNAL_RAM_START..=address::EXTERNAL_RAM_END => Self::ExternalRam,
            address::WORKING_RAM_BANK_0_START..=address::WORKING_RAM_BANK_0_END => {
                Self::WorkRamBank0
            }
            address::WORKING_RAM_BANK_1_START..=address::WORKING_RAM_BANK_1_END => {
                Self::WorkRamBank1
            }
            address::ECHO_RAM_START..=address::ECHO_RAM_END => Self::EchoRam,
            address::OAM_START..=address::OAM_END => Self::ObjectAttributeMemory,
            address::UNUSABLE_START..=address::UNUSABLE_END => Self::Unusable,
            address::IO_REGISTERS_START..=address::IO_REGISTERS_END => Self::IoRegisters,
            address::HRAM_START..=address::HRAM_END => Self::HighRam,
            address::IE_REGISTER => Self::InterruptEnable,
        }
    }

    pub fn start_address(self) -> u16 {
        match self {
            Self::RomBank0 => address::ROM_BANK_0_START,
            Self::RomBank1 => address::ROM_BANK_1_START,
            Self::VideoRam => address::VRAM_START,
            Self::ExternalRam => address::EXTERNAL_RAM_START,
            Self::WorkRamBank0 => address::WORKING_RAM_BANK_0_START,
            Self::WorkRamBank1 => address::WORKING_RAM_BANK_1_START,
            Self::EchoRam => address::ECHO_RAM_START,
            Self::ObjectAttributeMemory => address::OAM_START,
            Self::Unusable => address::UNUSABLE_START,
            Self::IoRegisters => address::IO_REGISTERS_START,
            Self::HighRam => address::HRAM_START,
            Self::InterruptEnable => address::IE_REGISTER,
        }
    }

    pub fn end_address(self) -> u16 {
        match self {
            Self::RomBank0 => address::ROM_BANK_0_END,
            Self::RomBank1 => address::ROM_BANK_1_END,
            Self::VideoRam => address::VRAM_END,
            Self::ExternalRam => address::EXTERNAL_RAM_END,
            Self::WorkRamBank0 => address::WORKING_RAM_BANK_0_END,
            Self::WorkRamBank1 => address::WORKING_RAM_BANK_1_END,
            Self::EchoRam => address::ECHO_RAM_END,
            Self::ObjectAttributeMemory => address::OAM_END,
            Self::Unusable => address::UNUSABLE_END,
            Self::IoRegisters => address::IO_REGISTERS_END,
            Self::HighRam => address::HRAM_END,
            Self::InterruptEnable => address::IE_REGISTER,
        }
    }
}

// Where an address lands after aliasing is resolved. Echo RAM never appears here because it is
// folded into the working RAM banks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MappedAddress {
    Rom(usize),
    VideoRam(usize),
    ExternalRam(usize),
    WorkingRam { bank: usize, offset: usize },
    Oam(usize),
    Unusable,
    IoRegister(u16),
    HighRam(usize),
    InterruptEnable,
}

fn map_address(address: u16) -> MappedAddress {
    let region = Region::from_address(address);
    let offset = usize::from(address - region.start_address());
    match region {
        Region::RomBank0 | Region::RomBank1 => MappedAddress::Rom(usize::from(address)),
        Region::VideoRam => MappedAddress::VideoRam(offset),
        Region::ExternalRam => MappedAddress::ExternalRam(offset),
        Region::WorkRamBank0 => MappedAddress::WorkingRam { bank: 0, offset },
        Region::WorkRamBank1 => MappedAddress::WorkingRam { bank: 1, offset },
        Region::EchoRam => map_address(address - address::ECHO_RAM_OFFSET),
        Region::ObjectAttributeMemory => MappedAddress::Oam(offset),
        Region::Unusable => MappedAddress::Unusable,
        Region::IoRegisters => MappedAddress::IoRegister(address),
        Region::HighRam => MappedAddress::HighRam(offset),
        Region::InterruptEnable => MappedAddress::InterruptEnable,
    }
}

#[derive(Debug, Clone)]
pub struct AddressSpace {
    rom: Box<[u8; address::ROM_SIZE]>,
    vram: Box<[u8; address::VRAM_SIZE]>,
    external_ram: Box<[u8; address::EXTERNAL_RAM_SIZE]>,
    working_ram: [[u8; address::WORKING_RAM_BANK_SIZE]; 2],
    oam: [u8; address::OAM_SIZE],
    io_registers: IoRegisters,
    hram: [u8; address::HRAM_SIZE],
    ie_register: u8,
}

impl AddressSpace {
    /// Create an address space in its power-on state: every store zeroed except for the I/O
    /// registers, which hold their documented post-boot values.
    pub fn new() -> Self {
        Self {
            rom: Box::new([0; address::ROM_SIZE]),
            vram: Box::new([0; address::VRAM_SIZE]),
            external_ram: Box::new([0; address::EXTERNAL_RAM_SIZE]),
            working_ram: [[0; address::WORKING_RAM_BANK_SIZE]; 2],
            oam: [0; address::OAM_SIZE],
            io_registers: IoRegisters::new(),
            hram: [0; address::HRAM_SIZE],
            ie_register: 0,
        }
    }

    /// Copy a program into the ROM banks starting at address 0x0000.
    ///
    /// # Errors
    ///
    /// Returns an error if the program does not fit in the two ROM banks.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        if program.len() > address::ROM_SIZE {
            return Err(LoadError::ProgramTooLarge {
                len: program.len(),
                capacity: address::ROM_SIZE,
            });
        }

        log::debug!("Loading {} byte program into ROM", program.len());

        self.rom[..program.len()].copy_from_slice(program);
        self.rom[program.len()..].fill(0);

        Ok(())
    }

    pub fn read_address_u8(&self, address: u16) -> u8 {
        match map_address(address) {
            MappedAddress::Rom(i) => self.rom[i],
            MappedAddress::VideoRam(i) => self.vram[i],
            MappedAddress::ExternalRam(i) => self.external_ram[i],
            MappedAddress::WorkingRam { bank, offset } => self.working_ram[bank][offset],
            MappedAddress::Oam(i) => self.oam[i],
            MappedAddress::Unusable => UNUSABLE_READ_VALUE,
            MappedAddress::IoRegister(address) => self.io_registers.read_address(address),
            MappedAddress::HighRam(i) => self.hram[i],
            MappedAddress::InterruptEnable => self.ie_register,
        }
    }

    /// Read a little-endian 16-bit value: the low byte at `address`, the high byte at
    /// `address + 1`.
    pub fn read_address_u16(&self, address: u16) -> u16 {
        let lsb = self.read_address_u8(address);
        let msb = self.read_address_u8(address.wrapping_add(1));
        u16::from_le_bytes([lsb, msb])
    }

    pub fn write_address_u8(&mut self, address: u16, value: u8) {
        match map_address(address) {
            MappedAddress::Rom(i) => {
                self.rom[i] = value;
            }
            MappedAddress::VideoRam(i) => {
                self.vram[i] = value;
            }
            MappedAddress::ExternalRam(i) => {
                self.external_ram[i] = value;
            }
            MappedAddress::WorkingRam { bank, offset } => {
                self.working_ram[bank][offset] = value;
            }
            MappedAddress::Oam(i) => {
                self.oam[i] = value;
            }
            MappedAddress::Unusable => {
                log::trace!("Ignoring write of {value:02X} to unusable address {address:04X}");
            }
            MappedAddress::IoRegister(address) => {
                self.io_registers.write_address(address, value);
            }
            MappedAddress::HighRam(i) => {
                self.hram[i] = value;
            }
            MappedAddress::InterruptEnable => {
                self.ie_register = value;
            }
        }
    }

    /// Write a little-endian 16-bit value: the low byte to `address`, the high byte to
    /// `address + 1`.
    pub fn write_address_u16(&mut self, address: u16, value: u16) {
        let [lsb, msb] = value.to_le_bytes();
        self.write_address_u8(address, lsb);
        self.write_address_u8(address.wrapping_add(1), msb);
    }

    /// Increment the byte at the given address in place, wrapping on overflow.
    pub fn increment_address(&mut self, address: u16) {
        let value = self.read_address_u8(address);
        self.write_address_u8(address, value.wrapping_add(1));
    }

    /// Decrement the byte at the given address in place, wrapping on underflow.
    pub fn decrement_address(&mut self, address: u16) {
        let value = self.read_address_u8(address);
        self.write_address_u8(address, value.wrapping_sub(1));
    }

    pub fn ie_register(&self) -> u8 {
        self.ie_register
    }

    pub fn io_registers(&self) -> &IoRegisters {
        &self.io_registers
    }

    pub fn io_registers_mut(&mut self) -> &mut IoRegisters {
        &mut self.io_registers
    }

    /// Bytes the running program has sent over the serial port and that have not been taken yet.
    pub fn serial_output(&self) -> &[u8] {
        self.io_registers.serial_output()
    }

    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.io_registers.take_serial_output()
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}
