//
// Address space boundaries
//

pub const ROM_BANK_0_START: u16 = 0x0000;
pub const ROM_BANK_0_END: u16 = 0x3FFF;

pub const ROM_BANK_1_START: u16 = 0x4000;
pub const ROM_BANK_1_END: u16 = 0x7FFF;

pub const VRAM_START: u16 = 0x8000;
pub const VRAM_END: u16 = 0x9FFF;

pub const EXTERNAL_RAM_START: u16 = 0xA000;
pub const EXTERNAL_RAM_END: u16 = 0xBFFF;

pub const WORKING_RAM_BANK_0_START: u16 = 0xC000;
pub const WORKING_RAM_BANK_0_END: u16 = 0xCFFF;

pub const WORKING_RAM_BANK_1_START: u16 = 0xD000;
pub const WORKING_RAM_BANK_1_END: u16 = 0xDFFF;

pub const ECHO_RAM_START: u16 = 0xE000;
pub const ECHO_RAM_END: u16 = 0xFDFF;

pub const OAM_START: u16 = 0xFE00;
pub const OAM_END: u16 = 0xFE9F;

pub const UNUSABLE_START: u16 = 0xFEA0;
pub const UNUSABLE_END: u16 = 0xFEFF;

pub const IO_REGISTERS_START: u16 = 0xFF00;
pub const IO_REGISTERS_END: u16 = 0xFF7F;

pub const HRAM_START: u16 = 0xFF80;
pub const HRAM_END: u16 = 0xFFFE;

pub const IE_REGISTER: u16 = 0xFFFF;

// Echo RAM addresses map onto working RAM at this distance
pub const ECHO_RAM_OFFSET: u16 = ECHO_RAM_START - WORKING_RAM_BANK_0_START;

//
// Region sizes
//

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const ROM_SIZE: usize = 2 * ROM_BANK_SIZE;
pub const VRAM_SIZE: usize = 0x2000;
pub const EXTERNAL_RAM_SIZE: usize = 0x2000;
pub const WORKING_RAM_BANK_SIZE: usize = 0x1000;
pub const OAM_SIZE: usize = 0xA0;
pub const IO_REGISTERS_SIZE: usize = 0x80;
pub const HRAM_SIZE: usize = 0x7F;

//
// Fixed addresses outside of regular memory regions
//

// Post-boot entry point
pub const ENTRY_POINT: u16 = 0x0100;
