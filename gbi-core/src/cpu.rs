pub(crate) mod instructions;
mod registers;

#[cfg(test)]
mod tests;

use crate::cpu::instructions::push_stack;
use crate::memory::ioregisters::IoRegister;
use crate::memory::AddressSpace;

pub use instructions::{
    parse_next_instruction, Instruction, JumpCondition, ModifyTarget, ParseError, ReadTarget,
    WriteTarget,
};
pub use registers::{CpuMode, CpuRegister, CpuRegisterPair, CpuRegisters, Flags};

pub const ISR_CYCLES_REQUIRED: u32 = 20;

// IE/IF only define the low five bits
const INTERRUPT_MASK: u8 = 0x1F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptType {
    VBlank,
    LcdStatus,
    Timer,
    Serial,
    Joypad,
}

impl InterruptType {
    /// All interrupt types in priority order, highest first.
    pub const ALL: [Self; 5] = [
        Self::VBlank,
        Self::LcdStatus,
        Self::Timer,
        Self::Serial,
        Self::Joypad,
    ];

    pub fn handler_address(self) -> u16 {
        match self {
            Self::VBlank => 0x0040,
            Self::LcdStatus => 0x0048,
            Self::Timer => 0x0050,
            Self::Serial => 0x0058,
            Self::Joypad => 0x0060,
        }
    }

    pub fn bit(self) -> u8 {
        match self {
            Self::VBlank => 0x01,
            Self::LcdStatus => 0x02,
            Self::Timer => 0x04,
            Self::Serial => 0x08,
            Self::Joypad => 0x10,
        }
    }
}

fn interrupt_pending(address_space: &AddressSpace) -> bool {
    let ie_value = address_space.ie_register();
    let if_value = address_space.io_registers().read_register(IoRegister::IF);

    ie_value & if_value & INTERRUPT_MASK != 0
}

/// Returns whether the CPU should dispatch an interrupt before the next instruction: IME is set
/// and at least one interrupt is both requested in IF and enabled in IE.
pub fn interrupt_triggered(cpu_registers: &CpuRegisters, address_space: &AddressSpace) -> bool {
    cpu_registers.ime && interrupt_pending(address_space)
}

/// The instruction interpreter. Owns the register file and the cycle cost of the most recent
/// step; memory is always borrowed from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cpu {
    registers: CpuRegisters,
    last_step_cycles: u32,
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            registers: CpuRegisters::new(),
            last_step_cycles: 0,
        }
    }

    /// Execute one instruction and return the number of clock cycles it took.
    ///
    /// A halted CPU resumes once an enabled interrupt is requested, even with IME off. While
    /// halted or stopped this returns 0 without fetching anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the opcode at PC is illegal. Neither the registers nor memory are
    /// modified in that case.
    pub fn step(&mut self, address_space: &mut AddressSpace) -> Result<u32, ParseError> {
        if self.registers.mode == CpuMode::Halted && interrupt_pending(address_space) {
            log::debug!("Interrupt requested, leaving HALT");
            self.registers.mode = CpuMode::Running;
        }

        if self.registers.mode != CpuMode::Running {
            self.last_step_cycles = 0;
            return Ok(0);
        }

        let (instruction, next_pc) =
            instructions::parse_next_instruction(address_space, self.registers.pc)?;

        log::trace!("Executing instruction {instruction:02X?} at PC {:04X}", self.registers.pc);
        log::trace!("CPU registers before instruction: {:04X?}", self.registers);

        // DI/EI take effect once the instruction after them starts
        if let Some(ime) = self.registers.pending_ime.take() {
            self.registers.ime = ime;
        }

        self.registers.pc = next_pc;

        // Cycle counts of conditional instructions depend on flags as they were before execution
        let cycles_required = instruction.cycles_required(&self.registers);
        instruction.execute(address_space, &mut self.registers);

        self.last_step_cycles = cycles_required;
        Ok(cycles_required)
    }

    /// Push PC and jump to the handler of the highest priority pending interrupt, clearing its IF
    /// bit and IME. Returns the cycles spent, or None if no interrupt was triggered or the CPU is
    /// stopped.
    pub fn service_interrupt(&mut self, address_space: &mut AddressSpace) -> Option<u32> {
        // Only a button press ends STOP
        if self.registers.mode == CpuMode::Stopped
            || !interrupt_triggered(&self.registers, address_space)
        {
            return None;
        }

        let ie_value = address_space.ie_register();
        let interrupt_type = address_space
            .io_registers_mut()
            .interrupt_flags()
            .highest_priority_interrupt(ie_value)?;

        log::debug!(
            "Interrupt type {interrupt_type:?} triggered, replacing previous PC of {:04X} with {:04X}",
            self.registers.pc,
            interrupt_type.handler_address()
        );

        let return_address = self.registers.pc;
        push_stack(&mut self.registers, address_space, return_address);
        self.registers.pc = interrupt_type.handler_address();

        address_space
            .io_registers_mut()
            .interrupt_flags()
            .clear(interrupt_type);
        self.registers.ime = false;
        self.registers.mode = CpuMode::Running;

        self.last_step_cycles = ISR_CYCLES_REQUIRED;
        Some(ISR_CYCLES_REQUIRED)
    }

    pub fn mode(&self) -> CpuMode {
        self.registers.mode
    }

    /// Clear a HALT or STOP suspension, e.g. on a button press.
    pub fn wake(&mut self) {
        if self.registers.mode != CpuMode::Running {
            log::debug!("Waking CPU from {}", self.registers.mode);
            self.registers.mode = CpuMode::Running;
        }
    }

    pub fn last_step_cycles(&self) -> u32 {
        self.last_step_cycles
    }

    pub fn registers(&self) -> &CpuRegisters {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut CpuRegisters {
        &mut self.registers
    }
}
