//! An interpreter for the Game Boy's LR35902 CPU and the 64KB address space it runs against.
//!
//! [`Console`] ties one [`Cpu`] to one [`AddressSpace`] and provides frame-sized stepping. The
//! pieces can also be driven directly: [`Cpu::step`] executes exactly one instruction against a
//! borrowed address space and reports its cost in clock cycles.

mod config;
mod cpu;
mod memory;

pub use config::EmulationConfig;
pub use cpu::{
    interrupt_triggered, parse_next_instruction, Cpu, CpuMode, CpuRegister, CpuRegisterPair,
    CpuRegisters, Flags, Instruction, InterruptType, JumpCondition, ModifyTarget, ParseError,
    ReadTarget, WriteTarget, ISR_CYCLES_REQUIRED,
};
pub use memory::ioregisters::{IoRegister, IoRegisters};
pub use memory::{address, AddressSpace, LoadError, Region, UNUSABLE_READ_VALUE};

/// Clock cycles in one 59.7Hz frame (4194304 Hz / 60).
pub const CYCLES_PER_FRAME: u32 = 69905;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummary {
    /// Cycles actually executed, which may overshoot the budget by part of one instruction.
    pub cycles: u32,
    /// The frame ended early because the CPU is halted or stopped.
    pub suspended: bool,
}

/// A single emulated console. Every console owns its own CPU and memory.
#[derive(Debug, Clone)]
pub struct Console {
    config: EmulationConfig,
    cpu: Cpu,
    address_space: AddressSpace,
}

impl Console {
    pub fn new(config: EmulationConfig) -> Self {
        Self {
            config,
            cpu: Cpu::new(),
            address_space: AddressSpace::new(),
        }
    }

    /// Copy a program into ROM banks 0-1 starting at address 0x0000.
    ///
    /// # Errors
    ///
    /// Returns an error if the program does not fit in 32KB.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), LoadError> {
        self.address_space.load_program(program)
    }

    /// Either dispatch a pending interrupt or execute one instruction, returning the cycles spent.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`Cpu::step`] if the next opcode is illegal.
    pub fn step(&mut self) -> Result<u32, ParseError> {
        if self.config.service_interrupts {
            if let Some(cycles) = self.cpu.service_interrupt(&mut self.address_space) {
                return Ok(cycles);
            }
        }

        self.cpu.step(&mut self.address_space)
    }

    /// Step until the frame's cycle budget is used up or the CPU suspends.
    ///
    /// # Errors
    ///
    /// Propagates the error from [`Cpu::step`] if an illegal opcode is reached; the cycles
    /// executed so far in the frame are lost.
    pub fn run_frame(&mut self) -> Result<FrameSummary, ParseError> {
        let mut cycles = 0;
        while cycles < self.config.frame_cycles {
            let step_cycles = self.step()?;
            if step_cycles == 0 && self.cpu.mode() != CpuMode::Running {
                log::trace!("CPU suspended in {} after {cycles} cycles", self.cpu.mode());
                return Ok(FrameSummary {
                    cycles,
                    suspended: true,
                });
            }

            cycles = cycles.saturating_add(step_cycles);
        }

        Ok(FrameSummary {
            cycles,
            suspended: false,
        })
    }

    pub fn config(&self) -> &EmulationConfig {
        &self.config
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn address_space(&self) -> &AddressSpace {
        &self.address_space
    }

    pub fn address_space_mut(&mut self) -> &mut AddressSpace {
        &mut self.address_space
    }

    /// Drain the bytes written out over the serial port since the last call.
    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.address_space.take_serial_output()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(EmulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console_with_program(program: &[u8]) -> Console {
        let mut rom = vec![0x00; 0x100];
        rom.extend_from_slice(program);

        let mut console = Console::default();
        console
            .load_program(&rom)
            .expect("test program should fit in ROM");
        console
    }

    #[test]
    fn frame_budget() {
        // JR -2
        let mut console = console_with_program(&[0x18, 0xFE]);

        let summary = console.run_frame().expect("JR should decode");
        assert!(!summary.suspended);
        assert!(summary.cycles >= CYCLES_PER_FRAME);
        assert!(summary.cycles < CYCLES_PER_FRAME + 12);
    }

    #[test]
    fn frame_ends_on_halt() {
        // NOP; HALT
        let mut console = console_with_program(&[0x00, 0x76]);

        let summary = console.run_frame().expect("program should decode");
        assert_eq!(
            FrameSummary {
                cycles: 8,
                suspended: true
            },
            summary
        );
        assert_eq!(CpuMode::Halted, console.cpu().mode());
    }

    #[test]
    fn illegal_opcode_propagates() {
        let mut console = console_with_program(&[0x00, 0xDD]);

        assert_eq!(
            Err(ParseError::IllegalOpcode {
                opcode: 0xDD,
                pc: 0x0101
            }),
            console.run_frame()
        );
    }

    #[test]
    fn halted_cpu_services_interrupt() {
        // EI; HALT
        let mut console = console_with_program(&[0xFB, 0x76]);
        // RETI at the VBlank vector
        console.address_space_mut().write_address_u8(0x0040, 0xD9);
        console.address_space_mut().write_address_u8(address::IE_REGISTER, 0x01);

        assert_eq!(Ok(4), console.step());
        assert_eq!(Ok(4), console.step());
        assert_eq!(CpuMode::Halted, console.cpu().mode());
        assert_eq!(Ok(0), console.step());

        console
            .address_space_mut()
            .io_registers_mut()
            .interrupt_flags()
            .set(InterruptType::VBlank);
        assert_eq!(Ok(ISR_CYCLES_REQUIRED), console.step());
        assert_eq!(CpuMode::Running, console.cpu().mode());
        assert_eq!(0x0040, console.cpu().registers().pc);

        // RETI returns past the HALT
        assert_eq!(Ok(16), console.step());
        assert_eq!(0x0102, console.cpu().registers().pc);
        assert!(console.cpu().registers().ime);
    }

    #[test]
    fn stop_ignores_interrupts() {
        // STOP; LD B, 0x42
        let mut console = console_with_program(&[0x10, 0x00, 0x06, 0x42]);
        console.cpu_mut().registers_mut().ime = true;
        console.address_space_mut().write_address_u8(address::IE_REGISTER, 0x04);

        assert_eq!(Ok(4), console.step());
        assert_eq!(CpuMode::Stopped, console.cpu().mode());

        console
            .address_space_mut()
            .io_registers_mut()
            .interrupt_flags()
            .set(InterruptType::Timer);
        assert_eq!(Ok(0), console.step());
        assert_eq!(CpuMode::Stopped, console.cpu().mode());
        assert_eq!(0x0102, console.cpu().registers().pc);
        assert!(console.cpu().registers().ime);

        let summary = console.run_frame().expect("STOP should decode");
        assert!(summary.suspended);

        // A button press resumes execution, then the timer interrupt is dispatched
        console.cpu_mut().wake();
        assert_eq!(Ok(ISR_CYCLES_REQUIRED), console.step());
        assert_eq!(InterruptType::Timer.handler_address(), console.cpu().registers().pc);
    }

    #[test]
    fn frame_budget_near_cycle_limit() {
        let config = EmulationConfig {
            frame_cycles: u32::MAX,
            ..EmulationConfig::default()
        };
        let mut console = Console::new(config);
        // NOP; HALT
        let mut rom = vec![0x00; 0x102];
        rom[0x101] = 0x76;
        console.load_program(&rom).expect("test program should fit in ROM");

        let summary = console.run_frame().expect("program should decode");
        assert_eq!(
            FrameSummary {
                cycles: 8,
                suspended: true
            },
            summary
        );
    }

    #[test]
    fn interrupts_can_be_left_pending() {
        let config = EmulationConfig {
            service_interrupts: false,
            ..EmulationConfig::default()
        };
        let mut console = Console::new(config);
        console.cpu_mut().registers_mut().ime = true;
        console.address_space_mut().write_address_u8(address::IE_REGISTER, 0x01);
        console.address_space_mut().write_address_u8(0xFF0F, 0x01);

        // NOP at the entry point
        assert_eq!(Ok(4), console.step());
        assert_eq!(0x0101, console.cpu().registers().pc);
    }

    #[test]
    fn serial_output() {
        // LD A, 'O'; LDH (0x01), A; LD A, 0x81; LDH (0x02), A; LD A, 'K'; LDH (0x01), A;
        // LD A, 0x81; LDH (0x02), A; HALT
        let mut console = console_with_program(&[
            0x3E, b'O', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02, 0x3E, b'K', 0xE0, 0x01, 0x3E, 0x81,
            0xE0, 0x02, 0x76,
        ]);

        let summary = console.run_frame().expect("program should decode");
        assert!(summary.suspended);
        assert_eq!(b"OK".to_vec(), console.take_serial_output());
        assert!(console.take_serial_output().is_empty());
    }

    #[test]
    fn config_display() {
        assert_eq!(
            "frame_cycles: 69905\nservice_interrupts: true\n",
            EmulationConfig::default().to_string()
        );
    }
}
