
use crate::cpu::registers::{CpuMode, CpuRegister, CpuRegisterPair};
use crate::cpu::{Cpu, CpuRegisters, Flags, ParseError};
use crate::memory::AddressSpace;
use std::collections::HashMap;

struct ExpectedState {
    a: Option<u8>,
    f: Option<u8>,
    b: Option<u8>,
    c: Option<u8>,
    d: Option<u8>,
    e: Option<u8>,
    h: Option<u8>,
    l: Option<u8>,
    sp: Option<u16>,
    memory: HashMap<u16, u8>,
}

macro_rules! compare_bytes {
    // (expected: Option<T>, actual: T) where T: Eq + LowerHex
    ($([$name:literal, $expected:expr, $actual:expr]),+$(,)?) => {
        {
            let mut match_fails = Vec::new();
            $(
                if let Some(expected) = $expected {
                    let actual = $actual;
                    if expected != actual {
                        match_fails.push(format!("{} mismatch: expected 0x{:02x}, actual 0x{:02x}", $name, expected, actual));
                    }
                }
            )*
            match_fails
        }
    };
}

impl ExpectedState {
    fn empty() -> Self {
        Self {
            a: None,
            f: None,
            b: None,
            c: None,
            d: None,
            e: None,
            h: None,
            l: None,
            sp: None,
            memory: HashMap::new(),
        }
    }

    fn assert_matches(&self, cpu_registers: &CpuRegisters, address_space: &AddressSpace) {
        let mut match_fails = compare_bytes!(
            ["A", self.a, cpu_registers.accumulator],
            ["F", self.f, cpu_registers.flags.to_byte()],
            ["B", self.b, cpu_registers.b],
            ["C", self.c, cpu_registers.c],
            ["D", self.d, cpu_registers.d],
            ["E", self.e, cpu_registers.e],
            ["H", self.h, cpu_registers.h],
            ["L", self.l, cpu_registers.l],
            ["SP", self.sp, cpu_registers.sp],
        );

        for (&address, &expected) in &self.memory {
            let actual = address_space.read_address_u8(address);
            if expected != actual {
                match_fails.push(format!("Mismatch at memory address 0x{address:04x}: expected = {expected:02x}, actual = {actual:02x}"));
            }
        }

        if !match_fails.is_empty() {
            let error_msgs: Vec<_> = match_fails.into_iter().map(|s| format!("[{s}]")).collect();
            let error_msg = error_msgs.join(", ");
            panic!("Expected state does not match actual state: {error_msg}");
        }
    }
}

// Program bytes are placed at 0x0150 behind a JP at the entry point, the same layout a cartridge
// header would force
const PROGRAM_START: u16 = 0x0150;

fn assemble(program_hex: &str) -> Vec<u8> {
    assert!(
        program_hex.len() % 2 == 0,
        "program length is {}, must be a multiple of 2",
        program_hex.len()
    );
    assert!(
        program_hex.chars().all(|c| c.is_ascii_hexdigit()),
        "program contains non-hexadecimal characters: '{program_hex}'"
    );

    let mut rom = vec![0x00; usize::from(PROGRAM_START)];
    // NOP; JP 0x0150
    rom[0x100..0x104].copy_from_slice(&[0x00, 0xC3, 0x50, 0x01]);

    for i in (0..program_hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&program_hex[i..i + 2], 16)
            .expect("program should only contain valid hexadecimal digits");
        rom.push(byte);
    }

    rom
}

/// Run until PC leaves the program or the CPU suspends, returning the final state and the total
/// number of cycles reported by `step`.
fn run_program(program_hex: &str) -> (Cpu, AddressSpace, u32) {
    let rom = assemble(program_hex);
    let rom_len = rom.len() as u16;

    let mut address_space = AddressSpace::new();
    address_space
        .load_program(&rom)
        .expect("synthesized test ROM should fit in ROM banks 0-1");
    let mut cpu = Cpu::new();

    let mut total_cycles = 0;
    while cpu.registers().pc < rom_len && cpu.mode() == CpuMode::Running {
        let cycles = cpu
            .step(&mut address_space)
            .expect("all instructions in program should be valid");
        assert_eq!(cycles, cpu.last_step_cycles());
        total_cycles += cycles;
    }

    (cpu, address_space, total_cycles)
}

/// Place raw instruction bytes in work RAM and point PC at them, for tests that step manually.
fn cpu_at(address: u16, bytes: &[u8]) -> (Cpu, AddressSpace) {
    let mut address_space = AddressSpace::new();
    for (offset, &byte) in (0..).zip(bytes) {
        address_space.write_address_u8(address.wrapping_add(offset), byte);
    }

    let mut cpu = Cpu::new();
    cpu.registers_mut().pc = address;

    (cpu, address_space)
}

fn run_test(program_hex: &str, expected_state: &ExpectedState) {
    let (cpu, address_space, _) = run_program(program_hex);
    expected_state.assert_matches(cpu.registers(), &address_space);
}

macro_rules! hash_map {
    ($($key:literal: $value:expr),+$(,)?) => {
        {
            let mut map = ::std::collections::HashMap::new();
            $(
                map.insert($key, $value);
            )*
            map
        }
    }
}

use hash_map;

const ALL_REGISTERS: [CpuRegister; 7] = [
    CpuRegister::A,
    CpuRegister::B,
    CpuRegister::C,
    CpuRegister::D,
    CpuRegister::E,
    CpuRegister::H,
    CpuRegister::L,
];

fn set_in_state(state: &mut ExpectedState, register: CpuRegister, value: u8) {
    let var_ref = match register {
        CpuRegister::A => &mut state.a,
        CpuRegister::B => &mut state.b,
        CpuRegister::C => &mut state.c,
        CpuRegister::D => &mut state.d,
        CpuRegister::E => &mut state.e,
        CpuRegister::H => &mut state.h,
        CpuRegister::L => &mut state.l,
    };

    *var_ref = Some(value);
}

#[test]
fn power_on_registers() {
    let cpu = Cpu::new();
    let registers = cpu.registers();

    assert_eq!(0x01B0, registers.af());
    assert_eq!(0x0013, registers.bc());
    assert_eq!(0x00D8, registers.de());
    assert_eq!(0x014D, registers.hl());
    assert_eq!(0xFFFE, registers.sp);
    assert_eq!(0x0100, registers.pc);
    assert_eq!(Flags::new(true, false, true, true), registers.flags);
    assert!(!registers.ime);
    assert_eq!(CpuMode::Running, cpu.mode());
}

#[test]
fn load_register_immediate() {
    for r in ALL_REGISTERS {
        let opcode = 0x06 | (r.to_opcode_bits() << 3);

        let mut expected_state = ExpectedState::empty();
        set_in_state(&mut expected_state, r, 0x45);

        // LD <R>, 0x45
        run_test(&format!("{opcode:02x}45"), &expected_state);
    }
}

#[test]
fn load_register_register() {
    for r1 in ALL_REGISTERS {
        let ldri = 0x06 | (r1.to_opcode_bits() << 3);
        // LD <R1>, 0x45
        let ldri = format!("{ldri:02x}45");

        for r2 in ALL_REGISTERS {
            let opcode = 0x40 | (r2.to_opcode_bits() << 3) | r1.to_opcode_bits();

            // LD <R2>, <R1>
            let program_hex = format!("{ldri}{opcode:02x}");

            let mut expected_state = ExpectedState::empty();
            set_in_state(&mut expected_state, r2, 0x45);

            run_test(&program_hex, &expected_state);
        }
    }
}

#[test]
fn load_register_pair_immediate() {
    run_test(
        // LD BC, 0x1234; LD DE, 0x5678; LD HL, 0x9ABC; LD SP, 0xDEF0
        "01341211785621BC9A31F0DE",
        &ExpectedState {
            b: Some(0x12),
            c: Some(0x34),
            d: Some(0x56),
            e: Some(0x78),
            h: Some(0x9A),
            l: Some(0xBC),
            sp: Some(0xDEF0),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_hl() {
    run_test(
        // LD HL, 0xC123; LD (HL), 0x7E; LD B, (HL); LD (HL), B
        "2123C1367E4670",
        &ExpectedState {
            b: Some(0x7E),
            memory: hash_map! { 0xC123: 0x7E },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_indirect_bc_de() {
    run_test(
        // LD BC, 0xC001; LD DE, 0xC002; LD A, 0x11; LD (BC), A; LD A, 0x22; LD (DE), A;
        // LD A, (BC)
        "0101C01102C03E11023E22120A",
        &ExpectedState {
            a: Some(0x11),
            memory: hash_map! { 0xC001: 0x11, 0xC002: 0x22 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_direct() {
    run_test(
        // LD A, 0x9C; LD (0xD345), A; LD A, 0x00; LD A, (0xD345)
        "3E9CEA45D33E00FA45D3",
        &ExpectedState {
            a: Some(0x9C),
            memory: hash_map! { 0xD345: 0x9C },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn ldh() {
    run_test(
        // LD A, 0x3C; LDH (0x85), A; LD C, 0x86; LD A, 0x4D; LDH (C), A; LDH A, (0x85); LD B, A;
        // LDH A, (C)
        "3E3CE0850E863E4DE2F08547F2",
        &ExpectedState {
            a: Some(0x4D),
            b: Some(0x3C),
            memory: hash_map! { 0xFF85: 0x3C, 0xFF86: 0x4D },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_hl_inc_dec() {
    run_test(
        // LD HL, 0xC0FF; LD A, 0x01; LD (HL+), A; LD A, 0x02; LD (HL-), A; LD A, (HL+)
        "21FFC03E01223E02322A",
        &ExpectedState {
            a: Some(0x01),
            h: Some(0xC1),
            l: Some(0x00),
            memory: hash_map! { 0xC0FF: 0x01, 0xC100: 0x02 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD HL, 0xC100; LD (HL), 0x5A; LD A, (HL-)
        "2100C1365A3A",
        &ExpectedState {
            a: Some(0x5A),
            h: Some(0xC0),
            l: Some(0xFF),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn load_stack_pointer() {
    run_test(
        // LD HL, 0xD00D; LD SP, HL; LD (0xC000), SP
        "210DD0F90800C0",
        &ExpectedState {
            sp: Some(0xD00D),
            memory: hash_map! { 0xC000: 0x0D, 0xC001: 0xD0 },
            ..ExpectedState::empty()
        },
    );

    run_test(
        // LD SP, 0xFFF8; LD HL, SP+2
        "31F8FFF802",
        &ExpectedState {
            h: Some(0xFF),
            l: Some(0xFA),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn echo_ram_through_cpu() {
    run_test(
        // LD A, 0x77; LD (0xE010), A; LD A, 0x00; LD A, (0xC010)
        "3E77EA10E03E00FA10C0",
        &ExpectedState {
            a: Some(0x77),
            memory: hash_map! { 0xC010: 0x77, 0xE010: 0x77 },
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn illegal_opcode() {
    for opcode in [0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD] {
        let mut address_space = AddressSpace::new();
        address_space.write_address_u8(0xC000, opcode);

        let mut cpu = Cpu::new();
        cpu.registers_mut().pc = 0xC000;
        // A pending IME change must survive a failed step
        cpu.registers_mut().pending_ime = Some(true);
        let before = cpu.clone();

        assert_eq!(
            Err(ParseError::IllegalOpcode { opcode, pc: 0xC000 }),
            cpu.step(&mut address_space)
        );
        assert_eq!(before, cpu);
    }
}

#[test]
fn register_pair_accessors() {
    let mut cpu = Cpu::new();
    let registers = cpu.registers_mut();

    registers.set_register_pair(CpuRegisterPair::BC, 0xABCD);
    assert_eq!(0xAB, registers.b);
    assert_eq!(0xCD, registers.c);

    // Pairs are derived from the individual registers every time
    registers.c = 0x01;
    assert_eq!(0xAB01, registers.bc());
}
