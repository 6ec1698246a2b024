mod parse;

use crate::cpu::registers::{CpuMode, CpuRegister, CpuRegisterPair, CpuRegisters, Flags};
use crate::memory::AddressSpace;

pub use parse::{parse_next_instruction, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCondition {
    NZ,
    Z,
    NC,
    C,
}

impl JumpCondition {
    fn check(self, cpu_registers: &CpuRegisters) -> bool {
        match self {
            Self::NZ => !cpu_registers.zero_flag(),
            Self::Z => cpu_registers.zero_flag(),
            Self::NC => !cpu_registers.carry_flag(),
            Self::C => cpu_registers.carry_flag(),
        }
    }
}

/// An 8-bit operand source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    Register(CpuRegister),
    Accumulator,
    Immediate(u8),
    IndirectHL,
    IndirectBC,
    IndirectDE,
    IndirectHLInc,
    IndirectHLDec,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
}

impl ReadTarget {
    fn read_value(self, cpu_registers: &mut CpuRegisters, address_space: &AddressSpace) -> u8 {
        match self {
            Self::Register(r) => cpu_registers.read_register(r),
            Self::Accumulator => cpu_registers.accumulator,
            Self::Immediate(n) => n,
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl()),
            Self::IndirectBC => address_space.read_address_u8(cpu_registers.bc()),
            Self::IndirectDE => address_space.read_address_u8(cpu_registers.de()),
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_add(1));
                address_space.read_address_u8(hl)
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                cpu_registers.set_hl(hl.wrapping_sub(1));
                address_space.read_address_u8(hl)
            }
            Self::Direct(nn) => address_space.read_address_u8(nn),
            Self::FFDirect(n) => address_space.read_address_u8(u16::from_be_bytes([0xFF, n])),
            Self::FFIndirectC => {
                address_space.read_address_u8(u16::from_be_bytes([0xFF, cpu_registers.c]))
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::Immediate(..)
            | Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::FFIndirectC => 4,
            Self::FFDirect(..) => 8,
            Self::Direct(..) => 12,
        }
    }
}

/// An 8-bit operand destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTarget {
    Register(CpuRegister),
    Accumulator,
    IndirectHL,
    IndirectBC,
    IndirectDE,
    IndirectHLInc,
    IndirectHLDec,
    Direct(u16),
    FFDirect(u8),
    FFIndirectC,
}

impl WriteTarget {
    fn write_value(
        self,
        value: u8,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace,
    ) {
        match self {
            Self::Register(r) => {
                cpu_registers.set_register(r, value);
            }
            Self::Accumulator => {
                cpu_registers.accumulator = value;
            }
            Self::IndirectHL => {
                address_space.write_address_u8(cpu_registers.hl(), value);
            }
            Self::IndirectBC => {
                address_space.write_address_u8(cpu_registers.bc(), value);
            }
            Self::IndirectDE => {
                address_space.write_address_u8(cpu_registers.de(), value);
            }
            Self::IndirectHLInc => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value);
                cpu_registers.set_hl(hl.wrapping_add(1));
            }
            Self::IndirectHLDec => {
                let hl = cpu_registers.hl();
                address_space.write_address_u8(hl, value);
                cpu_registers.set_hl(hl.wrapping_sub(1));
            }
            Self::Direct(nn) => {
                address_space.write_address_u8(nn, value);
            }
            Self::FFDirect(n) => {
                address_space.write_address_u8(u16::from_be_bytes([0xFF, n]), value);
            }
            Self::FFIndirectC => {
                address_space.write_address_u8(u16::from_be_bytes([0xFF, cpu_registers.c]), value);
            }
        }
    }

    fn cycles_required(self) -> u32 {
        match self {
            Self::Register(..) | Self::Accumulator => 0,
            Self::IndirectHL
            | Self::IndirectBC
            | Self::IndirectDE
            | Self::IndirectHLInc
            | Self::IndirectHLDec
            | Self::FFIndirectC => 4,
            Self::FFDirect(..) => 8,
            Self::Direct(..) => 12,
        }
    }
}

/// An 8-bit operand that is read, transformed and written back in place.
///
/// `Accumulator` is used only by the one-byte rotate forms (RLCA/RLA/RRCA/RRA), which differ from
/// the CB-prefixed forms on `Register(A)` in that they always clear the Z flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyTarget {
    Accumulator,
    Register(CpuRegister),
    IndirectHL,
}

impl ModifyTarget {
    fn read_value(self, cpu_registers: &CpuRegisters, address_space: &AddressSpace) -> u8 {
        match self {
            Self::Accumulator => cpu_registers.accumulator,
            Self::Register(r) => cpu_registers.read_register(r),
            Self::IndirectHL => address_space.read_address_u8(cpu_registers.hl()),
        }
    }

    fn write_value(
        self,
        value: u8,
        cpu_registers: &mut CpuRegisters,
        address_space: &mut AddressSpace,
    ) {
        match self {
            Self::Accumulator => {
                cpu_registers.accumulator = value;
            }
            Self::Register(r) => {
                cpu_registers.set_register(r, value);
            }
            Self::IndirectHL => {
                address_space.write_address_u8(cpu_registers.hl(), value);
            }
        }
    }

    // Cost of a CB-prefixed operation on this target
    fn prefixed_cycles_required(self) -> u32 {
        match self {
            Self::Accumulator => 4,
            Self::Register(..) => 8,
            Self::IndirectHL => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // LD r, r' / LD r, n / LD r, (HL) / LD (HL), r / LD (HL), n / LD A, (BC) / LD A, (DE)
    // LD (BC), A / LD (DE), A / LD A, (nn) / LD (nn), A / LDH A, (C) / LDH (C), A
    // LDH A, (n) / LDH (n), A / LD A, (HL-) / LD (HL-), A / LD A, (HL+) / LD (HL+), A
    Load(WriteTarget, ReadTarget),
    // LD rr, nn
    LoadRegisterPairImmediate(CpuRegisterPair, u16),
    // LD (nn), SP
    LoadDirectStackPointer(u16),
    // LD SP, HL
    LoadStackPointerHL,
    // LD HL, SP+e
    LoadHLStackPointerOffset(i8),
    // PUSH rr
    PushStack(CpuRegisterPair),
    // POP rr
    PopStack(CpuRegisterPair),
    // ADD A, _
    Add(ReadTarget),
    // ADC A, _
    AddWithCarry(ReadTarget),
    // SUB _
    Subtract(ReadTarget),
    // SBC A, _
    SubtractWithCarry(ReadTarget),
    // CP _
    Compare(ReadTarget),
    // INC _
    Increment(ModifyTarget),
    // DEC _
    Decrement(ModifyTarget),
    // AND _
    And(ReadTarget),
    // OR _
    Or(ReadTarget),
    // XOR _
    Xor(ReadTarget),
    // ADD HL, rr
    AddHLRegister(CpuRegisterPair),
    // INC rr
    IncRegisterPair(CpuRegisterPair),
    // DEC rr
    DecRegisterPair(CpuRegisterPair),
    // ADD SP, e
    AddSPImmediate(i8),
    // RLCA / RLC _
    RotateLeft(ModifyTarget),
    // RLA / RL _
    RotateLeftThruCarry(ModifyTarget),
    // RRCA / RRC _
    RotateRight(ModifyTarget),
    // RRA / RR _
    RotateRightThruCarry(ModifyTarget),
    // SLA _
    ShiftLeft(ModifyTarget),
    // SRA _
    ArithmeticShiftRight(ModifyTarget),
    // SRL _
    LogicalShiftRight(ModifyTarget),
    // SWAP _
    Swap(ModifyTarget),
    // BIT n, _
    TestBit(u8, ReadTarget),
    // SET n, _
    SetBit(u8, ModifyTarget),
    // RES n, _
    ResetBit(u8, ModifyTarget),
    // CCF
    ComplementCarryFlag,
    // SCF
    SetCarryFlag,
    // DAA
    DecimalAdjustAccumulator,
    // CPL
    ComplementAccumulator,
    // JP nn
    Jump(u16),
    // JP HL
    JumpHL,
    // JP cc, nn
    JumpCond(JumpCondition, u16),
    // JR e
    RelativeJump(i8),
    // JR cc, e
    RelativeJumpCond(JumpCondition, i8),
    // CALL nn
    Call(u16),
    // CALL cc, nn
    CallCond(JumpCondition, u16),
    // RET
    Return,
    // RET cc
    ReturnCond(JumpCondition),
    // RETI
    ReturnFromInterruptHandler,
    // RST n
    RestartCall(u8),
    // HALT
    Halt,
    // STOP
    Stop,
    // DI
    DisableInterrupts,
    // EI
    EnableInterrupts,
    // NOP
    NoOp,
}

impl Instruction {
    /// Execute this instruction, modifying CPU registers and memory as needed.
    ///
    /// PC must already point at the next instruction; control flow instructions overwrite it.
    pub fn execute(self, address_space: &mut AddressSpace, cpu_registers: &mut CpuRegisters) {
        match self {
            Self::Load(write_target, read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                write_target.write_value(value, cpu_registers, address_space);
            }
            Self::LoadRegisterPairImmediate(rr, nn) => {
                cpu_registers.set_register_pair(rr, nn);
            }
            Self::LoadDirectStackPointer(nn) => {
                address_space.write_address_u16(nn, cpu_registers.sp);
            }
            Self::LoadStackPointerHL => {
                cpu_registers.sp = cpu_registers.hl();
            }
            Self::LoadHLStackPointerOffset(e) => {
                let (sum, h_flag, c_flag) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.set_hl(sum);
                cpu_registers.set_flags(false, false, h_flag, c_flag);
            }
            Self::PushStack(rr) => {
                let value = cpu_registers.read_register_pair(rr);
                push_stack(cpu_registers, address_space, value);
            }
            Self::PopStack(rr) => {
                let value = pop_stack(cpu_registers, address_space);
                cpu_registers.set_register_pair(rr, value);
            }
            Self::Add(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (sum, carry, h_flag) = add(cpu_registers.accumulator, value, false);
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, carry);
            }
            Self::AddWithCarry(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (sum, carry, h_flag) =
                    add(cpu_registers.accumulator, value, cpu_registers.carry_flag());
                cpu_registers.accumulator = sum;
                cpu_registers.set_flags(sum == 0, false, h_flag, carry);
            }
            Self::Subtract(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (difference, carry, h_flag) = sub(cpu_registers.accumulator, value, false);
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::SubtractWithCarry(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (difference, carry, h_flag) =
                    sub(cpu_registers.accumulator, value, cpu_registers.carry_flag());
                cpu_registers.accumulator = difference;
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::Compare(read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let (difference, carry, h_flag) = sub(cpu_registers.accumulator, value, false);
                cpu_registers.set_flags(difference == 0, true, h_flag, carry);
            }
            Self::Increment(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let (sum, _, h_flag) = add(value, 1, false);
                modify_target.write_value(sum, cpu_registers, address_space);
                cpu_registers.set_some_flags(Some(sum == 0), Some(false), Some(h_flag), None);
            }
            Self::Decrement(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let (difference, _, h_flag) = sub(value, 1, false);
                modify_target.write_value(difference, cpu_registers, address_space);
                cpu_registers.set_some_flags(Some(difference == 0), Some(true), Some(h_flag), None);
            }
            Self::And(read_target) => {
                let operand = read_target.read_value(cpu_registers, address_space);
                let value = cpu_registers.accumulator & operand;
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, true, false);
            }
            Self::Or(read_target) => {
                let operand = read_target.read_value(cpu_registers, address_space);
                let value = cpu_registers.accumulator | operand;
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::Xor(read_target) => {
                let operand = read_target.read_value(cpu_registers, address_space);
                let value = cpu_registers.accumulator ^ operand;
                cpu_registers.accumulator = value;
                cpu_registers.set_flags(value == 0, false, false, false);
            }
            Self::AddHLRegister(rr) => {
                let (sum, carry, h_flag) =
                    add_u16(cpu_registers.hl(), cpu_registers.read_register_pair(rr));
                cpu_registers.set_hl(sum);
                cpu_registers.set_some_flags(None, Some(false), Some(h_flag), Some(carry));
            }
            Self::IncRegisterPair(rr) => {
                cpu_registers
                    .set_register_pair(rr, cpu_registers.read_register_pair(rr).wrapping_add(1));
            }
            Self::DecRegisterPair(rr) => {
                cpu_registers
                    .set_register_pair(rr, cpu_registers.read_register_pair(rr).wrapping_sub(1));
            }
            Self::AddSPImmediate(e) => {
                let (sum, h_flag, c_flag) = add_sp_offset(cpu_registers.sp, e);
                cpu_registers.sp = sum;
                cpu_registers.set_flags(false, false, h_flag, c_flag);
            }
            Self::RotateLeft(modify_target) => {
                modify_with(modify_target, cpu_registers, address_space, |value, _| {
                    rotate_left(value)
                });
            }
            Self::RotateLeftThruCarry(modify_target) => {
                modify_with(modify_target, cpu_registers, address_space, rotate_left_thru_carry);
            }
            Self::RotateRight(modify_target) => {
                modify_with(modify_target, cpu_registers, address_space, |value, _| {
                    rotate_right(value)
                });
            }
            Self::RotateRightThruCarry(modify_target) => {
                modify_with(modify_target, cpu_registers, address_space, rotate_right_thru_carry);
            }
            Self::ShiftLeft(modify_target) => {
                modify_with(modify_target, cpu_registers, address_space, |value, _| {
                    shift_left(value)
                });
            }
            Self::ArithmeticShiftRight(modify_target) => {
                modify_with(modify_target, cpu_registers, address_space, |value, _| {
                    arithmetic_shift_right(value)
                });
            }
            Self::LogicalShiftRight(modify_target) => {
                modify_with(modify_target, cpu_registers, address_space, |value, _| {
                    logical_shift_right(value)
                });
            }
            Self::Swap(modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                let swapped = value.rotate_left(4);
                modify_target.write_value(swapped, cpu_registers, address_space);
                cpu_registers.set_flags(swapped == 0, false, false, false);
            }
            Self::TestBit(n, read_target) => {
                let value = read_target.read_value(cpu_registers, address_space);
                let z_flag = value & (1 << n) == 0;
                cpu_registers.set_some_flags(Some(z_flag), Some(false), Some(true), None);
            }
            Self::SetBit(n, modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                modify_target.write_value(value | (1 << n), cpu_registers, address_space);
            }
            Self::ResetBit(n, modify_target) => {
                let value = modify_target.read_value(cpu_registers, address_space);
                modify_target.write_value(value & !(1 << n), cpu_registers, address_space);
            }
            Self::ComplementCarryFlag => {
                cpu_registers.set_some_flags(
                    None,
                    Some(false),
                    Some(false),
                    Some(!cpu_registers.carry_flag()),
                );
            }
            Self::SetCarryFlag => {
                cpu_registers.set_some_flags(None, Some(false), Some(false), Some(true));
            }
            Self::DecimalAdjustAccumulator => {
                let (value, carry) = decimal_adjust(cpu_registers.accumulator, cpu_registers.flags);
                cpu_registers.accumulator = value;
                cpu_registers.set_some_flags(Some(value == 0), None, Some(false), Some(carry));
            }
            Self::ComplementAccumulator => {
                cpu_registers.accumulator = !cpu_registers.accumulator;
                cpu_registers.set_some_flags(None, Some(true), Some(true), None);
            }
            Self::Jump(nn) => {
                cpu_registers.pc = nn;
            }
            Self::JumpHL => {
                cpu_registers.pc = cpu_registers.hl();
            }
            Self::JumpCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = nn;
                }
            }
            Self::RelativeJump(e) => {
                cpu_registers.pc = relative_jump_target(cpu_registers.pc, e);
            }
            Self::RelativeJumpCond(cc, e) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = relative_jump_target(cpu_registers.pc, e);
                }
            }
            Self::Call(nn) => {
                call(cpu_registers, address_space, nn);
            }
            Self::CallCond(cc, nn) => {
                if cc.check(cpu_registers) {
                    call(cpu_registers, address_space, nn);
                }
            }
            Self::Return => {
                cpu_registers.pc = pop_stack(cpu_registers, address_space);
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    cpu_registers.pc = pop_stack(cpu_registers, address_space);
                }
            }
            Self::ReturnFromInterruptHandler => {
                cpu_registers.pc = pop_stack(cpu_registers, address_space);
                // Unlike EI, RETI enables interrupts immediately
                cpu_registers.ime = true;
                cpu_registers.pending_ime = None;
            }
            Self::RestartCall(n) => {
                call(cpu_registers, address_space, u16::from(n));
            }
            Self::Halt => {
                log::debug!("HALT executed, suspending until an interrupt is requested");
                cpu_registers.mode = CpuMode::Halted;
            }
            Self::Stop => {
                log::debug!("STOP executed, suspending until a button press");
                cpu_registers.mode = CpuMode::Stopped;
            }
            Self::DisableInterrupts => {
                cpu_registers.pending_ime = Some(false);
            }
            Self::EnableInterrupts => {
                cpu_registers.pending_ime = Some(true);
            }
            Self::NoOp => {}
        }
    }

    /// Return the number of clock cycles that are required to execute this instruction.
    ///
    /// Requires CPU registers as a parameter because conditional control flow instructions take
    /// different numbers of cycles depending on whether the condition is true or false.
    pub fn cycles_required(self, cpu_registers: &CpuRegisters) -> u32 {
        match self {
            Self::Load(write_target, read_target) => {
                4 + write_target.cycles_required() + read_target.cycles_required()
            }
            Self::Add(read_target)
            | Self::AddWithCarry(read_target)
            | Self::Subtract(read_target)
            | Self::SubtractWithCarry(read_target)
            | Self::Compare(read_target)
            | Self::And(read_target)
            | Self::Or(read_target)
            | Self::Xor(read_target) => 4 + read_target.cycles_required(),
            Self::Increment(modify_target) | Self::Decrement(modify_target) => {
                match modify_target {
                    ModifyTarget::Accumulator | ModifyTarget::Register(..) => 4,
                    ModifyTarget::IndirectHL => 12,
                }
            }
            Self::RotateLeft(modify_target)
            | Self::RotateLeftThruCarry(modify_target)
            | Self::RotateRight(modify_target)
            | Self::RotateRightThruCarry(modify_target)
            | Self::ShiftLeft(modify_target)
            | Self::ArithmeticShiftRight(modify_target)
            | Self::LogicalShiftRight(modify_target)
            | Self::Swap(modify_target)
            | Self::SetBit(_, modify_target)
            | Self::ResetBit(_, modify_target) => modify_target.prefixed_cycles_required(),
            Self::TestBit(_, read_target) => 8 + read_target.cycles_required(),
            Self::ComplementCarryFlag
            | Self::SetCarryFlag
            | Self::DecimalAdjustAccumulator
            | Self::ComplementAccumulator
            | Self::JumpHL
            | Self::Halt
            | Self::Stop
            | Self::DisableInterrupts
            | Self::EnableInterrupts
            | Self::NoOp => 4,
            Self::LoadStackPointerHL
            | Self::AddHLRegister(..)
            | Self::IncRegisterPair(..)
            | Self::DecRegisterPair(..) => 8,
            Self::LoadRegisterPairImmediate(..)
            | Self::PopStack(..)
            | Self::LoadHLStackPointerOffset(..)
            | Self::RelativeJump(..) => 12,
            Self::PushStack(..)
            | Self::AddSPImmediate(..)
            | Self::Jump(..)
            | Self::Return
            | Self::ReturnFromInterruptHandler
            | Self::RestartCall(..) => 16,
            Self::LoadDirectStackPointer(..) => 20,
            Self::Call(..) => 24,
            Self::JumpCond(cc, _) => {
                if cc.check(cpu_registers) {
                    16
                } else {
                    12
                }
            }
            Self::RelativeJumpCond(cc, _) => {
                if cc.check(cpu_registers) {
                    12
                } else {
                    8
                }
            }
            Self::CallCond(cc, _) => {
                if cc.check(cpu_registers) {
                    24
                } else {
                    12
                }
            }
            Self::ReturnCond(cc) => {
                if cc.check(cpu_registers) {
                    20
                } else {
                    8
                }
            }
        }
    }
}

/// Push a 16-bit value: SP is decremented before each byte is written, high byte first, so the
/// value ends up little-endian at the new SP.
pub(crate) fn push_stack(
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace,
    value: u16,
) {
    let [msb, lsb] = value.to_be_bytes();

    cpu_registers.sp = cpu_registers.sp.wrapping_sub(1);
    address_space.write_address_u8(cpu_registers.sp, msb);

    cpu_registers.sp = cpu_registers.sp.wrapping_sub(1);
    address_space.write_address_u8(cpu_registers.sp, lsb);
}

// Push the address of the next instruction (PC has already been advanced) and jump
fn call(cpu_registers: &mut CpuRegisters, address_space: &mut AddressSpace, address: u16) {
    let return_address = cpu_registers.pc;
    push_stack(cpu_registers, address_space, return_address);
    cpu_registers.pc = address;
}

/// Pop a 16-bit value: low byte first, incrementing SP after each byte is read.
pub(crate) fn pop_stack(cpu_registers: &mut CpuRegisters, address_space: &AddressSpace) -> u16 {
    let lsb = address_space.read_address_u8(cpu_registers.sp);
    cpu_registers.sp = cpu_registers.sp.wrapping_add(1);

    let msb = address_space.read_address_u8(cpu_registers.sp);
    cpu_registers.sp = cpu_registers.sp.wrapping_add(1);

    u16::from_be_bytes([msb, lsb])
}

// Shared by the rotate/shift family: Z from the result except for the one-byte accumulator
// forms, N and H cleared, C from the bit shifted out
fn modify_with<F>(
    modify_target: ModifyTarget,
    cpu_registers: &mut CpuRegisters,
    address_space: &mut AddressSpace,
    op: F,
) where
    F: FnOnce(u8, bool) -> (u8, bool),
{
    let value = modify_target.read_value(cpu_registers, address_space);
    let (new_value, carry_flag) = op(value, cpu_registers.carry_flag());
    modify_target.write_value(new_value, cpu_registers, address_space);

    let z_flag = match modify_target {
        ModifyTarget::Accumulator => false,
        ModifyTarget::Register(..) | ModifyTarget::IndirectHL => new_value == 0,
    };
    cpu_registers.set_flags(z_flag, false, false, carry_flag);
}

fn relative_jump_target(pc: u16, e: i8) -> u16 {
    pc.wrapping_add_signed(i16::from(e))
}

fn add(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);
    let sum = u16::from(l_value) + u16::from(r_value) + u16::from(carry);
    let h_flag = (l_value & 0x0F) + (r_value & 0x0F) + carry > 0x0F;

    (sum as u8, sum > 0xFF, h_flag)
}

fn add_u16(l_value: u16, r_value: u16) -> (u16, bool, bool) {
    let (sum, carry_flag) = l_value.overflowing_add(r_value);
    let h_flag = (l_value & 0x0FFF) + (r_value & 0x0FFF) >= 0x1000;

    (sum, carry_flag, h_flag)
}

// SP + e, with H and C computed from the unsigned addition of the low bytes
fn add_sp_offset(sp: u16, e: i8) -> (u16, bool, bool) {
    let offset = e as u8;
    let h_flag = (sp & 0x000F) + u16::from(offset & 0x0F) > 0x000F;
    let c_flag = (sp & 0x00FF) + u16::from(offset) > 0x00FF;

    (sp.wrapping_add_signed(i16::from(e)), h_flag, c_flag)
}

fn sub(l_value: u8, r_value: u8, carry: bool) -> (u8, bool, bool) {
    let carry = u8::from(carry);
    let difference = l_value.wrapping_sub(r_value).wrapping_sub(carry);
    let carry_flag = u16::from(l_value) < u16::from(r_value) + u16::from(carry);
    let h_flag = l_value & 0x0F < (r_value & 0x0F) + carry;

    (difference, carry_flag, h_flag)
}

fn decimal_adjust(value: u8, flags: Flags) -> (u8, bool) {
    let mut value = value;
    let mut carry = flags.carry;

    if flags.subtract {
        if flags.carry {
            value = value.wrapping_sub(0x60);
        }
        if flags.half_carry {
            value = value.wrapping_sub(0x06);
        }
    } else {
        if flags.carry || value > 0x99 {
            value = value.wrapping_add(0x60);
            carry = true;
        }
        if flags.half_carry || value & 0x0F > 0x09 {
            value = value.wrapping_add(0x06);
        }
    }

    (value, carry)
}

fn rotate_left(value: u8) -> (u8, bool) {
    let leftmost_set = value & 0x80 != 0;
    let new_value = (value << 1) | u8::from(leftmost_set);

    (new_value, leftmost_set)
}

fn rotate_left_thru_carry(value: u8, carry: bool) -> (u8, bool) {
    let leftmost_set = value & 0x80 != 0;
    let new_value = (value << 1) | u8::from(carry);

    (new_value, leftmost_set)
}

fn rotate_right(value: u8) -> (u8, bool) {
    let rightmost_set = value & 0x01 != 0;
    let new_value = (value >> 1) | (u8::from(rightmost_set) << 7);

    (new_value, rightmost_set)
}

fn rotate_right_thru_carry(value: u8, carry: bool) -> (u8, bool) {
    let rightmost_set = value & 0x01 != 0;
    let new_value = (value >> 1) | (u8::from(carry) << 7);

    (new_value, rightmost_set)
}

fn shift_left(value: u8) -> (u8, bool) {
    (value << 1, value & 0x80 != 0)
}

fn arithmetic_shift_right(value: u8) -> (u8, bool) {
    ((value >> 1) | (value & 0x80), value & 0x01 != 0)
}

fn logical_shift_right(value: u8) -> (u8, bool) {
    (value >> 1, value & 0x01 != 0)
}
