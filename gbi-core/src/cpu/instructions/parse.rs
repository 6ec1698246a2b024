use crate::cpu::instructions::{Instruction, JumpCondition, ModifyTarget, ReadTarget, WriteTarget};
use crate::cpu::registers::{CpuRegister, CpuRegisterPair};
use crate::memory::AddressSpace;
use thiserror::Error;

pub const CB_PREFIX: u8 = 0xCB;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("illegal opcode {opcode:02X} at address {pc:04X}")]
    IllegalOpcode { opcode: u8, pc: u16 },
}

/// Decode the instruction at `pc`, returning it along with the address of the instruction that
/// follows it. Decoding only reads memory.
///
/// # Errors
///
/// Returns an error if the opcode at `pc` is one of the unassigned primary opcodes.
pub fn parse_next_instruction(
    address_space: &AddressSpace,
    pc: u16,
) -> Result<(Instruction, u16), ParseError> {
    let opcode = address_space.read_address_u8(pc);
    let read_u8 = || address_space.read_address_u8(pc.wrapping_add(1));
    let read_u16 = || address_space.read_address_u16(pc.wrapping_add(1));

    let (instruction, len) = match opcode {
        0x00 => (Instruction::NoOp, 1),
        0x01 | 0x11 | 0x21 | 0x31 => {
            let rr = register_pair_for_other_ops(opcode);
            (Instruction::LoadRegisterPairImmediate(rr, read_u16()), 3)
        }
        0x02 => (Instruction::Load(WriteTarget::IndirectBC, ReadTarget::Accumulator), 1),
        0x12 => (Instruction::Load(WriteTarget::IndirectDE, ReadTarget::Accumulator), 1),
        0x22 => (Instruction::Load(WriteTarget::IndirectHLInc, ReadTarget::Accumulator), 1),
        0x32 => (Instruction::Load(WriteTarget::IndirectHLDec, ReadTarget::Accumulator), 1),
        0x03 | 0x13 | 0x23 | 0x33 => {
            (Instruction::IncRegisterPair(register_pair_for_other_ops(opcode)), 1)
        }
        0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
            (Instruction::Increment(mid_modify_target(opcode)), 1)
        }
        0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
            (Instruction::Decrement(mid_modify_target(opcode)), 1)
        }
        0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
            let write_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(WriteTarget::IndirectHL, WriteTarget::Register);
            (Instruction::Load(write_target, ReadTarget::Immediate(read_u8())), 2)
        }
        0x07 => (Instruction::RotateLeft(ModifyTarget::Accumulator), 1),
        0x0F => (Instruction::RotateRight(ModifyTarget::Accumulator), 1),
        0x17 => (Instruction::RotateLeftThruCarry(ModifyTarget::Accumulator), 1),
        0x1F => (Instruction::RotateRightThruCarry(ModifyTarget::Accumulator), 1),
        0x08 => (Instruction::LoadDirectStackPointer(read_u16()), 3),
        0x09 | 0x19 | 0x29 | 0x39 => {
            (Instruction::AddHLRegister(register_pair_for_other_ops(opcode)), 1)
        }
        0x0A => (Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectBC), 1),
        0x1A => (Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectDE), 1),
        0x2A => (Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectHLInc), 1),
        0x3A => (Instruction::Load(WriteTarget::Accumulator, ReadTarget::IndirectHLDec), 1),
        0x0B | 0x1B | 0x2B | 0x3B => {
            (Instruction::DecRegisterPair(register_pair_for_other_ops(opcode)), 1)
        }
        // STOP is followed by a padding byte
        0x10 => (Instruction::Stop, 2),
        0x18 => (Instruction::RelativeJump(read_u8() as i8), 2),
        0x20 | 0x28 | 0x30 | 0x38 => {
            let cc = parse_jump_condition(opcode);
            (Instruction::RelativeJumpCond(cc, read_u8() as i8), 2)
        }
        0x27 => (Instruction::DecimalAdjustAccumulator, 1),
        0x2F => (Instruction::ComplementAccumulator, 1),
        0x37 => (Instruction::SetCarryFlag, 1),
        0x3F => (Instruction::ComplementCarryFlag, 1),
        0x76 => (Instruction::Halt, 1),
        0x40..=0x75 | 0x77..=0x7F => {
            let write_target = CpuRegister::from_mid_opcode_bits(opcode)
                .map_or(WriteTarget::IndirectHL, WriteTarget::Register);
            let read_target = low_read_target(opcode);
            (Instruction::Load(write_target, read_target), 1)
        }
        0x80..=0xBF => (alu_instruction(opcode, low_read_target(opcode)), 1),
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            (alu_instruction(opcode, ReadTarget::Immediate(read_u8())), 2)
        }
        0xC0 | 0xC8 | 0xD0 | 0xD8 => (Instruction::ReturnCond(parse_jump_condition(opcode)), 1),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => (Instruction::PopStack(register_pair_for_push_pop(opcode)), 1),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            (Instruction::PushStack(register_pair_for_push_pop(opcode)), 1)
        }
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            let cc = parse_jump_condition(opcode);
            (Instruction::JumpCond(cc, read_u16()), 3)
        }
        0xC3 => (Instruction::Jump(read_u16()), 3),
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            let cc = parse_jump_condition(opcode);
            (Instruction::CallCond(cc, read_u16()), 3)
        }
        0xCD => (Instruction::Call(read_u16()), 3),
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            (Instruction::RestartCall(opcode & 0x38), 1)
        }
        0xC9 => (Instruction::Return, 1),
        0xD9 => (Instruction::ReturnFromInterruptHandler, 1),
        CB_PREFIX => (parse_cb_prefixed_opcode(read_u8()), 2),
        0xE0 => (Instruction::Load(WriteTarget::FFDirect(read_u8()), ReadTarget::Accumulator), 2),
        0xF0 => (Instruction::Load(WriteTarget::Accumulator, ReadTarget::FFDirect(read_u8())), 2),
        0xE2 => (Instruction::Load(WriteTarget::FFIndirectC, ReadTarget::Accumulator), 1),
        0xF2 => (Instruction::Load(WriteTarget::Accumulator, ReadTarget::FFIndirectC), 1),
        0xEA => (Instruction::Load(WriteTarget::Direct(read_u16()), ReadTarget::Accumulator), 3),
        0xFA => (Instruction::Load(WriteTarget::Accumulator, ReadTarget::Direct(read_u16())), 3),
        0xE8 => (Instruction::AddSPImmediate(read_u8() as i8), 2),
        0xF8 => (Instruction::LoadHLStackPointerOffset(read_u8() as i8), 2),
        0xE9 => (Instruction::JumpHL, 1),
        0xF9 => (Instruction::LoadStackPointerHL, 1),
        0xF3 => (Instruction::DisableInterrupts, 1),
        0xFB => (Instruction::EnableInterrupts, 1),
        0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
            return Err(ParseError::IllegalOpcode { opcode, pc });
        }
    };

    Ok((instruction, pc.wrapping_add(len)))
}

// Every one of the 256 CB-prefixed opcodes is assigned
fn parse_cb_prefixed_opcode(opcode: u8) -> Instruction {
    let bit = (opcode & 0x38) >> 3;
    let modify_target = low_modify_target(opcode);

    match opcode {
        0x00..=0x3F => match bit {
            0 => Instruction::RotateLeft(modify_target),
            1 => Instruction::RotateRight(modify_target),
            2 => Instruction::RotateLeftThruCarry(modify_target),
            3 => Instruction::RotateRightThruCarry(modify_target),
            4 => Instruction::ShiftLeft(modify_target),
            5 => Instruction::ArithmeticShiftRight(modify_target),
            6 => Instruction::Swap(modify_target),
            _ => Instruction::LogicalShiftRight(modify_target),
        },
        0x40..=0x7F => Instruction::TestBit(bit, low_read_target(opcode)),
        0x80..=0xBF => Instruction::ResetBit(bit, modify_target),
        0xC0..=0xFF => Instruction::SetBit(bit, modify_target),
    }
}

// Opcodes 0x80-0xBF and the immediate forms 0xC6-0xFE share the operation encoding in bits 3-5
fn alu_instruction(opcode: u8, read_target: ReadTarget) -> Instruction {
    match (opcode >> 3) & 0x07 {
        0x00 => Instruction::Add(read_target),
        0x01 => Instruction::AddWithCarry(read_target),
        0x02 => Instruction::Subtract(read_target),
        0x03 => Instruction::SubtractWithCarry(read_target),
        0x04 => Instruction::And(read_target),
        0x05 => Instruction::Xor(read_target),
        0x06 => Instruction::Or(read_target),
        _ => Instruction::Compare(read_target),
    }
}

fn low_read_target(opcode: u8) -> ReadTarget {
    CpuRegister::from_low_opcode_bits(opcode).map_or(ReadTarget::IndirectHL, ReadTarget::Register)
}

fn low_modify_target(opcode: u8) -> ModifyTarget {
    CpuRegister::from_low_opcode_bits(opcode)
        .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register)
}

fn mid_modify_target(opcode: u8) -> ModifyTarget {
    CpuRegister::from_mid_opcode_bits(opcode)
        .map_or(ModifyTarget::IndirectHL, ModifyTarget::Register)
}

fn register_pair_for_other_ops(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        _ => CpuRegisterPair::SP,
    }
}

fn register_pair_for_push_pop(opcode: u8) -> CpuRegisterPair {
    match opcode & 0x30 {
        0x00 => CpuRegisterPair::BC,
        0x10 => CpuRegisterPair::DE,
        0x20 => CpuRegisterPair::HL,
        _ => CpuRegisterPair::AF,
    }
}

fn parse_jump_condition(opcode: u8) -> JumpCondition {
    match opcode & 0x18 {
        0x00 => JumpCondition::NZ,
        0x08 => JumpCondition::Z,
        0x10 => JumpCondition::NC,
        _ => JumpCondition::C,
    }
}
