/*!
  This module is responsible for the encoding and decoding of binary instructions.

*/
use std::convert::TryFrom;

use super::{
  AddressingMode, Instruction, MemoryOperand, Opcode, Operand, OperandKind, Word,
  word_to_signed
};
use crate::error::DecodeError;
use crate::register::Register;

/// Returns the size in WORDS of an instruction for the corresponding opcode.
pub fn instruction_size(opcode: Opcode) -> usize {
  opcode.width()
}

/**
  Encodes the instruction into bytecode, appending its words to `code`. Exactly
  `instruction.width()` words are appended.
*/
pub fn encode_instruction(instruction: &Instruction, code: &mut Vec<Word>) {
  code.push(instruction.opcode().code());

  match instruction {

    Instruction::Nullary(_) => {}

    Instruction::Load { destination, source } => {
      // [Load][Register][Mode][Source]
      code.push(destination.code());
      code.push(source.mode().into());
      code.push(source.value());
    }

    Instruction::Store { destination, source } => {
      // [Store][Mode][Destination][Register]
      code.push(destination.mode().into());
      code.push(destination.value());
      code.push(source.code());
    }

    Instruction::Binary { destination, source, .. } => {
      // [Opcode][Register][Kind][Operand]
      code.push(destination.code());
      code.push(source.kind().into());
      code.push(source.value());
    }

    Instruction::Branch { target, .. } => {
      // [Opcode][Address]
      code.push(*target);
    }

    Instruction::Push(source) => {
      // [Push][Kind][Operand]
      code.push(source.kind().into());
      code.push(source.value());
    }

    Instruction::Pop(destination) => {
      // [Pop][Register]
      code.push(destination.code());
    }

  }
}

fn decode_register(word: Word) -> Result<Register, DecodeError> {
  Register::from_code(word).ok_or(DecodeError::InvalidRegister(word))
}

fn decode_operand(kind: Word, value: Word) -> Result<Operand, DecodeError> {
  match OperandKind::try_from(kind) {
    Ok(OperandKind::Register)  => Ok(Operand::Register(decode_register(value)?)),
    Ok(OperandKind::Immediate) => Ok(Operand::Immediate(value)),
    Err(_e)                    => Err(DecodeError::InvalidOperandKind(kind))
  }
}

fn decode_memory_operand(mode: Word, value: Word) -> Result<MemoryOperand, DecodeError> {
  match AddressingMode::try_from(mode) {
    Ok(AddressingMode::Absolute)    => Ok(MemoryOperand::Absolute(value)),
    Ok(AddressingMode::FrameOffset) => Ok(MemoryOperand::FrameOffset(word_to_signed(value))),
    Err(_e)                         => Err(DecodeError::InvalidAddressingMode(mode))
  }
}

/**
  Decodes the instruction whose opcode is `words[0]`. Exactly `width` words of `words` are
  read, where `width` is determined by the opcode; anything after them is ignored.
*/
pub fn try_decode_instruction(words: &[Word]) -> Result<Instruction, DecodeError> {
  let first = match words.first() {
    Some(word) => *word,
    None => {
      return Err(DecodeError::Truncated { opcode: Opcode::Halt, needed: 1, available: 0 });
    }
  };

  let opcode = Opcode::try_from(first).map_err(|_e| DecodeError::InvalidOpcode(first))?;

  let width = instruction_size(opcode);
  if words.len() < width {
    return Err(DecodeError::Truncated { opcode, needed: width, available: words.len() });
  }
  let fields = &words[1..width];

  let instruction =
    match opcode {

      Opcode::Halt | Opcode::Return => Instruction::Nullary(opcode),

      Opcode::Load => {
        Instruction::Load {
          destination: decode_register(fields[0])?,
          source: decode_memory_operand(fields[1], fields[2])?
        }
      }

      Opcode::Store => {
        Instruction::Store {
          destination: decode_memory_operand(fields[0], fields[1])?,
          source: decode_register(fields[2])?
        }
      }

      Opcode::Push => Instruction::Push(decode_operand(fields[0], fields[1])?),

      Opcode::Pop => Instruction::Pop(decode_register(fields[0])?),

      opcode if opcode.is_branch() => {
        Instruction::Branch { opcode, target: fields[0] }
      }

      // Move and the ALU operations
      opcode => {
        Instruction::Binary {
          opcode,
          destination: decode_register(fields[0])?,
          source: decode_operand(fields[1], fields[2])?
        }
      }

    };

  Ok(instruction)
}
