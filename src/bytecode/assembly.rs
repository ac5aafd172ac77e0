/*!
  The human readable textual form of bytecode is called assembly. This module walks a buffer of
  words and recovers the instructions in it, using the same width table the VM decodes with, so
  a listing shows exactly the instruction boundaries the VM will see.

  Labels do not survive assembly; branch targets and absolute memory operands are listed as
  plain addresses.
*/

use std::fmt::{Display, Formatter};

use super::{try_decode_instruction, Instruction, Word};
use crate::error::DecodeError;

/// A decoded program: each instruction paired with the address of its opcode word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Listing {
  pub instructions: Vec<(Word, Instruction)>
}

impl Listing {
  /// The address one past the last decoded instruction.
  pub fn end(&self) -> Word {
    match self.instructions.last() {
      Some((address, instruction)) => address + instruction.width() as Word,
      None => 0
    }
  }
}

impl Display for Listing {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    for (address, instruction) in self.instructions.iter() {
      writeln!(f, "{:>4}: {}", address, instruction)?;
    }
    Ok(())
  }
}

/**
  Decodes every instruction in `words`, starting at address 0. Data placed after the program
  must not be passed in, as it would be decoded as instructions.
*/
pub fn disassemble(words: &[Word]) -> Result<Listing, (Word, DecodeError)> {
  let mut instructions = vec![];
  let mut address: usize = 0;

  while address < words.len() {
    let instruction =
      try_decode_instruction(&words[address..])
        .map_err(|e| (address as Word, e))?;
    instructions.push((address as Word, instruction));
    address += instruction.width();
  }

  Ok(Listing { instructions })
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::{Opcode, Operand};
  use crate::register::Register;

  #[test]
  fn listing_follows_widths(){
    // mov a, 1 / push a / halt
    let words = vec![3, 0, 0, 1, 23, 1, 0, 0];
    let listing = disassemble(&words).unwrap();

    assert_eq!(
      listing.instructions,
      vec![
        (0, Instruction::Binary {
          opcode: Opcode::Move,
          destination: Register::A,
          source: Operand::Immediate(1)
        }),
        (4, Instruction::Push(Operand::Register(Register::A))),
        (7, Instruction::Nullary(Opcode::Halt)),
      ]
    );
    assert_eq!(listing.end(), 8);
    assert_eq!(listing.to_string(), "   0: mov a, 1\n   4: push a\n   7: halt\n");
  }

  #[test]
  fn reports_failing_address(){
    let words = vec![0, 99];
    assert_eq!(disassemble(&words), Err((1, DecodeError::InvalidOpcode(99))));
  }

}
