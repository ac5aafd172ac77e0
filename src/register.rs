//! The five machine registers, with conversions to and from their assembly names and their
//! encoded indices.

use std::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

use crate::bytecode::Word;

pub const NUM_REGISTERS: usize = 5;

/**
  Registers are encoded by their declaration order, so the order below is significant: it is
  the index the assembler writes into register fields and the index the VM decodes.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq,         PartialEq, Debug,            Hash
)]
#[repr(u32)]
pub enum Register {
  #[strum(serialize = "a")]
  A,
  #[strum(serialize = "b")]
  B,
  /// Instruction pointer
  #[strum(serialize = "ip")]
  IP,
  /// Stack pointer
  #[strum(serialize = "sp")]
  SP,
  /// Frame pointer, the base of relative memory operands.
  #[strum(serialize = "fp")]
  FP,
}

impl Register {
  /// The word written into a register field.
  pub fn code(&self) -> Word {
    Into::<Word>::into(*self)
  }

  /// Converts the register to an index into the register file.
  pub fn idx(&self) -> usize {
    self.code() as usize
  }

  /// Decodes a register field; indices past the last register are `None`.
  pub fn from_code(code: Word) -> Option<Register> {
    Register::try_from(code).ok()
  }
}
