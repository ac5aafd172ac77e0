use crate::bytecode::Word;
use crate::register::{Register, NUM_REGISTERS};

/// The five machine registers, indexed by `Register`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegisterFile {
  words: [Word; NUM_REGISTERS]
}

impl RegisterFile {
  /// All registers are zero except SP and FP, which start at `stack_top`.
  pub fn new(stack_top: Word) -> RegisterFile {
    let mut registers = RegisterFile { words: [0; NUM_REGISTERS] };
    registers.set(Register::SP, stack_top);
    registers.set(Register::FP, stack_top);
    registers
  }

  pub fn get(&self, register: Register) -> Word {
    self.words[register.idx()]
  }

  pub fn set(&mut self, register: Register, value: Word) {
    self.words[register.idx()] = value;
  }

  pub fn a(&self)  -> Word { self.get(Register::A)  }
  pub fn b(&self)  -> Word { self.get(Register::B)  }
  pub fn ip(&self) -> Word { self.get(Register::IP) }
  pub fn sp(&self) -> Word { self.get(Register::SP) }
  pub fn fp(&self) -> Word { self.get(Register::FP) }

  pub fn as_slice(&self) -> &[Word] {
    &self.words
  }
}
