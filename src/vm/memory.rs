//! Fixed-size word memory. Code and data share it; nothing distinguishes the two.

use crate::bytecode::{SignedWord, Word};
use crate::error::VmError;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Memory {
  cells: Vec<Word>
}

impl Memory {
  pub fn new(size: usize) -> Memory {
    Memory {
      cells: vec![0; size]
    }
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  pub fn as_slice(&self) -> &[Word] {
    &self.cells
  }

  /// Computes `base + offset` without wrapping. The result is checked when it is used.
  pub fn offset_address(base: Word, offset: SignedWord) -> i64 {
    base as i64 + offset as i64
  }

  /// Converts an address to an index, failing for anything outside memory.
  fn idx(&self, address: i64) -> Result<usize, VmError> {
    match address >= 0 && address < self.cells.len() as i64 {
      true  => Ok(address as usize),
      false => Err(VmError::MemoryOutOfBounds { address, size: self.cells.len() })
    }
  }

  pub fn read<A: Into<i64>>(&self, address: A) -> Result<Word, VmError> {
    let idx = self.idx(address.into())?;
    Ok(self.cells[idx])
  }

  pub fn write<A: Into<i64>>(&mut self, address: A, value: Word) -> Result<(), VmError> {
    let idx = self.idx(address.into())?;
    self.cells[idx] = value;
    Ok(())
  }

  /// Every word from `address` to the end of memory, for the decoder to read from.
  pub fn words_from(&self, address: Word) -> Result<&[Word], VmError> {
    let idx = self.idx(address as i64)?;
    Ok(&self.cells[idx..])
  }

  /// Copies `program` to address 0. The rest of memory is left as it was.
  pub fn load(&mut self, program: &[Word]) -> Result<(), VmError> {
    if program.len() > self.cells.len() {
      return Err(VmError::ProgramTooLarge { length: program.len(), capacity: self.cells.len() });
    }
    self.cells[..program.len()].copy_from_slice(program);
    Ok(())
  }
}
