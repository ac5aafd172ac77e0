//! Failure kinds for every stage of the toolchain. Nothing in the library aborts the process;
//! the outermost driver decides what to do with these.

use thiserror::Error;

use crate::bytecode::{Opcode, Word};
use crate::token::{Token, TokenKind};

#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum LexError {
  #[error("line {line}: `{word}` is neither a register nor an instruction")]
  UnknownWord { word: String, line: usize },

  #[error("line {line}: sign is not followed by a digit")]
  DanglingSign { line: usize },
}

#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum AssemblyError {
  #[error(transparent)]
  Lex(#[from] LexError),

  #[error("line {line}: `{name}` is not an instruction")]
  UnknownMnemonic { name: String, line: usize },

  #[error("line {}: expected {expected}, found {found}", .found.line)]
  UnexpectedToken { expected: &'static str, found: Token },

  #[error("line {line}: undefined label `{name}`")]
  UndefinedLabel { name: String, line: usize },

  #[error("line {line}: label `{name}` is defined more than once")]
  DuplicateLabel { name: String, line: usize },

  #[error("line {line}: `{name}` is not a register")]
  InvalidRegister { name: String, line: usize },

  #[error("line {line}: memory operands use a label or `fp`, not `{register}`")]
  InvalidMemoryOperand { register: String, line: usize },

  #[error("line {line}: integer `{text}` does not fit in a word")]
  InvalidInteger { text: String, line: usize },
}

impl AssemblyError {
  pub(crate) fn unexpected(expected: &'static str, found: &Token) -> AssemblyError {
    AssemblyError::UnexpectedToken { expected, found: found.clone() }
  }

  /// Convenience for the common single-kind expectation.
  pub(crate) fn expected_kind(kind: TokenKind, found: &Token) -> AssemblyError {
    AssemblyError::unexpected(kind.into(), found)
  }
}

#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
  #[error("invalid opcode {0}")]
  InvalidOpcode(Word),

  #[error("invalid register index {0}")]
  InvalidRegister(Word),

  #[error("invalid addressing mode {0}")]
  InvalidAddressingMode(Word),

  #[error("invalid operand kind {0}")]
  InvalidOperandKind(Word),

  #[error("{opcode} needs {needed} words but only {available} remain")]
  Truncated { opcode: Opcode, needed: usize, available: usize },
}

#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum VmError {
  #[error("at address {address}: {source}")]
  Decode { address: Word, source: DecodeError },

  #[error("memory address {address} is outside 0..{size}")]
  MemoryOutOfBounds { address: i64, size: usize },

  #[error("stack overflow: cannot push with sp = {sp}")]
  StackOverflow { sp: Word },

  #[error("stack underflow: cannot pop with sp = {sp}")]
  StackUnderflow { sp: Word },

  #[error("at address {address}: division by zero")]
  DivisionByZero { address: Word },

  #[error("at address {address}: `{opcode}` is not an arithmetic operation")]
  NotArithmetic { address: Word, opcode: Opcode },

  #[error("program of {length} words does not fit in {capacity} words of memory")]
  ProgramTooLarge { length: usize, capacity: usize },
}

/// Either stage's failure, for callers driving the whole pipeline.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum Error {
  #[error("assembly failed: {0}")]
  Assembly(#[from] AssemblyError),

  #[error("execution failed: {0}")]
  Execution(#[from] VmError),
}
