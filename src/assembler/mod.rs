/*!
  Structures and functions for the two-pass assembler, which lowers assembly text to the flat
  word encoding described in `crate::bytecode`.

  The pipeline is this:
  ```text
  text -> [`lexer::tokenize`] -> `Token`s ->⋯

  ⋯-> [`discover_labels`] -> `LabelTable` -> [`emit_entry_jump`] ->⋯

  ⋯-> [`encode_program`] -> `Word`s
  ```
  The first pass only sums instruction widths to give every label definition an address. The
  second pass walks the same tokens again and encodes each instruction, by which time every
  label a branch or memory operand could name has an address.

  Execution always begins at address 0. If the program defines the label `start`, a jump to it is
  emitted before everything else and every label is moved forward by the width of that jump, so
  `start` may appear anywhere in the source.
*/

mod labels;

pub use labels::LabelTable;

use std::str::FromStr;

use crate::bytecode::{
  encode_instruction, Instruction, MemoryOperand, Opcode, Operand, SignedWord, Word
};
use crate::error::AssemblyError;
use crate::lexer::tokenize;
use crate::register::Register;
use crate::token::{Token, TokenKind};

/// The label execution enters at when it is defined.
pub const ENTRY_LABEL: &str = "start";

pub struct Assembler {
  tokens : Vec<Token>,
  cursor : usize,     // Index of the token being examined
  labels : LabelTable,
  code   : Vec<Word>, // Output buffer
}

impl Default for Assembler {
  fn default() -> Self {
    Assembler::new()
  }
}

impl Assembler {

  pub fn new() -> Assembler {
    Assembler {
      tokens : vec![],
      cursor : 0,
      labels : LabelTable::new(),
      code   : vec![],
    }
  }

  /// The label table of the most recent assembly, with the entry jump already accounted for.
  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  /// Assembles `source` into words ready to be loaded at address 0. The assembler may be reused;
  /// each call starts from a clean state.
  pub fn assemble(&mut self, source: &str) -> Result<Vec<Word>, AssemblyError> {
    self.tokens = tokenize(source)?;
    self.cursor = 0;
    self.labels.clear();
    self.code.clear();

    self.discover_labels()?;
    self.emit_entry_jump();
    self.encode_program()?;

    Ok(self.code.clone())
  }

  // region Token cursor

  fn current(&self) -> &Token {
    &self.tokens[self.cursor]
  }

  /// Moves to and returns the next token. The cursor never moves past `EndOfFile`.
  fn advance(&mut self) -> Token {
    if self.cursor + 1 < self.tokens.len() {
      self.cursor += 1;
    }
    self.current().clone()
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.cursor + 1)
  }

  fn expect(&mut self, kind: TokenKind) -> Result<Token, AssemblyError> {
    let token = self.advance();
    match token.is(kind) {
      true  => Ok(token),
      false => Err(AssemblyError::expected_kind(kind, &token))
    }
  }

  // endregion

  // region Passes

  /// Pass 1: assigns every label definition the address of the instruction that follows it.
  fn discover_labels(&mut self) -> Result<(), AssemblyError> {
    let mut address: Word = 0;

    for token in self.tokens.iter() {
      match token.kind {

        TokenKind::LabelDefinition => {
          self.labels.insert(token.text.clone(), address).map_err(|_existing| {
            AssemblyError::DuplicateLabel { name: token.text.to_string(), line: token.line }
          })?;
        }

        TokenKind::Instruction => {
          address += opcode_of(token)?.width() as Word;
        }

        _ => {}

      }
    }

    Ok(())
  }

  /**
    If `start` is defined, shifts every label past the jump that is about to be emitted and then
    emits that jump. The shift happens first so the jump targets `start`'s final address.
  */
  fn emit_entry_jump(&mut self) {
    #[cfg(feature = "trace_computation")]
    println!("Labels before entry jump:\n{:?}", self.labels.sorted());

    if self.labels.get_address(ENTRY_LABEL).is_none() {
      return;
    }

    self.labels.shift(Opcode::Jump.width() as Word);

    if let Some(target) = self.labels.get_address(ENTRY_LABEL) {
      let jump = Instruction::Branch { opcode: Opcode::Jump, target };
      encode_instruction(&jump, &mut self.code);
    }

    #[cfg(feature = "trace_computation")]
    println!("Labels after entry jump:\n{:?}", self.labels.sorted());
  }

  /// Pass 2: encodes every instruction in source order.
  fn encode_program(&mut self) -> Result<(), AssemblyError> {
    self.cursor = 0;

    loop {
      let token = self.current().clone();

      match token.kind {

        TokenKind::EndOfFile => break,

        TokenKind::LabelDefinition => {}

        TokenKind::Instruction => {
          let instruction = self.parse_instruction(&token)?;
          encode_instruction(&instruction, &mut self.code);
        }

        _ => {
          return Err(AssemblyError::unexpected("an instruction or label definition", &token));
        }

      }

      self.advance();
    }

    Ok(())
  }

  // endregion

  // region Operand parsing

  /// Parses the operands of the instruction named by `token`, leaving the cursor on the last
  /// operand token.
  fn parse_instruction(&mut self, token: &Token) -> Result<Instruction, AssemblyError> {
    let opcode = opcode_of(token)?;

    let instruction =
      match opcode {

        Opcode::Halt | Opcode::Return => Instruction::Nullary(opcode),

        Opcode::Load => {
          let destination = self.parse_register()?;
          self.expect(TokenKind::Comma)?;
          let source = self.parse_memory_operand()?;
          Instruction::Load { destination, source }
        }

        Opcode::Store => {
          let destination = self.parse_memory_operand()?;
          self.expect(TokenKind::Comma)?;
          let source = self.parse_register()?;
          Instruction::Store { destination, source }
        }

        Opcode::Push => Instruction::Push(self.parse_operand()?),

        Opcode::Pop => Instruction::Pop(self.parse_register()?),

        opcode if opcode.is_branch() => {
          let label = self.expect(TokenKind::Label)?;
          Instruction::Branch { opcode, target: self.resolve_label(&label)? }
        }

        // Move and the ALU operations
        opcode => {
          let destination = self.parse_register()?;
          self.expect(TokenKind::Comma)?;
          let source = self.parse_operand()?;
          Instruction::Binary { opcode, destination, source }
        }

      };

    Ok(instruction)
  }

  fn parse_register(&mut self) -> Result<Register, AssemblyError> {
    let token = self.expect(TokenKind::Register)?;
    register_of(&token)
  }

  /// A register or an integer literal.
  fn parse_operand(&mut self) -> Result<Operand, AssemblyError> {
    let token = self.advance();
    match token.kind {
      TokenKind::Register => Ok(Operand::Register(register_of(&token)?)),
      TokenKind::Integer  => Ok(Operand::Immediate(parse_immediate(&token)?)),
      _ => Err(AssemblyError::unexpected("a register or integer", &token))
    }
  }

  /// Either `&label` for an absolute address, or `fp` with an optional `[offset]`.
  fn parse_memory_operand(&mut self) -> Result<MemoryOperand, AssemblyError> {
    let token = self.advance();
    match token.kind {

      TokenKind::Label => Ok(MemoryOperand::Absolute(self.resolve_label(&token)?)),

      TokenKind::Register => {
        if register_of(&token)? != Register::FP {
          return Err(AssemblyError::InvalidMemoryOperand {
            register: token.text.to_string(),
            line: token.line
          });
        }
        let bracketed = self.peek().map_or(false, |next| next.is(TokenKind::BracketLeft));
        let offset = match bracketed {
          true  => {
            self.expect(TokenKind::BracketLeft)?;
            let offset = parse_offset(&self.expect(TokenKind::Integer)?)?;
            self.expect(TokenKind::BracketRight)?;
            offset
          }
          false => 0
        };
        Ok(MemoryOperand::FrameOffset(offset))
      }

      _ => Err(AssemblyError::unexpected("a label or `fp`", &token))

    }
  }

  fn resolve_label(&self, token: &Token) -> Result<Word, AssemblyError> {
    self.labels.get_address(&token.text).ok_or_else(|| {
      AssemblyError::UndefinedLabel { name: token.text.to_string(), line: token.line }
    })
  }

  // endregion

}

fn opcode_of(token: &Token) -> Result<Opcode, AssemblyError> {
  Opcode::from_str(&token.text).map_err(|_e| {
    AssemblyError::UnknownMnemonic { name: token.text.to_string(), line: token.line }
  })
}

fn register_of(token: &Token) -> Result<Register, AssemblyError> {
  Register::from_str(&token.text).map_err(|_e| {
    AssemblyError::InvalidRegister { name: token.text.to_string(), line: token.line }
  })
}

fn invalid_integer(token: &Token) -> AssemblyError {
  AssemblyError::InvalidInteger { text: token.text.to_string(), line: token.line }
}

/// Immediates may be written signed or unsigned; negative values are stored as their
/// two's-complement bit pattern.
fn parse_immediate(token: &Token) -> Result<Word, AssemblyError> {
  let value = token.text.parse::<i64>().map_err(|_e| invalid_integer(token))?;
  match value >= SignedWord::min_value() as i64 && value <= Word::max_value() as i64 {
    true  => Ok(value as Word),
    false => Err(invalid_integer(token))
  }
}

fn parse_offset(token: &Token) -> Result<SignedWord, AssemblyError> {
  token.text.parse::<SignedWord>().map_err(|_e| invalid_integer(token))
}

/// Assembles `source` with a fresh `Assembler`.
pub fn assemble(source: &str) -> Result<Vec<Word>, AssemblyError> {
  Assembler::new().assemble(source)
}
