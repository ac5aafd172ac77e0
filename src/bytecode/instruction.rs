use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

use crate::bytecode::{SignedWord, Word};
use crate::register::Register;

/**
  Opcodes of the virtual machine.

  The numeric value of an opcode is its position in the list below, so the order is
  significant: it is the value the assembler emits as the first word of an instruction and the
  value the VM dispatches on. The `strum` serialization is the assembly mnemonic, so this enum is
  also the assembler's mnemonic table.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq,         PartialEq, Debug,            Hash
)]
#[repr(u32)]
pub enum Opcode {
  #[strum(serialize = "halt")]   Halt,
  // Memory
  #[strum(serialize = "load")]   Load,
  #[strum(serialize = "store")]  Store,
  // Registers
  #[strum(serialize = "mov")]    Move,
  // Arithmetic / logic
  #[strum(serialize = "add")]    Add,
  #[strum(serialize = "sub")]    Subtract,
  #[strum(serialize = "mul")]    Multiply,
  #[strum(serialize = "div")]    Divide,
  #[strum(serialize = "mod")]    Modulo,
  #[strum(serialize = "and")]    And,
  #[strum(serialize = "or")]     Or,
  #[strum(serialize = "not")]    Not,
  #[strum(serialize = "shl")]    ShiftLeft,
  #[strum(serialize = "shr")]    ShiftRight,
  #[strum(serialize = "gt")]     GreaterThan,
  #[strum(serialize = "ge")]     GreaterThanOrEqualTo,
  #[strum(serialize = "lt")]     LessThan,
  #[strum(serialize = "le")]     LessThanOrEqualTo,
  #[strum(serialize = "eq")]     EqualTo,
  #[strum(serialize = "ne")]     NotEqualTo,
  // Jumps
  #[strum(serialize = "jump")]   Jump,
  #[strum(serialize = "jumpz")]  JumpIfZero,
  #[strum(serialize = "jumpnz")] JumpIfNonZero,
  // Stack
  #[strum(serialize = "push")]   Push,
  #[strum(serialize = "pop")]    Pop,
  #[strum(serialize = "call")]   Call,
  #[strum(serialize = "ret")]    Return,
}

impl Opcode {
  pub fn code(&self) -> Word {
    Into::<Word>::into(*self)
  }

  /// The number of words an instruction with this opcode occupies, opcode included.
  pub fn width(&self) -> usize {
    match self {
      Opcode::Halt | Opcode::Return => 1,

      | Opcode::Jump
      | Opcode::JumpIfZero
      | Opcode::JumpIfNonZero
      | Opcode::Call
      | Opcode::Pop => 2,

      Opcode::Push => 3,

      // Load, Store, Move and the ALU operations
      _ => 4
    }
  }

  /// Move and the ALU operations share the `[Register][Kind][Operand]` layout.
  pub fn is_binary(&self) -> bool {
    match self {
      | Opcode::Move
      | Opcode::Add
      | Opcode::Subtract
      | Opcode::Multiply
      | Opcode::Divide
      | Opcode::Modulo
      | Opcode::And
      | Opcode::Or
      | Opcode::Not
      | Opcode::ShiftLeft
      | Opcode::ShiftRight
      | Opcode::GreaterThan
      | Opcode::GreaterThanOrEqualTo
      | Opcode::LessThan
      | Opcode::LessThanOrEqualTo
      | Opcode::EqualTo
      | Opcode::NotEqualTo => true,
      _ => false
    }
  }

  /// Control transfers whose only field is a target address.
  pub fn is_branch(&self) -> bool {
    match self {
      | Opcode::Jump
      | Opcode::JumpIfZero
      | Opcode::JumpIfNonZero
      | Opcode::Call => true,
      _ => false
    }
  }
}

#[derive(TryFromPrimitive, IntoPrimitive, Clone, Copy, Eq, PartialEq, Debug, Hash)]
#[repr(u32)]
pub enum AddressingMode {
  Absolute,
  FrameOffset,
}

#[derive(TryFromPrimitive, IntoPrimitive, Clone, Copy, Eq, PartialEq, Debug, Hash)]
#[repr(u32)]
pub enum OperandKind {
  Immediate,
  Register,
}

/// The right-hand side of Move, Push and the ALU operations.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Operand {
  Register(Register),
  Immediate(Word),
}

impl Operand {
  pub fn kind(&self) -> OperandKind {
    match self {
      Operand::Register(_)  => OperandKind::Register,
      Operand::Immediate(_) => OperandKind::Immediate
    }
  }

  /// The word stored in the operand field.
  pub fn value(&self) -> Word {
    match self {
      Operand::Register(register) => register.code(),
      Operand::Immediate(value)   => *value
    }
  }
}

impl Display for Operand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Operand::Register(register) => write!(f, "{}", register),
      Operand::Immediate(value)   => write!(f, "{}", value)
    }
  }
}

/// The memory side of Load and Store.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum MemoryOperand {
  Absolute(Word),
  FrameOffset(SignedWord),
}

impl MemoryOperand {
  pub fn mode(&self) -> AddressingMode {
    match self {
      MemoryOperand::Absolute(_)    => AddressingMode::Absolute,
      MemoryOperand::FrameOffset(_) => AddressingMode::FrameOffset
    }
  }

  /// The word stored in the address field.
  pub fn value(&self) -> Word {
    match self {
      MemoryOperand::Absolute(address)   => *address,
      MemoryOperand::FrameOffset(offset) => super::signed_to_word(*offset)
    }
  }
}

impl Display for MemoryOperand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      MemoryOperand::Absolute(address) => write!(f, "{}", address),
      MemoryOperand::FrameOffset(0)    => write!(f, "fp"),
      MemoryOperand::FrameOffset(n)    => write!(f, "fp[{}]", n)
    }
  }
}

/// Holds the unencoded components of an instruction, grouped by field layout.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Instruction {
  /// [Opcode]
  Nullary(Opcode),
  /// [Load][Register][Mode][Source]
  Load {
    destination : Register,
    source      : MemoryOperand
  },
  /// [Store][Mode][Destination][Register]
  Store {
    destination : MemoryOperand,
    source      : Register
  },
  /// [Opcode][Register][Kind][Operand]
  Binary {
    opcode      : Opcode,
    destination : Register,
    source      : Operand
  },
  /// [Opcode][Address]
  Branch {
    opcode : Opcode,
    target : Word
  },
  /// [Push][Kind][Operand]
  Push(Operand),
  /// [Pop][Register]
  Pop(Register),
}

impl Instruction {
  pub fn opcode(&self) -> Opcode {
    match self {
      Instruction::Nullary(opcode)          => *opcode,
      Instruction::Load { .. }              => Opcode::Load,
      Instruction::Store { .. }             => Opcode::Store,
      Instruction::Binary { opcode, .. }    => *opcode,
      Instruction::Branch { opcode, .. }    => *opcode,
      Instruction::Push(_)                  => Opcode::Push,
      Instruction::Pop(_)                   => Opcode::Pop
    }
  }

  pub fn width(&self) -> usize {
    self.opcode().width()
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {

      Instruction::Nullary(opcode) => {
        write!(f, "{}", opcode)
      }

      Instruction::Load { destination, source } => {
        write!(f, "{} {}, {}", Opcode::Load, destination, source)
      }

      Instruction::Store { destination, source } => {
        write!(f, "{} {}, {}", Opcode::Store, destination, source)
      }

      Instruction::Binary { opcode, destination, source } => {
        write!(f, "{} {}, {}", opcode, destination, source)
      }

      Instruction::Branch { opcode, target } => {
        write!(f, "{} {}", opcode, target)
      }

      Instruction::Push(source) => {
        write!(f, "{} {}", Opcode::Push, source)
      }

      Instruction::Pop(destination) => {
        write!(f, "{} {}", Opcode::Pop, destination)
      }

    }
  }
}
