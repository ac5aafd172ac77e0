/*!
  A minimal register-machine toolchain: a textual assembly language, a two-pass assembler
  that lowers it to a flat sequence of 32 bit words, and a virtual machine that executes
  those words directly out of a small linear memory.

  The pipeline is this:
  ```text
  text -> [`lexer::tokenize`] -> `Token`s -> [`Assembler`] -> `Word`s -> [`VM::load`] -> [`VM::run`]
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod error;
pub mod token;
pub mod lexer;
pub mod register;
pub mod bytecode;
pub mod assembler;
pub mod vm;

pub use assembler::{assemble, Assembler};
pub use bytecode::{Instruction, Opcode, Word};
pub use error::{AssemblyError, DecodeError, Error, LexError, VmError};
pub use register::Register;
pub use vm::{VM, MEMORY_SIZE};

/// Assembles `source`, loads it into a fresh machine of the default size and runs it to halt.
pub fn assemble_and_run(source: &str) -> Result<VM, Error> {
  let program = assemble(source)?;
  let mut machine = VM::new();
  machine.load(&program)?;
  machine.run()?;
  Ok(machine)
}
