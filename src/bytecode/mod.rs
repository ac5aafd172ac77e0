/*!

  The VM uses a 32 bit word as its only unit of storage. Memory addresses word, not bytes, and
  every field of every instruction is a whole word: there is no sub-word packing. An instruction
  is its opcode word followed by a fixed number of field words determined by the opcode alone:

    Halt, Return                          1 word   [Opcode]
    Jump, JumpIfZero, JumpIfNonZero, Call 2 words  [Opcode][Address]
    Pop                                   2 words  [Opcode][Register]
    Push                                  3 words  [Opcode][Kind][Operand]
    Load                                  4 words  [Opcode][Register][Mode][Source]
    Store                                 4 words  [Opcode][Mode][Destination][Register]
    Move and the ALU operations           4 words  [Opcode][Register][Kind][Operand]

  `Kind` is 1 when the operand is a register index and 0 when it is an immediate value. `Mode` is
  0 for an absolute address and 1 for a signed offset from the frame pointer, stored as the
  two's-complement bit pattern of the offset.

  The widths are the contract between the assembler, which sums them to place labels, and the
  VM, which consumes exactly that many words per instruction. Both read them from
  `Opcode::width`.

  Unlike the encoding, the decoded form of an instruction is an enum carrying its operands.
  Decoded instructions are transient values produced one at a time by the VM's decode step, so
  their size in memory is irrelevant.

*/

mod binary;
mod instruction;
mod assembly;

pub use binary::{encode_instruction, instruction_size, try_decode_instruction};
pub use instruction::{
  AddressingMode, Instruction, MemoryOperand, Opcode, Operand, OperandKind
};
pub use assembly::{disassemble, Listing};

pub type Word = u32;
pub type SignedWord = i32;

/// Reinterprets a signed offset as the unsigned word that stores it.
pub fn signed_to_word(n: SignedWord) -> Word {
  n as Word
}

/// Reinterprets a stored word as the signed offset it encodes.
pub fn word_to_signed(n: Word) -> SignedWord {
  n as SignedWord
}
