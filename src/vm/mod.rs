//! Structures and functions for the virtual machine: a fixed-size word memory, five registers,
//! and a fetch-decode-execute loop that runs until it reaches a `halt` instruction.

mod display;
mod memory;
mod registers;

pub use memory::Memory;
pub use registers::RegisterFile;

use crate::bytecode::{try_decode_instruction, Instruction, MemoryOperand, Opcode, Operand, Word};
use crate::error::{DecodeError, VmError};
use crate::register::Register;

/// Default memory capacity in words.
pub const MEMORY_SIZE: usize = 80;

/// Whether the machine can keep going after a step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
  Running,
  Halted,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VM {
  memory    : Memory,
  registers : RegisterFile,
}

impl Default for VM {
  fn default() -> Self {
    VM::new()
  }
}

impl VM {

  // region Construction and inspection

  pub fn new() -> VM {
    VM::with_memory_size(MEMORY_SIZE)
  }

  /**
    Builds a machine with `size` words of memory. The stack grows down from the last word, so SP
    and FP start at `size - 1`. A machine with no memory faults on its first fetch.
  */
  pub fn with_memory_size(size: usize) -> VM {
    let stack_top = size.saturating_sub(1) as Word;
    VM {
      memory    : Memory::new(size),
      registers : RegisterFile::new(stack_top),
    }
  }

  /// Copies `program` into memory starting at address 0. Registers are not touched.
  pub fn load(&mut self, program: &[Word]) -> Result<(), VmError> {
    self.memory.load(program)
  }

  pub fn registers(&self) -> &RegisterFile {
    &self.registers
  }

  pub fn register(&self, register: Register) -> Word {
    self.registers.get(register)
  }

  pub fn set_register(&mut self, register: Register, value: Word) {
    self.registers.set(register, value);
  }

  pub fn memory(&self) -> &[Word] {
    self.memory.as_slice()
  }

  // endregion

  // region Execution

  /// Runs until a `halt` is executed. A program that never halts never returns.
  pub fn run(&mut self) -> Result<(), VmError> {
    loop {
      #[cfg(feature = "trace_computation")]
      println!("{}", self);

      if self.step()? == Status::Halted {
        return Ok(());
      }
    }
  }

  /**
    Like `run`, but calls `observer` with the machine and the decoded instruction before each
    instruction is executed, including the final `halt`.
  */
  pub fn run_with_observer<F>(&mut self, mut observer: F) -> Result<(), VmError>
    where F: FnMut(&VM, &Instruction)
  {
    loop {
      let address = self.registers.ip();
      let instruction = self.fetch()?;
      observer(self, &instruction);
      if self.execute(address, instruction)? == Status::Halted {
        return Ok(());
      }
    }
  }

  /// Fetches, decodes and executes the instruction at IP.
  pub fn step(&mut self) -> Result<Status, VmError> {
    let address = self.registers.ip();
    let instruction = self.fetch()?;

    #[cfg(feature = "trace_computation")]
    println!("{:>4}: {}", address, instruction);

    self.execute(address, instruction)
  }

  /**
    Decodes the instruction at IP. The decoder reads exactly the instruction's width in words;
    an instruction running past the end of memory faults at the first missing address.
  */
  fn fetch(&self) -> Result<Instruction, VmError> {
    let address = self.registers.ip();
    let words = self.memory.words_from(address)?;
    try_decode_instruction(words).map_err(|source| {
      match source {
        DecodeError::Truncated { available, .. } => {
          VmError::MemoryOutOfBounds {
            address: address as i64 + available as i64,
            size: self.memory.len()
          }
        }
        source => VmError::Decode { address, source }
      }
    })
  }

  /**
    IP is moved past the whole instruction before its effect is applied, so control transfers
    (including any instruction that writes `ip`) overwrite the advanced value, and an `ip`
    operand reads the address of the following instruction. A faulting instruction has no
    effect: IP is left at its address.
  */
  fn execute(&mut self, address: Word, instruction: Instruction) -> Result<Status, VmError> {
    let next = address.wrapping_add(instruction.width() as Word);
    self.registers.set(Register::IP, next);

    let status = self.apply(address, next, instruction);
    if status.is_err() {
      self.registers.set(Register::IP, address);
    }
    status
  }

  fn apply(&mut self, address: Word, next: Word, instruction: Instruction)
    -> Result<Status, VmError>
  {
    match instruction {

      Instruction::Nullary(Opcode::Halt) => {
        return Ok(Status::Halted);
      }

      // Return
      Instruction::Nullary(_) => {
        let target = self.pop()?;
        self.registers.set(Register::IP, target);
      }

      Instruction::Load { destination, source } => {
        let value = self.memory.read(self.effective_address(&source))?;
        self.registers.set(destination, value);
      }

      Instruction::Store { destination, source } => {
        let target = self.effective_address(&destination);
        self.memory.write(target, self.registers.get(source))?;
      }

      Instruction::Binary { opcode, destination, source } => {
        let result = self.alu(address, opcode, self.registers.get(destination), &source)?;
        self.registers.set(destination, result);
      }

      Instruction::Branch { opcode, target } => {
        let taken = match opcode {
          Opcode::JumpIfZero    => self.registers.a() == 0,
          Opcode::JumpIfNonZero => self.registers.a() != 0,
          Opcode::Call => {
            self.push(next)?;
            true
          }
          // Jump
          _ => true
        };
        if taken {
          self.registers.set(Register::IP, target);
        }
      }

      Instruction::Push(source) => {
        let value = self.operand_value(&source);
        self.push(value)?;
      }

      Instruction::Pop(destination) => {
        let value = self.pop()?;
        self.registers.set(destination, value);
      }

    }

    Ok(Status::Running)
  }

  // endregion

  // region Operand helpers

  fn operand_value(&self, operand: &Operand) -> Word {
    match operand {
      Operand::Register(register) => self.registers.get(*register),
      Operand::Immediate(value)   => *value
    }
  }

  fn effective_address(&self, operand: &MemoryOperand) -> i64 {
    match operand {
      MemoryOperand::Absolute(address)   => *address as i64,
      MemoryOperand::FrameOffset(offset) => Memory::offset_address(self.registers.fp(), *offset)
    }
  }

  /// Computes `lhs <opcode> source` for Move and the ALU operations.
  fn alu(&self, address: Word, opcode: Opcode, lhs: Word, source: &Operand)
    -> Result<Word, VmError>
  {
    let rhs = self.operand_value(source);

    let result =
      match opcode {
        Opcode::Move       => rhs,
        Opcode::Add        => lhs.wrapping_add(rhs),
        Opcode::Subtract   => lhs.wrapping_sub(rhs),
        Opcode::Multiply   => lhs.wrapping_mul(rhs),
        Opcode::Divide     => lhs.checked_div(rhs).ok_or(VmError::DivisionByZero { address })?,
        Opcode::Modulo     => lhs.checked_rem(rhs).ok_or(VmError::DivisionByZero { address })?,
        Opcode::And        => lhs & rhs,
        Opcode::Or         => lhs | rhs,
        Opcode::ShiftLeft  => lhs.wrapping_shl(rhs),
        Opcode::ShiftRight => lhs.wrapping_shr(rhs),

        // Unary, but laid out like the others: a register operand complements the
        // destination, an immediate operand is complemented into it.
        Opcode::Not => {
          match source {
            Operand::Register(_)  => !lhs,
            Operand::Immediate(_) => !rhs
          }
        }

        Opcode::GreaterThan          => (lhs >  rhs) as Word,
        Opcode::GreaterThanOrEqualTo => (lhs >= rhs) as Word,
        Opcode::LessThan             => (lhs <  rhs) as Word,
        Opcode::LessThanOrEqualTo    => (lhs <= rhs) as Word,
        Opcode::EqualTo              => (lhs == rhs) as Word,
        Opcode::NotEqualTo           => (lhs != rhs) as Word,

        Opcode::Halt
        | Opcode::Load
        | Opcode::Store
        | Opcode::Jump
        | Opcode::JumpIfZero
        | Opcode::JumpIfNonZero
        | Opcode::Push
        | Opcode::Pop
        | Opcode::Call
        | Opcode::Return => {
          return Err(VmError::NotArithmetic { address, opcode });
        }
      };

    Ok(result)
  }

  // endregion

  // region Stack

  /// Writes `value` at SP, then moves SP down. SP never goes below 0.
  fn push(&mut self, value: Word) -> Result<(), VmError> {
    let sp = self.registers.sp();
    if sp == 0 {
      return Err(VmError::StackOverflow { sp });
    }
    self.memory.write(sp, value)?;
    self.registers.set(Register::SP, sp - 1);
    Ok(())
  }

  /// Moves SP up, then reads the value at SP. SP never moves past the last word.
  fn pop(&mut self) -> Result<Word, VmError> {
    let sp = self.registers.sp();
    let top = sp as i64 + 1;
    if top >= self.memory.len() as i64 {
      return Err(VmError::StackUnderflow { sp });
    }
    let value = self.memory.read(top)?;
    self.registers.set(Register::SP, top as Word);
    Ok(value)
  }

  // endregion

}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::assembler::assemble;

  fn run(source: &str) -> VM {
    let mut machine = VM::new();
    machine.load(&assemble(source).unwrap()).unwrap();
    machine.run().unwrap();
    machine
  }

  fn fault(source: &str) -> VmError {
    let mut machine = VM::new();
    machine.load(&assemble(source).unwrap()).unwrap();
    machine.run().unwrap_err()
  }

  #[test]
  fn initial_state(){
    let machine = VM::new();
    assert_eq!(machine.memory().len(), MEMORY_SIZE);
    assert_eq!(machine.registers().sp(), 79);
    assert_eq!(machine.registers().fp(), 79);
    assert_eq!(machine.registers().ip(), 0);
  }

  #[test]
  fn halt_leaves_ip_after_halt_word(){
    let machine = run("mov a, 1\nmov b, 2\nadd a, b\nhalt");
    assert_eq!(machine.registers().a(), 3);
    assert_eq!(machine.registers().b(), 2);
    assert_eq!(machine.registers().ip(), 13);
  }

  #[test]
  fn arithmetic(){
    assert_eq!(run("mov a, 10\nadd a, 3\nhalt").registers().a(), 13);
    assert_eq!(run("mov a, 3\nsub a, 5\nhalt").registers().a(), 0xFFFF_FFFE);
    assert_eq!(run("mov a, 6\nmul a, 7\nhalt").registers().a(), 42);
    assert_eq!(run("mov a, 17\ndiv a, 5\nhalt").registers().a(), 3);
    assert_eq!(run("mov a, 17\nmod a, 5\nhalt").registers().a(), 2);
    assert_eq!(run("mov a, 12\nand a, 10\nhalt").registers().a(), 8);
    assert_eq!(run("mov a, 12\nor a, 3\nhalt").registers().a(), 15);
    assert_eq!(run("mov a, 1\nshl a, 4\nhalt").registers().a(), 16);
    assert_eq!(run("mov a, 16\nshr a, 2\nhalt").registers().a(), 4);
    assert_eq!(run("mov a, 1\nmov b, 33\nshl a, b\nhalt").registers().a(), 2);
  }

  #[test]
  fn comparisons(){
    assert_eq!(run("mov a, 7\neq a, 7\nhalt").registers().a(), 1);
    assert_eq!(run("mov a, 7\neq a, 8\nhalt").registers().a(), 0);
    assert_eq!(run("mov a, 7\nne a, 8\nhalt").registers().a(), 1);
    assert_eq!(run("mov a, 7\ngt a, 6\nhalt").registers().a(), 1);
    assert_eq!(run("mov a, 7\nge a, 8\nhalt").registers().a(), 0);
    assert_eq!(run("mov a, 7\nlt a, 8\nhalt").registers().a(), 1);
    assert_eq!(run("mov a, 7\nle a, 7\nhalt").registers().a(), 1);
    // Words compare unsigned.
    assert_eq!(run("mov a, -1\ngt a, 1\nhalt").registers().a(), 1);
  }

  #[test]
  fn not_selects_its_operand(){
    assert_eq!(run("mov a, 0\nnot a, a\nhalt").registers().a(), 0xFFFF_FFFF);
    assert_eq!(run("mov a, 9\nnot a, 5\nhalt").registers().a(), !5);
  }

  #[test]
  fn move_from_register(){
    let machine = run("mov b, 21\nmov a, b\nhalt");
    assert_eq!(machine.registers().a(), 21);
  }

  #[test]
  fn stack_discipline(){
    let machine = run("push 5\npop a\nhalt");
    assert_eq!(machine.registers().a(), 5);
    assert_eq!(machine.registers().sp(), 79);
    assert_eq!(machine.memory()[79], 5);

    let machine = run("mov b, 8\npush b\npush 9\npop a\nhalt");
    assert_eq!(machine.registers().a(), 9);
    assert_eq!(machine.registers().sp(), 78);
  }

  #[test]
  fn call_and_return(){
    let source = "
      jump &main
      &double:
        add a, a
        ret
      &main:
        mov a, 4
        call &double
        mov b, 1
        halt
    ";
    let machine = run(source);
    assert_eq!(machine.registers().a(), 8);
    assert_eq!(machine.registers().b(), 1);
    assert_eq!(machine.registers().sp(), 79);
  }

  #[test]
  fn call_pushes_address_after_call(){
    // jump: 0..2, call at 2..4, halt at 4, f at 5
    let mut machine = VM::new();
    machine.load(&assemble("&start:\ncall &f\nhalt\n&f:\npop b\nhalt").unwrap()).unwrap();
    machine.run().unwrap();
    assert_eq!(machine.registers().b(), 4);
  }

  #[test]
  fn conditional_branches(){
    let source = "jumpz &target\nmov b, 1\nhalt\n&target:\nmov b, 2\nhalt";
    assert_eq!(run(&format!("mov a, 0\n{}", source)).registers().b(), 2);
    assert_eq!(run(&format!("mov a, 1\n{}", source)).registers().b(), 1);

    let source = "jumpnz &target\nmov b, 1\nhalt\n&target:\nmov b, 2\nhalt";
    assert_eq!(run(&format!("mov a, 0\n{}", source)).registers().b(), 1);
    assert_eq!(run(&format!("mov a, 1\n{}", source)).registers().b(), 2);
  }

  #[test]
  fn countdown_loop(){
    let source = "
      &start:
        mov a, 5
      &loop:
        add b, 2
        sub a, 1
        jumpnz &loop
        halt
    ";
    let machine = run(source);
    assert_eq!(machine.registers().a(), 0);
    assert_eq!(machine.registers().b(), 10);
  }

  #[test]
  fn absolute_memory(){
    let source = "
      &start:
        mov a, 42
        store &cell, a
        load b, &cell
        halt
      &cell:
        halt
    ";
    let machine = run(source);
    assert_eq!(machine.registers().b(), 42);
    // The cell is the last word of the program.
    assert_eq!(machine.memory()[2 + 4 + 4 + 4 + 1], 42);
  }

  #[test]
  fn frame_relative_memory(){
    let source = "
      mov fp, 70
      mov a, 11
      store fp[-2], a
      mov b, 12
      store fp, b
      load a, fp
      load b, fp[-2]
      halt
    ";
    let machine = run(source);
    assert_eq!(machine.memory()[68], 11);
    assert_eq!(machine.memory()[70], 12);
    assert_eq!(machine.registers().a(), 12);
    assert_eq!(machine.registers().b(), 11);
  }

  #[test]
  fn writing_ip_jumps(){
    // mov ip, 8 skips the second mov (at 4..8).
    let machine = run("mov ip, 8\nmov a, 1\nhalt");
    assert_eq!(machine.registers().a(), 0);
    assert_eq!(machine.registers().ip(), 9);

    let machine = run("mov a, ip\nhalt");
    assert_eq!(machine.registers().a(), 4);
  }

  #[test]
  fn division_by_zero(){
    assert_eq!(fault("mov a, 1\ndiv a, 0\nhalt"), VmError::DivisionByZero { address: 4 });
    assert_eq!(fault("mov a, 1\nmod a, b\nhalt"), VmError::DivisionByZero { address: 4 });
  }

  #[test]
  fn fault_leaves_ip_at_faulting_instruction(){
    let mut machine = VM::new();
    machine.load(&assemble("mov a, 1\ndiv a, 0\nhalt").unwrap()).unwrap();
    assert!(machine.run().is_err());
    assert_eq!(machine.registers().ip(), 4);
    assert_eq!(machine.registers().a(), 1);

    let mut machine = VM::new();
    machine.load(&assemble("mov sp, 0\npush 1\nhalt").unwrap()).unwrap();
    assert_eq!(machine.run(), Err(VmError::StackOverflow { sp: 0 }));
    assert_eq!(machine.registers().ip(), 4);
    assert_eq!(machine.registers().sp(), 0);
  }

  #[test]
  fn alu_rejects_control_opcodes(){
    let machine = VM::new();
    assert_eq!(
      machine.alu(6, Opcode::Jump, 1, &Operand::Immediate(2)),
      Err(VmError::NotArithmetic { address: 6, opcode: Opcode::Jump })
    );
    assert_eq!(machine.alu(6, Opcode::Add, 1, &Operand::Immediate(2)), Ok(3));
  }

  #[test]
  fn memory_faults(){
    assert_eq!(
      fault("mov fp, 0\nload a, fp[-1]\nhalt"),
      VmError::MemoryOutOfBounds { address: -1, size: MEMORY_SIZE }
    );
    assert_eq!(
      fault("store fp[1], a\nhalt"),
      VmError::MemoryOutOfBounds { address: 80, size: MEMORY_SIZE }
    );
    // Running off the end of a program that never halts.
    let mut machine = VM::with_memory_size(4);
    machine.load(&assemble("mov a, 1").unwrap()).unwrap();
    assert_eq!(
      machine.run(),
      Err(VmError::MemoryOutOfBounds { address: 4, size: 4 })
    );
    // An opcode in bounds whose operands are not.
    let mut machine = VM::with_memory_size(2);
    machine.load(&[Opcode::Move.code(), 0]).unwrap();
    assert_eq!(
      machine.run(),
      Err(VmError::MemoryOutOfBounds { address: 2, size: 2 })
    );
    assert_eq!(machine.registers().ip(), 0);
  }

  #[test]
  fn stack_faults(){
    assert_eq!(fault("pop a\nhalt"), VmError::StackUnderflow { sp: 79 });
    assert_eq!(fault("ret"), VmError::StackUnderflow { sp: 79 });
    assert_eq!(fault("mov sp, 0\npush 1\nhalt"), VmError::StackOverflow { sp: 0 });
  }

  #[test]
  fn decode_faults(){
    let mut machine = VM::new();
    machine.load(&[Opcode::Move.code(), 0, 0, 1, 99]).unwrap();
    assert_eq!(
      machine.run(),
      Err(VmError::Decode { address: 4, source: DecodeError::InvalidOpcode(99) })
    );

    let mut machine = VM::new();
    machine.load(&[Opcode::Pop.code(), 7]).unwrap();
    assert_eq!(
      machine.run(),
      Err(VmError::Decode { address: 0, source: DecodeError::InvalidRegister(7) })
    );
  }

  #[test]
  fn load_rejects_oversized_program(){
    let mut machine = VM::with_memory_size(2);
    assert_eq!(
      machine.load(&[0, 0, 0]),
      Err(VmError::ProgramTooLarge { length: 3, capacity: 2 })
    );
  }

  #[test]
  fn observer_sees_every_instruction(){
    let mut machine = VM::new();
    machine.load(&assemble("push 1\npop a\nhalt").unwrap()).unwrap();
    let mut seen = vec![];
    machine.run_with_observer(|vm, instruction| {
      seen.push((vm.registers().ip(), instruction.opcode()));
    }).unwrap();
    assert_eq!(seen, vec![(0, Opcode::Push), (3, Opcode::Pop), (5, Opcode::Halt)]);
    assert_eq!(machine.registers().ip(), 6);
  }

  #[test]
  fn step_reports_status(){
    let mut machine = VM::new();
    machine.load(&assemble("mov a, 1\nhalt").unwrap()).unwrap();
    assert_eq!(machine.step(), Ok(Status::Running));
    assert_eq!(machine.step(), Ok(Status::Halted));
  }

}
