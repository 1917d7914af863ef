/*!
  The register file of the machine and the services handlers use to change it.

  A `Cpu` lives for exactly one run. It borrows the program image, the sink that `Print`
  and diagnostics are written to, and the generator behind `Rand`. Faults are not returned
  to the caller. They are state transitions: the fault is written to the sink once and the
  state becomes `Break`, which everyone polls.
*/

use std::fmt::Arguments;
use std::io::{self, Write};

use rand_core::RngCore;
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

use crate::bytecode::{Instruction, Program, Word};
use crate::fault::Fault;
use crate::stack::OperandStack;

#[derive(StrumDisplay, IntoStaticStr, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum CpuState {
  Running,
  Halted,
  Break,
}

pub struct Cpu<'a> {
  // Registers //
  pub pc    : Word,
  pub state : CpuState,
  pub steps : i64,
  stack     : OperandStack,

  // Borrowed for the run //
  program : &'a Program,
  console : &'a mut dyn Write,
  entropy : &'a mut dyn RngCore,

  // First failure to write to `console`, if any.
  io_error : Option<io::Error>,
}

impl<'a> Cpu<'a> {

  pub fn new(program: &'a Program, console: &'a mut dyn Write, entropy: &'a mut dyn RngCore)
    -> Cpu<'a>
  {
    Cpu {
      pc       : 0,
      state    : CpuState::Running,
      steps    : 0,
      stack    : OperandStack::new(),
      program,
      console,
      entropy,
      io_error : None,
    }
  }

  // region Accessors

  pub fn program(&self) -> &'a Program {
    self.program
  }

  pub fn stack(&self) -> &OperandStack {
    &self.stack
  }

  pub fn sp(&self) -> i32 {
    self.stack.sp()
  }

  pub fn is_running(&self) -> bool {
    self.state == CpuState::Running
  }

  /// Hands over the first error the output sink returned, if there was one.
  pub fn take_io_error(&mut self) -> Option<io::Error> {
    self.io_error.take()
  }

  // endregion

  // region Services for handlers

  /// Pushes `value`, or faults with `StackOverflow` and discards it.
  pub fn push(&mut self, value: Word) {
    if let Err(fault) = self.stack.push(value) {
      self.fault(fault);
    }
  }

  /**
    Pops the top of the stack. On underflow this faults and returns 0, which is not a value
    anyone should use: callers check `state` before looking at the result.
  */
  pub fn pop(&mut self) -> Word {
    match self.stack.pop() {
      Ok(value) => value,
      Err(fault) => {
        self.fault(fault);
        0
      }
    }
  }

  /// Adds a jump offset to the program counter, wrapping like the 32 bit register it is.
  pub fn jump(&mut self, offset: i32) {
    self.pc = self.pc.wrapping_add(offset as Word);
  }

  /// The bookkeeping after every executed instruction, faulting or not.
  pub fn advance(&mut self, instruction: &Instruction) {
    self.pc = self.pc.wrapping_add(instruction.length);
    self.steps += 1;
  }

  pub fn random(&mut self) -> Word {
    self.entropy.next_u32()
  }

  pub fn print(&mut self, value: Word) {
    self.write_line(format_args!("[{}]", value as i32));
  }

  /// Reports `fault` and stops the machine.
  pub fn fault(&mut self, fault: Fault) {
    self.diagnose(fault);
    self.state = CpuState::Break;
  }

  /// Reports `fault` without touching the state.
  pub fn diagnose(&mut self, fault: Fault) {
    self.write_line(format_args!("{}", fault));
  }

  // endregion

  fn write_line(&mut self, line: Arguments<'_>) {
    if self.io_error.is_some() {
      return;
    }
    if let Err(error) = writeln!(self.console, "{}", line) {
      self.io_error = Some(error);
    }
  }
}
