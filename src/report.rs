//! What is left of a run once it is over: the final registers, the stack, and whether the
//! run counts as a success.

use std::fmt::{Display, Formatter};

use crate::bytecode::Word;
use crate::cpu::{Cpu, CpuState};

/// Exit status of a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status of a run that ended in `Break`.
pub const EXIT_FAULT: i32 = 1;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Report {
  pub steps      : i64,
  pub state      : CpuState,
  pub pc         : Word,
  pub sp         : i32,
  /// Stack contents, top first.
  pub stack      : Vec<Word>,
  pub step_limit : i64,
}

impl Report {
  pub fn new(cpu: &Cpu<'_>, step_limit: i64) -> Report {
    Report {
      steps: cpu.steps,
      state: cpu.state,
      pc: cpu.pc,
      sp: cpu.sp(),
      stack: cpu.stack().iter_top_down().collect(),
      step_limit,
    }
  }

  /// A run succeeds if it halted, or if it used up its step budget without faulting.
  pub fn is_success(&self) -> bool {
    match self.state {
      CpuState::Halted  => true,
      CpuState::Running => self.steps == self.step_limit,
      CpuState::Break   => false,
    }
  }

  pub fn exit_code(&self) -> i32 {
    match self.is_success() {
      true  => EXIT_SUCCESS,
      false => EXIT_FAULT
    }
  }
}

/// Formats like C's `%#x`: hex with a `0x` prefix, except that zero is just `0`.
fn alternate_hex(value: Word) -> String {
  match value {
    0 => "0".to_string(),
    _ => format!("{:#x}", value)
  }
}

impl Display for Report {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "CPU executed {} steps. End state \"{}\".", self.steps, self.state)?;
    writeln!(f, "PC = {}, SP = {}", alternate_hex(self.pc), self.sp)?;
    write!(f, "Stack: ")?;
    for value in &self.stack {
      write!(f, "{:>10} ", alternate_hex(*value))?;
    }
    if self.stack.is_empty() {
      write!(f, "(empty)")?;
    }
    Ok(())
  }
}
