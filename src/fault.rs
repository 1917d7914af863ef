//! Conditions the engine detects while running a program. None of them is recoverable: each
//! is reported once on the run's output and turns into the `Break` state.

use std::fmt::{Display, Formatter};

use crate::bytecode::Word;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Fault {
  /// Decode attempted at or past the end of program memory.
  ProgramCounterOutOfBounds,
  /// The immediate of a two word instruction lies past the end of program memory.
  TruncatedInstruction,
  /// Push onto a full stack.
  StackOverflow,
  /// Pop from an empty stack.
  StackUnderflow,
  /// `Mod` with a zero divisor.
  DivideByZero,
  /// A word in opcode position that is not in the catalog.
  UndefinedOpcode(Word),
}

impl Display for Fault {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Fault::ProgramCounterOutOfBounds => write!(f, "PC out of bounds"),
      Fault::TruncatedInstruction      => write!(f, "PC+1 out of bounds"),
      Fault::StackOverflow             => write!(f, "Stack overflow"),
      Fault::StackUnderflow            => write!(f, "Stack underflow"),
      Fault::DivideByZero              => write!(f, "Division by zero"),
      Fault::UndefinedOpcode(word)     => write!(f, "Undefined opcode {}", word),
    }
  }
}
