use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::bytecode::Word;

/**
  Opcodes of the virtual machine.

  As in C, enum values are represented by consecutive natural numbers and are the values
  stored in program memory. The table-indexed dispatchers index their handler tables by
  these numbers, so the order the opcodes are listed below is significant.
  Order-dependencies:
      ```
      OPCODE_COUNT
      dispatch::handlers::service_routine()
      programs::*
      ```
  `Break` is deliberately zero: empty program memory halts the machine with a fault.
*/
#[allow(clippy::upper_case_acronyms)]
#[derive(
StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq,         PartialEq, Debug,            Hash
)]
#[strum(ascii_case_insensitive)]
#[repr(u32)]
pub enum Operation {
  Break,  // break
  Nop,    // nop
  Halt,   // halt
  Push,   // push( imm )
  Print,  // print
  JNE,    // jne( offset )
  Swap,   // swap
  Dup,    // dup
  JE,     // je( offset )
  Inc,    // inc
  Add,    // add
  Sub,    // sub
  Mul,    // mul
  Rand,   // rand
  Dec,    // dec
  Drop,   // drop
  Over,   // over
  Mod,    // mod
  Jump,   // jump( offset )
}

pub const OPCODE_COUNT: usize = 19;

impl Operation {
  pub fn code(&self) -> Word {
    Into::<Word>::into(*self)
  }

  /// Decodes an opcode word. Words outside the catalog have no operation.
  pub fn from_word(word: Word) -> Option<Operation> {
    Operation::try_from(word).ok()
  }

  /// Whether the opcode is followed by an immediate word.
  pub fn has_immediate(&self) -> bool {
    matches!(self, Operation::Push | Operation::JNE | Operation::JE | Operation::Jump)
  }

  /// Whether the immediate, if any, is a jump offset.
  pub fn is_jump(&self) -> bool {
    matches!(self, Operation::JNE | Operation::JE | Operation::Jump)
  }

  /// Returns the size in WORDS of an instruction for this opcode.
  pub fn length(&self) -> Word {
    match self.has_immediate() {
      true  => 2, // Opcode and immediate
      false => 1  // Opcode only
    }
  }
}

/**
  A decoded instruction. These are produced fresh by the decoder every cycle and handed to
  the dispatcher; nothing keeps them afterward.

  `immediate` is only meaningful when `length == 2`.
*/
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Instruction {
  pub opcode    : Operation,
  pub length    : Word,
  pub immediate : i32,
}

impl Instruction {
  /// The instruction every decoding fault collapses into.
  pub const BREAK: Instruction = Instruction{ opcode: Operation::Break, length: 1, immediate: 0 };

  pub fn nullary(opcode: Operation) -> Instruction {
    Instruction{ opcode, length: 1, immediate: 0 }
  }

  pub fn with_immediate(opcode: Operation, immediate: i32) -> Instruction {
    Instruction{ opcode, length: 2, immediate }
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.length {
      2 => write!(f, "{} {}", self.opcode, self.immediate),
      _ => write!(f, "{}", self.opcode)
    }
  }
}
