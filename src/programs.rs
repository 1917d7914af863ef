/*!
  Built-in sample programs, hand-encoded. They double as workloads for comparing the
  dispatch strategies and as fixtures for the tests.
*/

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

use crate::bytecode::{LoadError, Operation as Op, Program, Word};

#[derive(
StrumDisplay, IntoStaticStr, EnumString, EnumIter,
Clone,        Copy,          Eq,         PartialEq, Debug, Hash
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Sample {
  Primes,
  Factorial,
  Smoke,
}

impl Sample {
  pub fn words(self) -> &'static [Word] {
    match self {
      Sample::Primes    => &PRIMES,
      Sample::Factorial => &FACTORIAL,
      Sample::Smoke     => &SMOKE,
    }
  }

  pub fn program(self) -> Result<Program, LoadError> {
    Program::from_words(self.words())
  }
}

impl Default for Sample {
  fn default() -> Self {
    Sample::Primes
  }
}

/// A negative immediate, as stored in memory.
const fn imm(value: i32) -> Word {
  value as Word
}

/// Prints every prime below 100000 by trial division.
pub const PRIMES: [Word; 33] = [
  Op::Push as Word, 100000,     // nmax
  Op::Push as Word, 2,          // nmax, c
  // back: 4
  Op::Over as Word,             // nmax, c, nmax
  Op::Over as Word,             // nmax, c, nmax, c
  Op::Sub as Word,              // nmax, c, c-nmax
  Op::JE as Word, 23,           // end
  Op::Push as Word, 2,          // nmax, c, divisor
  // back2: 11
  Op::Over as Word,             // nmax, c, divisor, c
  Op::Over as Word,             // nmax, c, divisor, c, divisor
  Op::Swap as Word,             // nmax, c, divisor, divisor, c
  Op::Sub as Word,              // nmax, c, divisor, c-divisor
  Op::JE as Word, 9,            // print_prime
  Op::Over as Word,             // nmax, c, divisor, c
  Op::Over as Word,             // nmax, c, divisor, c, divisor
  Op::Nop as Word,              // keeps the addresses below in place
  Op::Mod as Word,              // nmax, c, divisor, c mod divisor
  Op::JE as Word, 5,            // not_prime
  Op::Inc as Word,              // nmax, c, divisor+1
  Op::Jump as Word, imm(-15),   // back2
  // print_prime: 26
  Op::Over as Word,             // nmax, c, divisor, c
  Op::Print as Word,            // nmax, c, divisor
  // not_prime: 28
  Op::Drop as Word,             // nmax, c
  Op::Inc as Word,              // nmax, c+1
  Op::Jump as Word, imm(-28),   // back
  // end: 32
  Op::Halt as Word,
];

/// Prints 12!.
pub const FACTORIAL: [Word; 16] = [
  Op::Push as Word, 12,         // n
  Op::Push as Word, 1,          // n, a
  Op::Swap as Word,             // a, n
  // back: 5
  Op::Swap as Word,             // n, a
  Op::Over as Word,             // n, a, n
  Op::Mul as Word,              // n, a
  Op::Swap as Word,             // a, n
  Op::Dec as Word,              // a, n
  Op::Dup as Word,              // a, n, n
  Op::JNE as Word, imm(-8),     // back
  Op::Swap as Word,             // n, a
  Op::Print as Word,            // n
  Op::Halt as Word,
];

/// Touches most opcodes once.
pub const SMOKE: [Word; 26] = [
  Op::Nop as Word,
  Op::Push as Word, 0x11112222,
  Op::Push as Word, 0xf00d,
  Op::Print as Word,
  Op::Push as Word, 0x1,
  Op::Push as Word, 0x2,
  Op::Push as Word, 0x3,
  Op::Push as Word, 0x4,
  Op::Swap as Word,
  Op::Dup as Word,
  Op::Inc as Word,
  Op::Add as Word,
  Op::Sub as Word,
  Op::Mul as Word,
  Op::Rand as Word,
  Op::Dec as Word,
  Op::Drop as Word,
  Op::Over as Word,
  Op::Halt as Word,
  Op::Break as Word,
];
