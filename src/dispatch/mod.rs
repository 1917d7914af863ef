/*!
  Dispatch strategies: how the handler for a decoded instruction is found and invoked.

  A strategy is anything implementing `Dispatcher`. All strategies run the same service
  routines from `handlers`, so the only thing that differs between them is the control
  transfer itself:

    * `Switched`: one `match` over the opcode, a chain of compares and branches.
    * `Threaded`: a table from opcode to routine, built when the dispatcher is created;
      one indirect call per instruction whatever the opcode.
    * `Translated`: a table from *address* to routine, built once for the program being
      run, so the opcode is not even consulted at dispatch time.

  Whatever the strategy, a program must print the same lines, leave the CPU in the same
  state and take the same number of steps.
*/

mod handlers;
mod switched;
mod threaded;
mod translated;

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

use crate::bytecode::{fetch_decode, Instruction, Program};
use crate::cpu::Cpu;

pub use handlers::service_routine;
pub use switched::Switched;
pub use threaded::Threaded;
pub use translated::Translated;

/// A service routine: executes one decoded instruction against the CPU.
pub type Handler = fn(&mut Cpu<'_>, &Instruction);

pub trait Dispatcher {
  fn strategy(&self) -> Strategy;

  /**
    Produces the instruction at `cpu.pc`, reporting any decoding fault on the CPU exactly as
    `fetch_decode` does. Strategies that decode ahead of time override this.
  */
  fn fetch(&self, cpu: &mut Cpu<'_>) -> Instruction {
    fetch_decode(cpu)
  }

  /**
    Runs the routine for `instruction`, which was just decoded at `cpu.pc`. The routine
    may change the stack, the state and, for jumps, the program counter; the caller then
    advances past the instruction.
  */
  fn dispatch(&self, cpu: &mut Cpu<'_>, instruction: &Instruction);
}

#[derive(
StrumDisplay, IntoStaticStr, EnumString, EnumIter,
Clone,        Copy,          Eq,         PartialEq, Debug, Hash
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Strategy {
  Switched,
  Threaded,
  Translated,
}

impl Strategy {
  /// Builds the dispatcher for a run of `program`.
  pub fn dispatcher(self, program: &Program) -> Box<dyn Dispatcher> {
    match self {
      Strategy::Switched   => Box::new(Switched),
      Strategy::Threaded   => Box::new(Threaded::new()),
      Strategy::Translated => Box::new(Translated::new(program)),
    }
  }
}

impl Default for Strategy {
  fn default() -> Self {
    Strategy::Threaded
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;
  use strum::IntoEnumIterator;

  #[test]
  fn names() {
    assert_eq!(Strategy::Switched.to_string(), "switched");
    assert_eq!(Strategy::from_str("Threaded"), Ok(Strategy::Threaded));
    assert_eq!(Strategy::from_str("translated"), Ok(Strategy::Translated));
    assert!(Strategy::from_str("jit").is_err());
  }

  #[test]
  fn dispatchers_know_their_strategy() {
    let program = Program::from_words(&[]).unwrap();
    for strategy in Strategy::iter() {
      assert_eq!(strategy.dispatcher(&program).strategy(), strategy);
    }
  }
}
