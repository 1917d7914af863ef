use strum::IntoEnumIterator;

use crate::bytecode::{Instruction, Operation, OPCODE_COUNT};
use crate::cpu::Cpu;

use super::handlers::{self, service_routine};
use super::{Dispatcher, Handler, Strategy};

/**
  Table-indexed dispatch. The table maps every opcode to its service routine and is filled
  in once, when the dispatcher is created; after that each instruction costs one indexed
  load and one indirect call, the same for every opcode.
*/
pub struct Threaded {
  service_routines: [Handler; OPCODE_COUNT]
}

impl Threaded {
  pub fn new() -> Threaded {
    let mut service_routines: [Handler; OPCODE_COUNT] = [handlers::brk as Handler; OPCODE_COUNT];
    for operation in Operation::iter() {
      service_routines[operation.code() as usize] = service_routine(operation);
    }
    Threaded{ service_routines }
  }
}

impl Default for Threaded {
  fn default() -> Self {
    Threaded::new()
  }
}

impl Dispatcher for Threaded {
  fn strategy(&self) -> Strategy {
    Strategy::Threaded
  }

  #[inline]
  fn dispatch(&self, cpu: &mut Cpu<'_>, instruction: &Instruction) {
    (self.service_routines[instruction.opcode.code() as usize])(cpu, instruction)
  }
}
