use crate::bytecode::{decode_at, fetch_decode, Decoded, Instruction, Program, Word, PROGRAM_SIZE};
use crate::cpu::Cpu;

use super::handlers::{self, service_routine};
use super::{Dispatcher, Handler, Strategy};

/// An address's decoded instruction and the routine bound to it.
#[derive(Clone, Copy)]
struct EntryPoint {
  decoded: Decoded,
  routine: Handler,
}

/**
  Dispatch through per-address entry points. When the dispatcher is built, the instruction
  at every address of the program is decoded once and the address is bound to that
  instruction and its service routine. From then on nothing is decoded: fetching reads the
  entry point of the current program counter and dispatching calls through it.

  Decoding is a pure function of the program and the address, so an entry point always
  holds what the execution loop would have decoded there. Faults found while translating
  are kept with the entry point and reported when, and only if, that address is reached.
*/
pub struct Translated {
  entry_points: Vec<EntryPoint>
}

impl Translated {
  pub fn new(program: &Program) -> Translated {
    let entry_points =
      (0..PROGRAM_SIZE)
        .map(|address| {
          let decoded = decode_at(program, address as Word);
          EntryPoint{ decoded, routine: service_routine(decoded.instruction.opcode) }
        })
        .collect();
    Translated{ entry_points }
  }
}

impl Dispatcher for Translated {
  fn strategy(&self) -> Strategy {
    Strategy::Translated
  }

  fn fetch(&self, cpu: &mut Cpu<'_>) -> Instruction {
    match self.entry_points.get(cpu.pc as usize) {
      Some(entry_point) => {
        if let Some(fault) = entry_point.decoded.fault {
          cpu.diagnose(fault);
        }
        entry_point.decoded.instruction
      }
      // Past program memory: the decoder reports it and stops the machine.
      None => fetch_decode(cpu)
    }
  }

  #[inline]
  fn dispatch(&self, cpu: &mut Cpu<'_>, instruction: &Instruction) {
    match self.entry_points.get(cpu.pc as usize) {
      Some(entry_point) => (entry_point.routine)(cpu, instruction),
      // Unreachable from the execution loop, which never dispatches past program memory.
      None => handlers::brk(cpu, instruction)
    }
  }
}
