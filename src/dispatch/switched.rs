use crate::bytecode::{Instruction, Operation};
use crate::cpu::Cpu;

use super::handlers;
use super::{Dispatcher, Strategy};

/// Direct selection: a single `match` on the opcode.
#[derive(Clone, Copy, Debug, Default)]
pub struct Switched;

impl Dispatcher for Switched {
  fn strategy(&self) -> Strategy {
    Strategy::Switched
  }

  fn dispatch(&self, cpu: &mut Cpu<'_>, instruction: &Instruction) {
    match instruction.opcode {
      Operation::Nop   => handlers::nop(cpu, instruction),
      Operation::Halt  => handlers::halt(cpu, instruction),
      Operation::Push  => handlers::push(cpu, instruction),
      Operation::Print => handlers::print(cpu, instruction),
      Operation::Swap  => handlers::swap(cpu, instruction),
      Operation::Dup   => handlers::dup(cpu, instruction),
      Operation::Over  => handlers::over(cpu, instruction),
      Operation::Inc   => handlers::inc(cpu, instruction),
      Operation::Add   => handlers::add(cpu, instruction),
      Operation::Sub   => handlers::sub(cpu, instruction),
      Operation::Mod   => handlers::modulo(cpu, instruction),
      Operation::Mul   => handlers::mul(cpu, instruction),
      Operation::Rand  => handlers::rand(cpu, instruction),
      Operation::Dec   => handlers::dec(cpu, instruction),
      Operation::Drop  => handlers::drop(cpu, instruction),
      Operation::JE    => handlers::je(cpu, instruction),
      Operation::JNE   => handlers::jne(cpu, instruction),
      Operation::Jump  => handlers::jump(cpu, instruction),
      Operation::Break => handlers::brk(cpu, instruction),
    }
  }
}
