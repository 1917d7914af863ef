/*!
  Service routines, one per opcode. Every dispatch strategy runs these same routines; the
  strategies only differ in how they get from an opcode to its routine.

  A routine does the work of its instruction and nothing else. Advancing the program
  counter and counting the step belong to the execution loop, which does both after the
  routine returns, whether or not it faulted.

  Every pop is followed by a state check. If the pop faulted, the routine returns on the
  spot: nothing is pushed and no jump is taken. Whatever was popped before the fault stays
  popped.
*/

use crate::bytecode::{Instruction, Operation, Word};
use crate::cpu::{Cpu, CpuState};
use crate::fault::Fault;

use super::Handler;

/// Pops a value, returning from the enclosing routine if the pop faulted.
macro_rules! pop_or_bail {
  ($cpu:expr) => {{
    let value = $cpu.pop();
    if !$cpu.is_running() {
      return;
    }
    value
  }};
}

/// The routine for `operation`.
pub fn service_routine(operation: Operation) -> Handler {
  match operation {
    Operation::Break => brk,
    Operation::Nop   => nop,
    Operation::Halt  => halt,
    Operation::Push  => push,
    Operation::Print => print,
    Operation::JNE   => jne,
    Operation::Swap  => swap,
    Operation::Dup   => dup,
    Operation::JE    => je,
    Operation::Inc   => inc,
    Operation::Add   => add,
    Operation::Sub   => sub,
    Operation::Mul   => mul,
    Operation::Rand  => rand,
    Operation::Dec   => dec,
    Operation::Drop  => drop,
    Operation::Over  => over,
    Operation::Mod   => modulo,
    Operation::Jump  => jump,
  }
}

#[inline]
pub fn brk(cpu: &mut Cpu<'_>, _: &Instruction) {
  cpu.state = CpuState::Break;
}

#[inline]
pub fn nop(_: &mut Cpu<'_>, _: &Instruction) {}

#[inline]
pub fn halt(cpu: &mut Cpu<'_>, _: &Instruction) {
  cpu.state = CpuState::Halted;
}

#[inline]
pub fn push(cpu: &mut Cpu<'_>, instruction: &Instruction) {
  cpu.push(instruction.immediate as Word);
}

#[inline]
pub fn print(cpu: &mut Cpu<'_>, _: &Instruction) {
  let value = pop_or_bail!(cpu);
  cpu.print(value);
}

#[inline]
pub fn swap(cpu: &mut Cpu<'_>, _: &Instruction) {
  let a = pop_or_bail!(cpu);
  let b = pop_or_bail!(cpu);
  cpu.push(a);
  cpu.push(b);
}

#[inline]
pub fn dup(cpu: &mut Cpu<'_>, _: &Instruction) {
  let a = pop_or_bail!(cpu);
  cpu.push(a);
  cpu.push(a);
}

#[inline]
pub fn over(cpu: &mut Cpu<'_>, _: &Instruction) {
  let a = pop_or_bail!(cpu);
  let b = pop_or_bail!(cpu);
  cpu.push(b);
  cpu.push(a);
  cpu.push(b);
}

#[inline]
pub fn inc(cpu: &mut Cpu<'_>, _: &Instruction) {
  let a = pop_or_bail!(cpu);
  cpu.push(a.wrapping_add(1));
}

#[inline]
pub fn dec(cpu: &mut Cpu<'_>, _: &Instruction) {
  let a = pop_or_bail!(cpu);
  cpu.push(a.wrapping_sub(1));
}

#[inline]
pub fn add(cpu: &mut Cpu<'_>, _: &Instruction) {
  let a = pop_or_bail!(cpu);
  let b = pop_or_bail!(cpu);
  cpu.push(a.wrapping_add(b));
}

/// First popped minus second popped.
#[inline]
pub fn sub(cpu: &mut Cpu<'_>, _: &Instruction) {
  let a = pop_or_bail!(cpu);
  let b = pop_or_bail!(cpu);
  cpu.push(a.wrapping_sub(b));
}

#[inline]
pub fn mul(cpu: &mut Cpu<'_>, _: &Instruction) {
  let a = pop_or_bail!(cpu);
  let b = pop_or_bail!(cpu);
  cpu.push(a.wrapping_mul(b));
}

/**
  Second popped modulo first popped, unsigned. The divisor is on top and is checked before
  the dividend is popped, so a zero divisor faults with the dividend still on the stack.
*/
#[inline]
pub fn modulo(cpu: &mut Cpu<'_>, _: &Instruction) {
  let divisor = pop_or_bail!(cpu);
  if divisor == 0 {
    cpu.fault(Fault::DivideByZero);
    return;
  }
  let dividend = pop_or_bail!(cpu);
  cpu.push(dividend % divisor);
}

#[inline]
pub fn rand(cpu: &mut Cpu<'_>, _: &Instruction) {
  let value = cpu.random();
  cpu.push(value);
}

#[inline]
pub fn drop(cpu: &mut Cpu<'_>, _: &Instruction) {
  let _ = pop_or_bail!(cpu);
}

#[inline]
pub fn je(cpu: &mut Cpu<'_>, instruction: &Instruction) {
  let a = pop_or_bail!(cpu);
  if a == 0 {
    cpu.jump(instruction.immediate);
  }
}

#[inline]
pub fn jne(cpu: &mut Cpu<'_>, instruction: &Instruction) {
  let a = pop_or_bail!(cpu);
  if a != 0 {
    cpu.jump(instruction.immediate);
  }
}

#[inline]
pub fn jump(cpu: &mut Cpu<'_>, instruction: &Instruction) {
  cpu.jump(instruction.immediate);
}
