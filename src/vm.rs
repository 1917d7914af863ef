//! The execution loop: fetch and decode at the program counter, dispatch, advance, and
//! check whether to stop, until the machine leaves `Running` or the step budget is spent.

use std::fmt::{Display, Formatter};
use std::io::{self, Write};

use prettytable::{format as TableFormat, Table};
use rand_core::RngCore;

use crate::bytecode::{Program, Word};
use crate::cpu::{Cpu, CpuState};
use crate::dispatch::{Dispatcher, Strategy};
use crate::entropy::CRand;
use crate::report::Report;
use crate::stack::STACK_CAPACITY;

/// Step limit of a run that should go until it halts or faults.
pub const UNLIMITED: i64 = i64::MAX;

pub struct VM<'a> {
  cpu        : Cpu<'a>,
  dispatcher : Box<dyn Dispatcher>,
}

impl<'a> VM<'a> {

  pub fn new(
      program  : &'a Program,
      strategy : Strategy,
      console  : &'a mut dyn Write,
      entropy  : &'a mut dyn RngCore
    ) -> VM<'a>
  {
    VM {
      cpu: Cpu::new(program, console, entropy),
      dispatcher: strategy.dispatcher(program),
    }
  }

  pub fn cpu(&self) -> &Cpu<'a> {
    &self.cpu
  }

  pub fn strategy(&self) -> Strategy {
    self.dispatcher.strategy()
  }

  /**
    Executes one instruction. A step that faults still counts and still advances the
    program counter, except when decoding itself stopped the machine: then nothing was
    executed and nothing is counted. A machine that has stopped stays as it is.
  */
  pub fn step(&mut self) {
    if !self.cpu.is_running() {
      return;
    }
    let instruction = self.dispatcher.fetch(&mut self.cpu);
    if !self.cpu.is_running() {
      return;
    }

    #[cfg(feature = "trace_computation")]
    println!("{:>5}: {}", self.cpu.pc, instruction);

    self.dispatcher.dispatch(&mut self.cpu, &instruction);
    self.cpu.advance(&instruction);
  }

  /**
    Runs until the machine halts, faults, or has executed `step_limit` steps. A limit of
    zero or less executes nothing.

    Faults are not errors here, they are part of the report. The only error is failing to
    write to the output sink, and it is returned once the run is over.
  */
  pub fn run(&mut self, step_limit: i64) -> io::Result<Report> {
    #[cfg(feature = "trace_computation")]
    println!("{}", self);

    while self.cpu.state == CpuState::Running && self.cpu.steps < step_limit {
      self.step();

      #[cfg(feature = "trace_computation")]
      println!("{}", self);
    }

    match self.cpu.take_io_error() {
      Some(error) => Err(error),
      None        => Ok(Report::new(&self.cpu, step_limit))
    }
  }

  // region Display methods

  fn make_register_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);
    table.add_row(row![r->"PC =", format!("{:#x}", self.cpu.pc)]);
    table.add_row(row![r->"SP =", self.cpu.sp()]);
    table.add_row(row![r->"State =", self.cpu.state]);
    table.add_row(row![r->"Steps =", self.cpu.steps]);
    table
  }

  fn make_stack_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    let top = self.cpu.sp();
    for (depth, value) in self.cpu.stack().iter_top_down().enumerate() {
      let index = top - depth as i32;
      match depth == 0 {

        true  => {
          table.add_row(
            row![r->format!("* --> S[{}] =", index), format_word(value)]
          );
        }

        false => {
          table.add_row(
            row![r->format!("S[{}] =", index), format_word(value)]
          );
        }

      } // end match on top of stack
    } // end for
    table
  }

  // endregion
}

fn format_word(value: Word) -> String {
  format!("{:#010x} ({})", value, value as i32)
}

/**
  Runs `program` to completion, or for `step_limit` steps, under `strategy`. The `Rand`
  instruction draws from a fresh `CRand`, so two runs of the same program agree.
*/
pub fn run_program(
    program    : &Program,
    strategy   : Strategy,
    step_limit : i64,
    console    : &mut dyn Write
  ) -> io::Result<Report>
{
  let mut entropy = CRand::default();
  let mut vm = VM::new(program, strategy, console, &mut entropy);
  vm.run(step_limit)
}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl<'a> Display for VM<'a> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let register_table = self.make_register_table();
    let stack_table    = self.make_stack_table();

    let mut combined_table = table!([register_table, stack_table]);

    combined_table.set_titles(
      row![ub->"Registers", ub->format!("Stack ({} of {})", self.cpu.stack().len(), STACK_CAPACITY)]
    );
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "Dispatch: {}\n{}", self.strategy(), combined_table)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::Operation::{self, *};
  use crate::bytecode::PROGRAM_SIZE;
  use strum::IntoEnumIterator;

  fn op(operation: Operation) -> Word {
    operation.code()
  }

  fn imm(value: i32) -> Word {
    value as Word
  }

  /// Runs under every strategy, checks they agree, and returns the common outcome.
  fn run(words: &[Word], step_limit: i64) -> (Report, String) {
    let program = Program::from_words(words).unwrap();
    let mut outcomes = Strategy::iter().map(|strategy| {
      let mut out: Vec<u8> = vec![];
      let report = run_program(&program, strategy, step_limit, &mut out).unwrap();
      (report, String::from_utf8(out).unwrap())
    });
    let first = outcomes.next().unwrap();
    for other in outcomes {
      assert_eq!(first, other);
    }
    first
  }

  #[test]
  fn halt_only() {
    let (report, out) = run(&[op(Halt)], UNLIMITED);
    assert_eq!(report.state, CpuState::Halted);
    assert_eq!(report.steps, 1);
    assert_eq!(report.pc, 1);
    assert!(report.is_success());
    assert!(out.is_empty());
  }

  #[test]
  fn undefined_first_word() {
    let (report, out) = run(&[0xDEAD], UNLIMITED);
    assert_eq!(report.state, CpuState::Break);
    assert_eq!(report.steps, 1);
    assert_eq!(report.pc, 1);
    assert!(!report.is_success());
    assert_eq!(out, "Undefined opcode 57005\n");
  }

  #[test]
  fn factorial_of_five() {
    let (report, out) = run(&[
      op(Push), 5,
      op(Push), 1,
      op(Swap),
      // loop:
      op(Swap),
      op(Over),
      op(Mul),
      op(Swap),
      op(Dec),
      op(Dup),
      op(JNE), imm(-8),
      op(Swap),
      op(Print),
      op(Halt),
    ], UNLIMITED);
    assert_eq!(out, "[120]\n");
    assert_eq!(report.state, CpuState::Halted);
    assert_eq!(report.steps, 3 + 5 * 7 + 3);
    assert_eq!(report.stack, vec![0]);
  }

  #[test]
  fn division_by_zero() {
    let (report, out) = run(&[op(Push), 10, op(Push), 0, op(Mod), op(Halt)], UNLIMITED);
    assert_eq!(report.state, CpuState::Break);
    assert_eq!(report.steps, 3);
    assert_eq!(report.stack, vec![10]);
    assert_eq!(report.pc, 5);
    assert_eq!(out, "Division by zero\n");
  }

  #[test]
  fn jump_lands_past_offset_plus_length() {
    let mut words = vec![op(Nop); 20];
    words[4] = op(Jump);
    words[5] = imm(7);
    words[13] = op(Halt);
    let program = Program::from_words(&words).unwrap();

    let mut out: Vec<u8> = vec![];
    let mut rng = CRand::default();
    let mut vm = VM::new(&program, Strategy::Switched, &mut out, &mut rng);
    for _ in 0..4 {
      vm.step();
    }
    assert_eq!(vm.cpu().pc, 4);
    vm.step();
    assert_eq!(vm.cpu().pc, 4 + 7 + 2);
    vm.step();
    assert_eq!(vm.cpu().state, CpuState::Halted);
  }

  #[test]
  fn backward_jump() {
    let (report, _) = run(&[op(Nop), op(Nop), op(Jump), imm(-4)], 7);
    // 0, 1, 2 -> 0, 1, 2 -> 0
    assert_eq!(report.pc, 1);
    assert_eq!(report.state, CpuState::Running);
    assert!(report.is_success());
  }

  #[test]
  fn steps_count_faulting_instructions() {
    let (report, out) = run(&[op(Nop), op(Drop)], UNLIMITED);
    assert_eq!(report.steps, 2);
    assert_eq!(report.state, CpuState::Break);
    assert_eq!(report.pc, 2);
    assert_eq!(out, "Stack underflow\n");
  }

  #[test]
  fn step_limit_exhausted_is_success() {
    let (report, out) = run(&[op(Push), 1, op(Print), op(Jump), imm(-5)], 9);
    assert_eq!(report.steps, 9);
    assert_eq!(report.state, CpuState::Running);
    assert!(report.is_success());
    assert_eq!(out, "[1]\n[1]\n[1]\n");
  }

  #[test]
  fn step_limit_of_zero_runs_nothing() {
    let (report, _) = run(&[op(Halt)], 0);
    assert_eq!(report.steps, 0);
    assert_eq!(report.state, CpuState::Running);
    assert!(report.is_success());
  }

  #[test]
  fn running_off_the_end() {
    let mut words = vec![op(Nop); PROGRAM_SIZE];
    words[0] = op(Jump);
    words[1] = imm(PROGRAM_SIZE as i32);
    let (report, out) = run(&words, UNLIMITED);
    assert_eq!(report.steps, 1);
    assert_eq!(report.pc, PROGRAM_SIZE as Word + 2);
    assert_eq!(report.state, CpuState::Break);
    assert_eq!(out, "PC out of bounds\n");
  }

  #[test]
  fn truncated_immediate_breaks_through_handler() {
    let mut words = vec![op(Nop); PROGRAM_SIZE];
    words[PROGRAM_SIZE - 1] = op(Push);
    let (report, out) = run(&words, UNLIMITED);
    assert_eq!(report.steps, PROGRAM_SIZE as i64);
    assert_eq!(report.pc, PROGRAM_SIZE as Word);
    assert_eq!(report.state, CpuState::Break);
    assert_eq!(out, "PC+1 out of bounds\n");
  }

  #[test]
  fn overflow() {
    let mut words = vec![];
    for _ in 0..=STACK_CAPACITY {
      words.push(op(Rand));
    }
    let (report, out) = run(&words, UNLIMITED);
    assert_eq!(report.state, CpuState::Break);
    assert_eq!(report.steps, STACK_CAPACITY as i64 + 1);
    assert_eq!(report.sp, STACK_CAPACITY as i32 - 1);
    assert_eq!(out, "Stack overflow\n");
  }

  #[test]
  fn stepping_a_stopped_machine_does_nothing() {
    let mut words = vec![op(Nop); PROGRAM_SIZE];
    words[PROGRAM_SIZE - 1] = op(Halt);
    let program = Program::from_words(&words).unwrap();

    for strategy in Strategy::iter() {
      let mut out: Vec<u8> = vec![];
      let mut rng = CRand::default();
      let mut vm = VM::new(&program, strategy, &mut out, &mut rng);
      let report = vm.run(UNLIMITED).unwrap();
      assert_eq!(report.state, CpuState::Halted);
      assert_eq!(vm.cpu().pc, PROGRAM_SIZE as Word);

      vm.step();
      assert_eq!(vm.cpu().state, CpuState::Halted);
      assert_eq!(vm.cpu().steps, PROGRAM_SIZE as i64);
      std::mem::drop(vm);
      assert!(out.is_empty());
    }
  }

  struct BrokenPipe;

  impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
      Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  #[test]
  fn write_failure_is_returned_after_the_run() {
    let program = Program::from_words(&[op(Push), 1, op(Print), op(Halt)]).unwrap();
    let mut out = BrokenPipe;
    let mut rng = CRand::default();
    let mut vm = VM::new(&program, Strategy::Switched, &mut out, &mut rng);

    let error = vm.run(UNLIMITED).unwrap_err();
    assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
    assert_eq!(vm.cpu().state, CpuState::Halted);
    assert_eq!(vm.cpu().steps, 3);
  }

  #[test]
  fn display_shows_registers_and_stack() {
    let program = Program::from_words(&[op(Push), 42, op(Halt)]).unwrap();
    let mut out: Vec<u8> = vec![];
    let mut rng = CRand::default();
    let mut vm = VM::new(&program, Strategy::Threaded, &mut out, &mut rng);
    vm.step();
    let text = vm.to_string();
    assert!(text.starts_with("Dispatch: threaded"));
    assert!(text.contains("Registers"));
    assert!(text.contains("* --> S[0] ="));
    assert!(text.contains("0x0000002a (42)"));
  }
}
