use stackvm::bytecode::{Operation, Program, Word, PROGRAM_SIZE};
use stackvm::programs::Sample;
use stackvm::{assemble, disassemble, run_program, CpuState, Report, Strategy};
use strum::IntoEnumIterator;

fn run_collecting_output(program: &Program, strategy: Strategy, step_limit: i64) -> (Vec<String>, Report) {
  let mut buf: Vec<u8> = vec![];
  let report = run_program(program, strategy, step_limit, &mut buf).expect("No IO Error");
  let output = String::from_utf8(buf).expect("Good Conversion");
  (output.lines().map(|line| line.to_string()).collect(), report)
}

fn assert_equivalent(program: &Program, step_limit: i64) -> (Vec<String>, Report) {
  let mut strategies = Strategy::iter();
  let first = strategies.next().expect("At least one strategy");
  let expected = run_collecting_output(program, first, step_limit);
  for strategy in strategies {
    assert_eq!(
      expected,
      run_collecting_output(program, strategy, step_limit),
      "{} and {} disagree", first, strategy
    );
  }
  expected
}

#[test]
fn built_in_samples() {
  for sample in Sample::iter() {
    let program = sample.program().expect("Sample fits");
    assert_equivalent(&program, 50_000);
  }
}

#[test]
fn step_limits_cut_every_strategy_at_the_same_point() {
  let program = Sample::Primes.program().expect("Sample fits");
  for step_limit in [0, 1, 2, 3, 17, 100, 1001] {
    let (_, report) = assert_equivalent(&program, step_limit);
    assert_eq!(report.steps, step_limit.max(0));
    assert_eq!(report.state, CpuState::Running);
  }
}

#[test]
fn factorial_prints_once() {
  let program = assemble("
    Push 5
    Push 1
    Swap
  loop:
    Swap
    Over
    Mul
    Swap
    Dec
    Dup
    JNE loop
    Swap
    Print
    Halt
  ").expect("Assembles");
  let (lines, report) = assert_equivalent(&program, i64::MAX);
  assert_eq!(lines, ["[120]"]);
  assert_eq!(report.state, CpuState::Halted);
  assert!(report.is_success());
}

#[test]
fn every_single_word_program() {
  // Any one word followed by `Halt`, including opcodes whose immediate is that `Halt`.
  let halt = Operation::Halt.code();
  for word in (0..OPERATION_WORDS).chain([0xDEAD, Word::MAX]) {
    let program = Program::from_words(&[word, halt]).expect("Fits");
    assert_equivalent(&program, 1000);
  }
}

const OPERATION_WORDS: Word = 24;

/// A xorshift generator, so that the word soup below is the same on every run.
fn scramble(state: &mut u32) -> u32 {
  *state ^= *state << 13;
  *state ^= *state >> 17;
  *state ^= *state << 5;
  *state
}

#[test]
fn random_programs() {
  let mut state = 0x2545_f491;
  for _ in 0..200 {
    let words: Vec<Word> =
      (0..PROGRAM_SIZE)
        .map(|_| {
          let roll = scramble(&mut state);
          match roll % 8 {
            // Mostly opcodes, with small immediates mixed in.
            0 => roll % 7,
            1 => (roll as i32 >> 28) as Word,
            _ => (roll >> 8) % OPERATION_WORDS
          }
        })
        .collect();
    let program = Program::from_words(&words).expect("Fits");
    assert_equivalent(&program, 5_000);
  }
}

#[test]
fn disassembly_round_trips_samples() {
  for sample in Sample::iter() {
    let program = sample.program().expect("Sample fits");
    let text = disassemble(&program);
    assert_eq!(assemble(&text).expect("Disassembly assembles"), program, "{}", sample);
  }
}
