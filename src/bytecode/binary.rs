/*!
  This module is responsible for the encoding and decoding of binary instructions, and for
  the fixed-size program image they live in.

*/
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::{Instruction, Operation};
use crate::cpu::Cpu;
use crate::fault::Fault;

// If you change this you must also change `encode_instruction` and `decode_at`.
pub type Word = u32;

/// Number of word slots in program memory.
pub const PROGRAM_SIZE: usize = 512;

// Convenience for the two words of an instruction with an immediate:
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TwoWords {
  pub opcode: Word,
  pub immediate: Word
}

/// An `Either` type for an encoded instruction, allowing the instruction to be
/// either one word or two.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EncodedInstruction{
  Word(Word),
  DoubleWord(TwoWords)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LoadError {
  ProgramTooLarge{ words: usize }
}

impl Display for LoadError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      LoadError::ProgramTooLarge{ words } => {
        write!(f, "program has {} words but memory holds {}", words, PROGRAM_SIZE)
      }
    }
  }
}

impl Error for LoadError {}

/**
  The program image: `PROGRAM_SIZE` words of opcodes and immediates. A run borrows it
  immutably for its whole duration.
*/
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Program {
  words: Box<[Word; PROGRAM_SIZE]>
}

impl Program {
  /// Loads `words` at address zero. Unused slots are zero, i.e. `Break`.
  pub fn from_words(words: &[Word]) -> Result<Program, LoadError> {
    if words.len() > PROGRAM_SIZE {
      return Err(LoadError::ProgramTooLarge{ words: words.len() });
    }
    let mut memory = Box::new([0 as Word; PROGRAM_SIZE]);
    memory[..words.len()].copy_from_slice(words);
    Ok(Program{ words: memory })
  }

  pub fn words(&self) -> &[Word] {
    &self.words[..]
  }

  pub fn get(&self, address: usize) -> Option<Word> {
    self.words.get(address).copied()
  }

  /// One past the last non-zero word; everything from here on is `Break` padding.
  pub fn extent(&self) -> usize {
    self.words
        .iter()
        .rposition(|word| *word != 0)
        .map_or(0, |last| last + 1)
  }
}

/// The result of decoding the word(s) at one address, before any machine state is touched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Decoded {
  pub instruction: Instruction,
  pub fault: Option<Fault>
}

impl Decoded {
  fn clean(instruction: Instruction) -> Decoded {
    Decoded{ instruction, fault: None }
  }

  fn faulted(fault: Fault) -> Decoded {
    Decoded{ instruction: Instruction::BREAK, fault: Some(fault) }
  }
}

/**
  Decodes the instruction at `pc` without side effects. Every fault decodes as a 1-word
  `Break`; the fault itself is returned alongside so the caller can report it.
*/
pub fn decode_at(program: &Program, pc: Word) -> Decoded {
  let pc = pc as usize;
  let word = match program.get(pc) {
    Some(word) => word,
    None       => return Decoded::faulted(Fault::ProgramCounterOutOfBounds)
  };

  let opcode = match Operation::from_word(word) {
    Some(opcode) => opcode,
    None         => return Decoded::faulted(Fault::UndefinedOpcode(word))
  };

  if !opcode.has_immediate() {
    return Decoded::clean(Instruction::nullary(opcode));
  }

  match program.get(pc + 1) {
    // Sign-extended: jump offsets may be negative.
    Some(immediate) => Decoded::clean(Instruction::with_immediate(opcode, immediate as i32)),
    None            => Decoded::faulted(Fault::TruncatedInstruction)
  }
}

/**
  Fetches and decodes the instruction at the CPU's program counter, reporting any fault.

  Only a program counter past the end of memory moves the CPU to `Break` here. A truncated
  or undefined instruction is reported and then handed on as an ordinary `Break`, whose
  handler sets the state like any other.
*/
pub fn fetch_decode(cpu: &mut Cpu<'_>) -> Instruction {
  let decoded = decode_at(cpu.program(), cpu.pc);
  match decoded.fault {
    None                                    => {}
    Some(Fault::ProgramCounterOutOfBounds)  => cpu.fault(Fault::ProgramCounterOutOfBounds),
    Some(fault)                             => cpu.diagnose(fault)
  }
  decoded.instruction
}

/**
  Encodes the instruction into bytecode. The immediate is stored as its two's complement
  bit pattern.
*/
pub fn encode_instruction(instruction: &Instruction) -> EncodedInstruction {
  match instruction.opcode.has_immediate() {
    true  => EncodedInstruction::DoubleWord(
      TwoWords{
        opcode: instruction.opcode.code(),
        immediate: instruction.immediate as Word
      }
    ),
    false => EncodedInstruction::Word(instruction.opcode.code())
  }
}

impl EncodedInstruction {
  pub fn emit(&self, code: &mut Vec<Word>) {
    match self {
      EncodedInstruction::Word(word) => code.push(*word),
      EncodedInstruction::DoubleWord(words) => {
        code.push(words.opcode);
        code.push(words.immediate);
      }
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::cpu::CpuState;
  use crate::entropy::CRand;

  fn program(words: &[Word]) -> Program {
    Program::from_words(words).unwrap()
  }

  #[test]
  fn load_pads_with_break() {
    let p = program(&[Operation::Halt.code()]);
    assert_eq!(p.words().len(), PROGRAM_SIZE);
    assert_eq!(p.get(0), Some(2));
    assert_eq!(p.get(1), Some(0));
    assert_eq!(p.get(PROGRAM_SIZE), None);
    assert_eq!(p.extent(), 1);
    assert_eq!(program(&[]).extent(), 0);
  }

  #[test]
  fn load_too_large() {
    let words = vec![1; PROGRAM_SIZE + 1];
    assert_eq!(
      Program::from_words(&words),
      Err(LoadError::ProgramTooLarge{ words: PROGRAM_SIZE + 1 })
    );
    assert!(Program::from_words(&words[1..]).is_ok());
  }

  #[test]
  fn decode_immediate_is_sign_extended() {
    let p = program(&[Operation::Jump.code(), (-15i32) as Word]);
    let decoded = decode_at(&p, 0);
    assert_eq!(decoded.fault, None);
    assert_eq!(decoded.instruction, Instruction::with_immediate(Operation::Jump, -15));
  }

  #[test]
  fn decode_undefined_opcode() {
    let p = program(&[77]);
    let decoded = decode_at(&p, 0);
    assert_eq!(decoded.instruction, Instruction::BREAK);
    assert_eq!(decoded.fault, Some(Fault::UndefinedOpcode(77)));
  }

  #[test]
  fn decode_truncated_immediate() {
    let mut words = vec![Operation::Nop.code(); PROGRAM_SIZE];
    words[PROGRAM_SIZE - 1] = Operation::Push.code();
    let p = program(&words);
    let decoded = decode_at(&p, (PROGRAM_SIZE - 1) as Word);
    assert_eq!(decoded.instruction, Instruction::BREAK);
    assert_eq!(decoded.fault, Some(Fault::TruncatedInstruction));
  }

  #[test]
  fn fetch_past_end_breaks() {
    let p = program(&[]);
    let mut out: Vec<u8> = vec![];
    let mut rng = CRand::default();
    let mut cpu = Cpu::new(&p, &mut out, &mut rng);
    cpu.pc = PROGRAM_SIZE as Word;

    assert_eq!(fetch_decode(&mut cpu), Instruction::BREAK);
    assert_eq!(cpu.state, CpuState::Break);
    drop(cpu);
    assert_eq!(String::from_utf8(out).unwrap(), "PC out of bounds\n");
  }

  #[test]
  fn fetch_truncated_reports_without_breaking() {
    let mut words = vec![Operation::Nop.code(); PROGRAM_SIZE];
    words[PROGRAM_SIZE - 1] = Operation::JE.code();
    let p = program(&words);
    let mut out: Vec<u8> = vec![];
    let mut rng = CRand::default();
    let mut cpu = Cpu::new(&p, &mut out, &mut rng);
    cpu.pc = (PROGRAM_SIZE - 1) as Word;

    assert_eq!(fetch_decode(&mut cpu), Instruction::BREAK);
    assert_eq!(cpu.state, CpuState::Running);
    drop(cpu);
    assert_eq!(String::from_utf8(out).unwrap(), "PC+1 out of bounds\n");
  }

  #[test]
  fn encode() {
    let mut code = vec![];
    encode_instruction(&Instruction::with_immediate(Operation::JNE, -8)).emit(&mut code);
    encode_instruction(&Instruction::nullary(Operation::Print)).emit(&mut code);
    assert_eq!(code, vec![5, 0xFFFF_FFF8, 4]);
  }
}
