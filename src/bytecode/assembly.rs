/*!
  The human readable textual form of bytecode is called assembly. This module leverages the
  `strum` derives of `Operation` to read and write mnemonics, and `nom` to parse lines.

  One line holds at most one label definition and at most one statement:

  ```text
  # comment, as is anything after ';'
  loop:  Dup         # a label may share its line with a statement
         JNE loop    # a label operand of a jump becomes the relative offset
         Push 0x10   # numbers are decimal or 0x hex, optionally signed
         .word 57005 # a raw word, emitted verbatim
  ```

  A label operand of `Push` pushes the label's address.
*/

use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

use nom::{
  branch::alt,
  bytes::complete::{tag, tag_no_case},
  character::complete::{
    alpha1,
    alphanumeric1,
    char as one_char,
    digit1,
    hex_digit1,
    one_of,
    space0,
    space1
  },
  combinator::{all_consuming, map, map_res, opt, recognize, rest},
  multi::many0_count,
  sequence::{pair, preceded, terminated, tuple},
  IResult
};
use string_cache::DefaultAtom;

use crate::bytecode::{
  decode_at,
  encode_instruction,
  Instruction,
  LoadError,
  Operation,
  Program,
  Word
};
use crate::symboltable::SymbolTable;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssemblyError {
  Syntax{
    line: usize,
    text: String
  },
  NotAnOperation{
    line: usize,
    name: String
  },
  WrongArity{
    line: usize,
    operation: Operation,
    given: usize
  },
  UndefinedLabel{
    line: usize,
    label: String
  },
  DuplicateLabel{
    line: usize,
    label: String
  },
  SharedAddress{
    line: usize,
    label: String,
    other: String,
    address: Word
  },
  ImmediateOutOfRange{
    line: usize,
    value: i64
  },
  Load(LoadError)
}

impl Display for AssemblyError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      AssemblyError::Syntax{line, text} => {
        write!(f, "Error on line {}: cannot parse \"{}\".", line, text)
      }
      AssemblyError::NotAnOperation{line, name} => {
        write!(f, "Error on line {}: {} is not an operation.", line, name)
      }
      AssemblyError::WrongArity{line, operation, given} => {
        write!(f,
          "Error on line {}: {} requires {} operand(s) but was given {}.",
          line, operation, operation.has_immediate() as usize, given
        )
      }
      AssemblyError::UndefinedLabel{line, label} => {
        write!(f, "Error on line {}: label {} is never defined.", line, label)
      }
      AssemblyError::DuplicateLabel{line, label} => {
        write!(f, "Error on line {}: label {} is already defined.", line, label)
      }
      AssemblyError::SharedAddress{line, label, other, address} => {
        write!(f,
          "Error on line {}: label {} names address {}, which is already labeled {}.",
          line, label, address, other
        )
      }
      AssemblyError::ImmediateOutOfRange{line, value} => {
        write!(f, "Error on line {}: {} does not fit in a word.", line, value)
      }
      AssemblyError::Load(error) => {
        write!(f, "{}", error)
      }
    }
  }
}

impl Error for AssemblyError {}

impl From<LoadError> for AssemblyError {
  fn from(error: LoadError) -> Self {
    AssemblyError::Load(error)
  }
}

// region Parsers

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Operand<'a> {
  Number(i64),
  Label(&'a str)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Statement<'a> {
  Instruction{
    mnemonic: &'a str,
    operand: Option<Operand<'a>>
  },
  Data(i64)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Line<'a> {
  label: Option<&'a str>,
  statement: Option<Statement<'a>>
}

fn parse_number(text: &str) -> Result<i64, ParseIntError> {
  let (negative, digits) =
    match text.as_bytes().first() {
      Some(b'-') => (true, &text[1..]),
      Some(b'+') => (false, &text[1..]),
      _          => (false, text)
    };
  let magnitude =
    match digits.get(..2) {
      Some(prefix) if prefix.eq_ignore_ascii_case("0x") => i64::from_str_radix(&digits[2..], 16)?,
      _ => digits.parse::<i64>()?
    };
  Ok(if negative { -magnitude } else { magnitude })
}

fn identifier(input: &str) -> IResult<&str, &str> {
  recognize(
    pair(
      alt((alpha1, tag("_"))),
      many0_count(alt((alphanumeric1, tag("_"))))
    )
  )(input)
}

fn number(input: &str) -> IResult<&str, i64> {
  map_res(
    recognize(
      pair(
        opt(one_of("+-")),
        alt((preceded(tag_no_case("0x"), hex_digit1), digit1))
      )
    ),
    parse_number
  )(input)
}

fn operand(input: &str) -> IResult<&str, Operand<'_>> {
  alt((
    map(number, Operand::Number),
    map(identifier, Operand::Label)
  ))(input)
}

fn statement(input: &str) -> IResult<&str, Statement<'_>> {
  alt((
    map(
      preceded(tag(".word"), preceded(space1, number)),
      Statement::Data
    ),
    map(
      pair(identifier, opt(preceded(space1, operand))),
      |(mnemonic, operand)| Statement::Instruction{ mnemonic, operand }
    )
  ))(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
  preceded(one_of("#;"), rest)(input)
}

fn line(input: &str) -> IResult<&str, Line<'_>> {
  map(
    all_consuming(
      tuple((
        space0,
        opt(terminated(identifier, pair(space0, one_char(':')))),
        space0,
        opt(statement),
        space0,
        opt(comment)
      ))
    ),
    |(_, label, _, statement, _, _)| Line{ label, statement }
  )(input)
}

// endregion

/// A statement whose operand may name a label that is defined further down.
struct Pending<'a> {
  line: usize,
  address: Word,
  statement: Resolved<'a>
}

enum Resolved<'a> {
  Instruction(Operation, Option<Operand<'a>>),
  Data(i64)
}

fn word_from(line: usize, value: i64) -> Result<Word, AssemblyError> {
  match value >= i32::MIN as i64 && value <= Word::MAX as i64 {
    // Negative values are stored as their two's complement bit pattern.
    true  => Ok(value as Word),
    false => Err(AssemblyError::ImmediateOutOfRange{ line, value })
  }
}

/**
  Assembles `text` into a program image. Labels may be used before they are defined, so
  this is two passes: the first lays out addresses and collects labels, the second encodes.
*/
pub fn assemble(text: &str) -> Result<Program, AssemblyError> {
  let mut symbols = SymbolTable::new();
  let mut pending: Vec<Pending> = Vec::new();
  let mut address: Word = 0;

  for (index, source) in text.lines().enumerate() {
    let line_number = index + 1;
    let parsed = match line(source) {
      Ok((_, parsed)) => parsed,
      Err(_) => {
        return Err(AssemblyError::Syntax{ line: line_number, text: source.trim().to_string() });
      }
    };

    if let Some(label) = parsed.label {
      let atom = DefaultAtom::from(label);
      if symbols.get_address(&atom).is_some() {
        return Err(AssemblyError::DuplicateLabel{ line: line_number, label: label.to_string() });
      }
      if let Some(other) = symbols.get_label(address) {
        return Err(AssemblyError::SharedAddress{
          line: line_number,
          label: label.to_string(),
          other: other.to_string(),
          address
        });
      }
      // Both sides were just checked, so this cannot collide.
      let _ = symbols.insert(atom, address);
    }

    let resolved = match parsed.statement {
      None => continue,
      Some(Statement::Data(value)) => Resolved::Data(value),
      Some(Statement::Instruction{ mnemonic, operand }) => {
        let operation = Operation::from_str(mnemonic).map_err(|_| {
          AssemblyError::NotAnOperation{ line: line_number, name: mnemonic.to_string() }
        })?;
        if operation.has_immediate() != operand.is_some() {
          return Err(AssemblyError::WrongArity{
            line: line_number,
            operation,
            given: operand.is_some() as usize
          });
        }
        Resolved::Instruction(operation, operand)
      }
    };

    let length = match &resolved {
      Resolved::Instruction(operation, _) => operation.length(),
      Resolved::Data(_) => 1
    };
    pending.push(Pending{ line: line_number, address, statement: resolved });
    address = address.saturating_add(length);
  }

  let mut words: Vec<Word> = Vec::with_capacity(address as usize);
  for Pending{ line, address, statement } in pending {
    match statement {
      Resolved::Data(value) => words.push(word_from(line, value)?),
      Resolved::Instruction(operation, None) => {
        encode_instruction(&Instruction::nullary(operation)).emit(&mut words);
      }
      Resolved::Instruction(operation, Some(operand)) => {
        let immediate = match operand {
          Operand::Number(value) => word_from(line, value)?,
          Operand::Label(label) => {
            let target = symbols.get_address(&DefaultAtom::from(label)).ok_or_else(|| {
              AssemblyError::UndefinedLabel{ line, label: label.to_string() }
            })?;
            match operation.is_jump() {
              true  => word_from(line, target as i64 - (address as i64 + operation.length() as i64))?,
              false => target
            }
          }
        };
        encode_instruction(&Instruction::with_immediate(operation, immediate as i32)).emit(&mut words);
      }
    }
  }

  Ok(Program::from_words(&words)?)
}

/**
  Renders a program as assembly, up to the last non-zero word. Jump targets that fall on an
  instruction boundary are given labels named after their address. Words that do not
  decode, including an immediate-taking opcode in the last slot of memory, are written as
  `.word`, so that assembling the output reproduces the program.
*/
pub fn disassemble(program: &Program) -> String {
  let extent = program.extent() as Word;

  // First pass: instruction boundaries and jump targets.
  let mut boundaries: HashSet<Word> = HashSet::new();
  let mut targets: Vec<Word> = Vec::new();
  let mut address: Word = 0;
  while address < extent {
    boundaries.insert(address);
    let decoded = decode_at(program, address);
    let instruction = decoded.instruction;
    if decoded.fault.is_none() && instruction.opcode.is_jump() {
      targets.push(address.wrapping_add(instruction.immediate as Word).wrapping_add(instruction.length));
    }
    address += instruction.length;
  }
  // A jump to just past the last instruction is legitimate too.
  boundaries.insert(address);
  let end = address;

  let mut symbols = SymbolTable::new();
  for target in targets {
    if boundaries.contains(&target) && symbols.get_label(target).is_none() {
      let _ = symbols.insert(DefaultAtom::from(format!("L{}", target)), target);
    }
  }

  // Second pass: render.
  let mut text = String::new();
  let mut address: Word = 0;
  while address < end {
    if let Some(label) = symbols.get_label(address) {
      text.push_str(&format!("{}:\n", label));
    }
    let decoded = decode_at(program, address);
    let instruction = decoded.instruction;
    match decoded.fault {
      Some(_) => {
        let word = program.get(address as usize).unwrap_or(0);
        text.push_str(&format!("  .word {}\n", word));
      }
      None if instruction.opcode.is_jump() => {
        let target = address.wrapping_add(instruction.immediate as Word).wrapping_add(instruction.length);
        match symbols.get_label(target) {
          Some(label) => text.push_str(&format!("  {} {}\n", instruction.opcode, label)),
          None        => text.push_str(&format!("  {}\n", instruction))
        }
      }
      None => text.push_str(&format!("  {}\n", instruction))
    }
    address += instruction.length;
  }
  if let Some(label) = symbols.get_label(end) {
    text.push_str(&format!("{}:\n", label));
  }
  text
}
