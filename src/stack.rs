/*!
  The operand stack: a fixed array of `STACK_CAPACITY` words and a signed index of the top
  element, `-1` when empty. `push` and `pop` are the only ways to change it. Neither grows
  nor shrinks anything past the bounds; both report the violation instead and leave the
  stack exactly as it was.
*/

use crate::bytecode::Word;
use crate::fault::Fault;

pub const STACK_CAPACITY: usize = 32;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperandStack {
  cells : [Word; STACK_CAPACITY],
  sp    : i32,
}

impl OperandStack {
  pub fn new() -> OperandStack {
    OperandStack {
      cells: [0; STACK_CAPACITY],
      sp: -1,
    }
  }

  /// Index of the top element, `-1` if the stack is empty.
  pub fn sp(&self) -> i32 {
    self.sp
  }

  pub fn len(&self) -> usize {
    (self.sp + 1) as usize
  }

  pub fn is_empty(&self) -> bool {
    self.sp < 0
  }

  pub fn is_full(&self) -> bool {
    self.sp >= STACK_CAPACITY as i32 - 1
  }

  pub fn push(&mut self, value: Word) -> Result<(), Fault> {
    if self.is_full() {
      return Err(Fault::StackOverflow);
    }
    self.sp += 1;
    self.cells[self.sp as usize] = value;
    Ok(())
  }

  pub fn pop(&mut self) -> Result<Word, Fault> {
    if self.is_empty() {
      return Err(Fault::StackUnderflow);
    }
    let value = self.cells[self.sp as usize];
    self.sp -= 1;
    Ok(value)
  }

  /// The live elements, top of stack first.
  pub fn iter_top_down(&self) -> impl Iterator<Item = Word> + '_ {
    self.cells[..self.len()].iter().rev().copied()
  }
}

impl Default for OperandStack {
  fn default() -> Self {
    OperandStack::new()
  }
}
