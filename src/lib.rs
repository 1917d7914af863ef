/*!
  A small stack machine whose instruction dispatch can be switched between a `match`, a
  table of service routines indexed by opcode, and a table of service routines indexed by
  program address. The three strategies run the same handlers and must be observably
  identical; only their speed differs.

  Build with the `trace_computation` feature to print the machine state after every step.
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod bytecode;
pub mod config;
pub mod cpu;
pub mod dispatch;
pub mod entropy;
pub mod fault;
pub mod programs;
pub mod report;
pub mod stack;
pub mod symboltable;
pub mod vm;

pub use bytecode::{assemble, disassemble, Program, Word};
pub use cpu::CpuState;
pub use dispatch::Strategy;
pub use report::Report;
pub use vm::{run_program, VM};
