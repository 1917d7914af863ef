/*!

  The VM uses a 32 bit word size. Program memory is a fixed array of `PROGRAM_SIZE` words,
  and instructions are either one word (opcode only) or two words (opcode followed by a
  32 bit immediate). The immediate is signed where it matters, namely for jump offsets,
  which are relative to the address *after* the jump has been applied and the instruction
  length added, i.e. a taken jump at `P` with offset `I` lands on `P + I + 2`.

  As with the opcode of an instruction, the opcode word is nothing more than the
  discriminant of `Operation`. Words that are not a discriminant are not rejected at load
  time. They decode as `Break`, which keeps the machine total: every word in memory means
  something.

*/

mod binary;
mod instruction;
mod assembly;

pub use binary::{encode_instruction, decode_at, fetch_decode, Decoded, EncodedInstruction,
                 LoadError, Program, TwoWords, Word, PROGRAM_SIZE};
pub use instruction::{Instruction, Operation, OPCODE_COUNT};
pub use assembly::{assemble, disassemble, AssemblyError};
