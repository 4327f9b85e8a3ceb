//! A bounded Brainfuck interpreter library.
//!
//! Programs run on a fixed tape of 65,536 byte cells with a single data
//! pointer and a fixed-capacity stack of entered loops.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0; the data pointer wraps at both ends.
//! - Cell arithmetic wraps modulo 256.
//! - Loops are entered by pushing the position of `[`; `]` jumps back to the
//!   stack top while the cell is non-zero and pops once it reaches zero.
//! - A `[` on a zero cell skips forward past its matching `]`, counting nested
//!   pairs. Running off the end of the program is an unmatched bracket error.
//! - Nesting deeper than 4,096 entered loops is a loop stack overflow.
//! - Input `,` reads a single byte; on EOF the cell is set to 0 by default
//!   (see [`EofPolicy`]).
//! - Output `.` writes the current cell as a raw byte.
//! - Programs are limited to [`MAX_CODESIZE`] bytes and end at the first NUL
//!   byte or the end of the buffer. Any other byte is a no-op.
//!
//! Quick start:
//!
//! ```no_run
//! use bfi::{Interpreter, Program};
//!
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.";
//! let program = Program::try_from(code).expect("program fits");
//! let mut bf = Interpreter::new(std::io::stdin(), std::io::stdout());
//! bf.run(&program).expect("program should run");
//! ```

pub mod cli_util;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod machine;
pub mod program;

pub use error::{BracketKind, ExitStatus, InterpreterError};
pub use interpreter::{Action, EofPolicy, Interpreter, Step, run};
pub use machine::{LoopStack, Machine, Tape};
pub use program::Program;

/// Largest accepted program, in bytes.
pub const MAX_CODESIZE: usize = 32768;

/// Number of cells on the data tape.
pub const TAPE_SIZE: usize = 65536;

/// Maximum number of simultaneously entered loops.
pub const STACK_CAPACITY: usize = 4096;

/// Byte marking the logical end of a program.
pub const TERMINATOR: u8 = 0;
