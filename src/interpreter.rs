use std::io::{self, ErrorKind, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::error::{BracketKind, ExitStatus, InterpreterError};
use crate::machine::Machine;
use crate::program::Program;

/// What `,` stores in the current cell once the input stream is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// Store 0.
    #[default]
    Zero,
    /// Leave the cell as it was.
    Unchanged,
}

/// The effect a single executed instruction had.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Moved { to: usize },
    Incremented { to: u8 },
    Decremented { to: u8 },
    Output(u8),
    Input(u8),
    InputEof,
    /// Cell was 0 at `[`; execution continues after the `]` at `to`.
    SkipForward { to: usize },
    EnterLoop { depth: usize },
    /// Cell was non-zero at `]`; execution continues after the `[` at `to`.
    JumpBack { to: usize },
    ExitLoop { depth: usize },
    NoOp,
}

/// One executed instruction, as reported to a step observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub step: u64,
    pub ip: usize,
    pub instr: u8,
    /// Data pointer before the instruction ran.
    pub ptr: usize,
    /// Current cell before the instruction ran.
    pub cell_before: u8,
    pub action: Action,
}

type StepObserver = Box<dyn FnMut(&Step)>;

/// The interpreter engine: a machine, an input stream and an output stream.
pub struct Interpreter<R, W> {
    machine: Machine,
    input: R,
    output: W,
    eof: EofPolicy,
    interrupt: Option<Arc<AtomicBool>>,
    observer: Option<StepObserver>,
}

impl<R: Read, W: Write> Interpreter<R, W> {
    /// Create an interpreter with a fresh machine.
    pub fn new(input: R, output: W) -> Self {
        Self::with_machine(Machine::new(), input, output)
    }

    /// Create an interpreter around a caller-prepared machine.
    pub fn with_machine(machine: Machine, input: R, output: W) -> Self {
        Self {
            machine,
            input,
            output,
            eof: EofPolicy::default(),
            interrupt: None,
            observer: None,
        }
    }

    pub fn set_eof_policy(&mut self, eof: EofPolicy) {
        self.eof = eof;
    }

    /// Provide a flag that stops the run before the next instruction once set.
    pub fn set_interrupt(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = Some(flag);
    }

    /// Provide a callback invoked after every executed instruction.
    pub fn set_step_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&Step) + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Tear the interpreter down into its machine and streams.
    pub fn into_parts(self) -> (Machine, R, W) {
        (self.machine, self.input, self.output)
    }

    /// Execute `program` until its logical end or a fatal error.
    ///
    /// The loop stack starts empty; the tape is used as it currently stands.
    /// Pending output is flushed before returning, whatever the outcome.
    pub fn run(&mut self, program: &Program) -> Result<(), InterpreterError> {
        self.machine.loops.clear();
        debug!(len = program.len(), eof = ?self.eof, "starting execution");

        let result = self.execute(program.instructions());
        let flushed = self.output.flush();

        let steps = result?;
        flushed.map_err(|source| InterpreterError::Io {
            ip: program.len(),
            source,
        })?;
        debug!(steps, "execution finished");
        Ok(())
    }

    fn execute(&mut self, code: &[u8]) -> Result<u64, InterpreterError> {
        let mut ip = 0usize;
        let mut step: u64 = 0;

        while let Some(&instr) = code.get(ip) {
            if let Some(flag) = self.interrupt.as_ref() {
                if flag.load(Ordering::Relaxed) {
                    return Err(InterpreterError::Interrupted { ip });
                }
            }

            let start = ip;
            let ptr = self.machine.tape.pointer();
            let cell_before = self.machine.tape.get();

            let action = match instr {
                b'>' => {
                    self.machine.tape.move_right();
                    Action::Moved { to: self.machine.tape.pointer() }
                }
                b'<' => {
                    self.machine.tape.move_left();
                    Action::Moved { to: self.machine.tape.pointer() }
                }
                b'+' => {
                    self.machine.tape.increment();
                    Action::Incremented { to: self.machine.tape.get() }
                }
                b'-' => {
                    self.machine.tape.decrement();
                    Action::Decremented { to: self.machine.tape.get() }
                }
                b'.' => {
                    self.output
                        .write_all(&[cell_before])
                        .map_err(|source| InterpreterError::Io { ip, source })?;
                    Action::Output(cell_before)
                }
                b',' => match self.read_byte().map_err(|source| InterpreterError::Io { ip, source })? {
                    Some(byte) => {
                        self.machine.tape.set(byte);
                        Action::Input(byte)
                    }
                    None => {
                        if self.eof == EofPolicy::Zero {
                            self.machine.tape.set(0);
                        }
                        Action::InputEof
                    }
                },
                b'[' => {
                    if cell_before == 0 {
                        ip = skip_forward(code, ip)?;
                        Action::SkipForward { to: ip }
                    } else {
                        self.machine.loops.push(ip)?;
                        trace!(ip, depth = self.machine.loops.depth(), "entered loop");
                        Action::EnterLoop { depth: self.machine.loops.depth() }
                    }
                }
                b']' => {
                    if cell_before != 0 {
                        ip = self.machine.loops.top().ok_or(InterpreterError::UnbalancedBracket {
                            ip,
                            kind: BracketKind::Close,
                        })?;
                        Action::JumpBack { to: ip }
                    } else {
                        let depth = self.machine.loops.depth();
                        let open = self.machine.loops.pop().ok_or(InterpreterError::UnbalancedBracket {
                            ip,
                            kind: BracketKind::Close,
                        })?;
                        trace!(ip, open, depth, "exited loop");
                        Action::ExitLoop { depth: depth - 1 }
                    }
                }
                _ => Action::NoOp,
            };

            if let Some(observer) = self.observer.as_mut() {
                (observer)(&Step {
                    step,
                    ip: start,
                    instr,
                    ptr,
                    cell_before,
                    action,
                });
            }

            step += 1;
            ip += 1;
        }

        Ok(step)
    }

    /// Read one byte, flushing pending output first so prompts are visible.
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.output.flush()?;
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Find the `]` matching the `[` at `open`, counting nested pairs.
///
/// The scan never leaves `code`; running off the end is an unmatched `[`.
fn skip_forward(code: &[u8], open: usize) -> Result<usize, InterpreterError> {
    let mut depth = 1usize;
    for (offset, &b) in code[open + 1..].iter().enumerate() {
        match b {
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + 1 + offset);
                }
            }
            _ => {}
        }
    }
    Err(InterpreterError::UnbalancedBracket {
        ip: open,
        kind: BracketKind::Open,
    })
}

/// Run `program` on a fresh machine and report a process-style status.
pub fn run<R: Read, W: Write>(program: &Program, input: R, output: W) -> ExitStatus {
    let mut interpreter = Interpreter::new(input, output);
    ExitStatus::from(&interpreter.run(program))
}
