use std::fmt::Write as _;
use std::io::{self, Write};

use crate::interpreter::{Action, Step};
use crate::InterpreterError;

/// Bytes shown on each side of the failing instruction.
const WINDOW: usize = 32;

/// Pretty-print an [`InterpreterError`] with caret positioning.
/// If `program` is `Some("bf")`, messages are prefixed with "bf: ...".
pub fn print_interpreter_error(program: Option<&str>, code: &[u8], err: &InterpreterError) {
    eprint!("{}", render_error(program, code, err));
    let _ = io::stderr().flush();
}

pub fn render_error(program: Option<&str>, code: &[u8], err: &InterpreterError) -> String {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    match err {
        InterpreterError::UnbalancedBracket { ip, kind } => {
            let msg = prefix_program(&format!("Runtime error: unmatched bracket {kind}"));
            error_with_context(&msg, code, *ip)
        }
        InterpreterError::ControlStackOverflow { ip, capacity } => {
            let msg = prefix_program(&format!(
                "Runtime error: loop nesting exceeds {capacity} entered loops"
            ));
            error_with_context(&msg, code, *ip)
        }
        InterpreterError::Io { ip, source } => {
            let msg = prefix_program(&format!("I/O error: {source}"));
            error_with_context(&msg, code, *ip)
        }
        InterpreterError::Interrupted { ip } => {
            prefix_program(&format!("Execution aborted: interrupted at instruction {ip}\n"))
        }
        other => prefix_program(&format!("{other}\n")),
    }
}

/// A message line followed by a window of the program and a caret under `pos`.
///
/// Bytes outside printable ASCII are shown as `.` so the caret stays aligned.
fn error_with_context(prefix: &str, code: &[u8], pos: usize) -> String {
    let mut out = format!("{prefix} at instruction {pos}\n");

    let start = pos.saturating_sub(WINDOW);
    let end = (pos + WINDOW + 1).min(code.len());
    if start >= end {
        return out;
    }

    let slice: String = code[start..end]
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect();
    let _ = writeln!(out, "  {slice}");
    let _ = writeln!(out, "  {}^", " ".repeat(pos - start));
    out
}

pub const STEP_TABLE_HEADER: &str = "STEP | IP    | PTR   | CELL | INSTR | ACTION\n\
     -----+-------+-------+------+-------+------------------------------------------------";

/// One row of the `--debug` step table.
pub fn format_step_row(step: &Step) -> String {
    let instr = if step.instr.is_ascii_graphic() { step.instr as char } else { '?' };
    format!(
        "{:<4} | {:<5} | {:<5} | {:<4} |  {}    | {}",
        step.step,
        step.ip,
        step.ptr,
        step.cell_before,
        instr,
        describe(step)
    )
}

fn describe(step: &Step) -> String {
    match step.action {
        Action::Moved { to } => format!("Moved pointer head to index {to}"),
        Action::Incremented { to } => {
            format!("Increment cell[{}] from {} to {}", step.ptr, step.cell_before, to)
        }
        Action::Decremented { to } => {
            format!("Decrement cell[{}] from {} to {}", step.ptr, step.cell_before, to)
        }
        Action::Output(b) => format!("Output byte {b}"),
        Action::Input(b) => format!("Read byte from input -> {b}"),
        Action::InputEof => "Read byte from input -> EOF".to_string(),
        Action::SkipForward { to } => format!("Cell is 0; jump forward to matching ']' at IP {to}"),
        Action::EnterLoop { depth } => format!("Enter loop (cell != 0, depth {depth})"),
        Action::JumpBack { to } => format!("Cell != 0; jump back to '[' at IP {to}"),
        Action::ExitLoop { depth } => format!("Exit loop (cell is 0, depth {depth})"),
        Action::NoOp => "No-op".to_string(),
    }
}
