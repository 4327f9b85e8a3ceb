use std::fmt;
use std::path::PathBuf;

/// Errors that can occur while loading or interpreting a program.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// The program file could not be opened.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The program source could not be read.
    #[error("failed to read program: {source}")]
    Read {
        #[source]
        source: std::io::Error,
    },

    /// The program is longer than [`crate::MAX_CODESIZE`].
    #[error("program too large: {len} bytes exceeds the {max} byte limit")]
    ProgramTooLarge { len: usize, max: usize },

    /// More loops were entered at once than the loop stack can hold.
    #[error("loop stack overflow at instruction {ip} (capacity {capacity})")]
    ControlStackOverflow { ip: usize, capacity: usize },

    /// A bracket without a partner was reached.
    #[error("Unmatched bracket {kind} at instruction {ip}")]
    UnbalancedBracket { ip: usize, kind: BracketKind },

    /// Reading from the input stream or writing to the output stream failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: std::io::Error,
    },

    /// Execution was stopped through the interrupt flag.
    #[error("Execution aborted: interrupted at instruction {ip}")]
    Interrupted { ip: usize },
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    Open,
    Close,
}

impl fmt::Display for BracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketKind::Open => write!(f, "'['"),
            BracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Process-style outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    LoadFailed,
    Usage,
    ProgramTooLarge,
    ControlStackOverflow,
    UnbalancedBracket,
    Io,
    Interrupted,
}

impl ExitStatus {
    /// The exit code a process should report for this status.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::LoadFailed => 1,
            ExitStatus::Usage => 2,
            ExitStatus::ProgramTooLarge => 3,
            ExitStatus::ControlStackOverflow => 4,
            ExitStatus::UnbalancedBracket => 5,
            ExitStatus::Io => 6,
            ExitStatus::Interrupted => 130,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitStatus::Success
    }
}

impl From<&InterpreterError> for ExitStatus {
    fn from(err: &InterpreterError) -> Self {
        match err {
            InterpreterError::Open { .. } | InterpreterError::Read { .. } => ExitStatus::LoadFailed,
            InterpreterError::ProgramTooLarge { .. } => ExitStatus::ProgramTooLarge,
            InterpreterError::ControlStackOverflow { .. } => ExitStatus::ControlStackOverflow,
            InterpreterError::UnbalancedBracket { .. } => ExitStatus::UnbalancedBracket,
            InterpreterError::Io { .. } => ExitStatus::Io,
            InterpreterError::Interrupted { .. } => ExitStatus::Interrupted,
        }
    }
}

impl<T> From<&Result<T, InterpreterError>> for ExitStatus {
    fn from(result: &Result<T, InterpreterError>) -> Self {
        match result {
            Ok(_) => ExitStatus::Success,
            Err(err) => ExitStatus::from(err),
        }
    }
}
