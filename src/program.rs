use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use tracing::debug;

use crate::error::{BracketKind, InterpreterError};
use crate::{MAX_CODESIZE, TERMINATOR};

/// An immutable, length-checked program buffer.
///
/// The logical program ends at the first [`TERMINATOR`] byte or at the end of
/// the buffer, whichever comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    code: Vec<u8>,
    end: usize,
}

impl Program {
    /// Wrap `code`, rejecting anything longer than [`MAX_CODESIZE`].
    pub fn new(code: Vec<u8>) -> Result<Self, InterpreterError> {
        if code.len() > MAX_CODESIZE {
            return Err(InterpreterError::ProgramTooLarge {
                len: code.len(),
                max: MAX_CODESIZE,
            });
        }
        let end = code.iter().position(|&b| b == TERMINATOR).unwrap_or(code.len());
        Ok(Self { code, end })
    }

    /// Read a program from `reader`.
    ///
    /// At most `MAX_CODESIZE + 1` bytes are buffered. An oversized source is
    /// drained without buffering so the error reports its real length.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, InterpreterError> {
        let mut code = Vec::new();
        reader
            .by_ref()
            .take(MAX_CODESIZE as u64 + 1)
            .read_to_end(&mut code)
            .map_err(|source| InterpreterError::Read { source })?;
        if code.len() > MAX_CODESIZE {
            let rest = io::copy(&mut reader, &mut io::sink())
                .map_err(|source| InterpreterError::Read { source })?;
            return Err(InterpreterError::ProgramTooLarge {
                len: code.len() + rest as usize,
                max: MAX_CODESIZE,
            });
        }
        Self::new(code)
    }

    /// Load a program from the file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, InterpreterError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| InterpreterError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let program = Self::from_reader(file)?;
        debug!(path = %path.display(), len = program.len(), "loaded program");
        Ok(program)
    }

    /// The instructions up to the logical end of the program.
    pub fn instructions(&self) -> &[u8] {
        &self.code[..self.end]
    }

    /// The raw buffer, including anything after a terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    /// Number of executable bytes.
    pub fn len(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// Verify that every bracket in the program has a partner.
    ///
    /// A stray `]` is reported at its own position; an unclosed `[` is
    /// reported at the innermost one still open when the program ends.
    pub fn check_brackets(&self) -> Result<(), InterpreterError> {
        let mut open: Vec<usize> = Vec::new();
        for (ip, &b) in self.instructions().iter().enumerate() {
            match b {
                b'[' => open.push(ip),
                b']' => {
                    if open.pop().is_none() {
                        return Err(InterpreterError::UnbalancedBracket {
                            ip,
                            kind: BracketKind::Close,
                        });
                    }
                }
                _ => {}
            }
        }

        if let Some(ip) = open.last().copied() {
            return Err(InterpreterError::UnbalancedBracket {
                ip,
                kind: BracketKind::Open,
            });
        }
        Ok(())
    }
}

impl TryFrom<&str> for Program {
    type Error = InterpreterError;

    fn try_from(code: &str) -> Result<Self, Self::Error> {
        Self::new(code.as_bytes().to_vec())
    }
}

impl TryFrom<&[u8]> for Program {
    type Error = InterpreterError;

    fn try_from(code: &[u8]) -> Result<Self, Self::Error> {
        Self::new(code.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn program_at_limit_is_accepted() {
        let program = Program::new(vec![b'+'; MAX_CODESIZE]).unwrap();
        assert_eq!(program.len(), MAX_CODESIZE);
    }

    #[test]
    fn program_over_limit_is_rejected() {
        let result = Program::new(vec![b'+'; MAX_CODESIZE + 1]);
        assert!(matches!(
            result,
            Err(InterpreterError::ProgramTooLarge { len, max }) if len == MAX_CODESIZE + 1 && max == MAX_CODESIZE
        ));
    }

    #[test]
    fn oversized_reader_reports_real_length() {
        let source = Cursor::new(vec![b'-'; MAX_CODESIZE * 4]);
        let result = Program::from_reader(source);
        assert!(matches!(
            result,
            Err(InterpreterError::ProgramTooLarge { len, max })
                if len == MAX_CODESIZE * 4 && max == MAX_CODESIZE
        ));
    }

    #[test]
    fn one_byte_over_reports_exact_length() {
        let result = Program::from_reader(Cursor::new(vec![b'+'; MAX_CODESIZE + 1]));
        assert!(matches!(
            result,
            Err(InterpreterError::ProgramTooLarge { len, .. }) if len == MAX_CODESIZE + 1
        ));
    }

    #[test]
    fn terminator_marks_logical_end() {
        let program = Program::try_from(&b"+.\0>>]"[..]).unwrap();
        assert_eq!(program.instructions(), b"+.");
        assert_eq!(program.as_bytes().len(), 6);
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let result = Program::from_file("/definitely/not/here.b");
        assert!(matches!(result, Err(InterpreterError::Open { .. })));
    }

    #[test]
    fn balanced_program_passes_check() {
        let program = Program::try_from("+[>[-]<-]comment[]").unwrap();
        assert!(program.check_brackets().is_ok());
    }

    #[test]
    fn stray_close_is_reported_at_its_position() {
        let program = Program::try_from("+[-]]").unwrap();
        assert!(matches!(
            program.check_brackets(),
            Err(InterpreterError::UnbalancedBracket { ip: 4, kind: BracketKind::Close })
        ));
    }

    #[test]
    fn unclosed_open_is_reported_at_innermost() {
        let program = Program::try_from("[[-]").unwrap();
        assert!(matches!(
            program.check_brackets(),
            Err(InterpreterError::UnbalancedBracket { ip: 0, kind: BracketKind::Open })
        ));
    }

    #[test]
    fn brackets_after_terminator_are_ignored() {
        let program = Program::try_from(&b"[-]\0]]"[..]).unwrap();
        assert!(program.check_brackets().is_ok());
    }
}
