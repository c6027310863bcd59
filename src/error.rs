//! Error representation for the three failure kinds the translator can hit:
//! I/O failure, invalid argument path, and structural (grammar) failure.
//!
//! Grounded in the teacher's `CodeGenError` pattern: a small `enum`
//! implementing `std::error::Error` with `From` impls for `?`, rather than a
//! `thiserror` derive (the teacher never pulls that crate in).

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CompileError {
    Io(std::io::Error),
    /// A structural (grammar) failure: the token stream didn't match what
    /// the current production expected.
    Structural {
        line: usize,
        expected: String,
        found: String,
    },
    InvalidPath(PathBuf),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Io(e) => write!(f, "I/O error: {}", e),
            CompileError::Structural {
                line,
                expected,
                found,
            } => write!(
                f,
                "line {}: expected {}, found {}",
                line + 1,
                expected,
                found
            ),
            CompileError::InvalidPath(path) => {
                write!(f, "invalid path: {}", path.display())
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e)
    }
}

impl CompileError {
    pub fn structural(line: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        CompileError::Structural {
            line,
            expected: expected.into(),
            found: found.into(),
        }
    }
}
