//! Control-flow error values.
//!
//! break/continue/return/exit are implemented as error values that carry
//! the stdout/stderr accumulated so far; they propagate up the execution
//! stack until a loop or function frame (or the top level) consumes them.
//! Errexit and expansion failures travel the same way.

use std::fmt;

#[derive(Debug, Clone)]
pub enum InterpreterError {
    /// break N
    Break { levels: u32, stdout: String, stderr: String },
    /// continue N
    Continue { levels: u32, stdout: String, stderr: String },
    /// return N (consumed by a function frame or a sourced script)
    Return { exit_code: i32, stdout: String, stderr: String },
    /// exit N (consumed only by the outermost frame)
    Exit { exit_code: i32, stdout: String, stderr: String },
    /// set -e tripped
    Errexit { exit_code: i32, stdout: String, stderr: String },
    /// Expansion failure: unbound variable under nounset, bad
    /// substitution, arithmetic error. stderr is preformatted. Fatal
    /// errors (nounset, ${x:?}) terminate the whole script.
    Expansion { exit_code: i32, stdout: String, stderr: String, fatal: bool },
    /// Execution limit exceeded (exit 126)
    Limit { message: String, stdout: String, stderr: String },
}

impl InterpreterError {
    pub fn break_levels(levels: u32) -> Self {
        Self::Break { levels, stdout: String::new(), stderr: String::new() }
    }

    pub fn continue_levels(levels: u32) -> Self {
        Self::Continue { levels, stdout: String::new(), stderr: String::new() }
    }

    pub fn return_code(exit_code: i32) -> Self {
        Self::Return { exit_code, stdout: String::new(), stderr: String::new() }
    }

    pub fn exit_code(exit_code: i32) -> Self {
        Self::Exit { exit_code, stdout: String::new(), stderr: String::new() }
    }

    pub fn expansion(message: impl Into<String>) -> Self {
        Self::Expansion {
            exit_code: 1,
            stdout: String::new(),
            stderr: format!("bash: {}\n", message.into()),
            fatal: false,
        }
    }

    pub fn expansion_fatal(message: impl Into<String>) -> Self {
        Self::Expansion {
            exit_code: 1,
            stdout: String::new(),
            stderr: format!("bash: {}\n", message.into()),
            fatal: true,
        }
    }

    pub fn limit(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Limit {
            stdout: String::new(),
            stderr: format!("bash: {}\n", message),
            message,
        }
    }

    /// Exit code for a limit error.
    pub const LIMIT_EXIT_CODE: i32 = 126;

    pub fn stdout(&self) -> &str {
        match self {
            Self::Break { stdout, .. }
            | Self::Continue { stdout, .. }
            | Self::Return { stdout, .. }
            | Self::Exit { stdout, .. }
            | Self::Errexit { stdout, .. }
            | Self::Expansion { stdout, .. }
            | Self::Limit { stdout, .. } => stdout,
        }
    }

    pub fn stderr(&self) -> &str {
        match self {
            Self::Break { stderr, .. }
            | Self::Continue { stderr, .. }
            | Self::Return { stderr, .. }
            | Self::Exit { stderr, .. }
            | Self::Errexit { stderr, .. }
            | Self::Expansion { stderr, .. }
            | Self::Limit { stderr, .. } => stderr,
        }
    }

    /// Prepend already-captured output before re-throwing, so output
    /// ordering survives the unwind.
    pub fn prepend_output(mut self, out: &str, err: &str) -> Self {
        let (stdout, stderr) = match &mut self {
            Self::Break { stdout, stderr, .. }
            | Self::Continue { stdout, stderr, .. }
            | Self::Return { stdout, stderr, .. }
            | Self::Exit { stdout, stderr, .. }
            | Self::Errexit { stdout, stderr, .. }
            | Self::Expansion { stdout, stderr, .. }
            | Self::Limit { stdout, stderr, .. } => (stdout, stderr),
        };
        *stdout = format!("{}{}", out, stdout);
        *stderr = format!("{}{}", err, stderr);
        self
    }
}

impl fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Break { levels, .. } => write!(f, "break {}", levels),
            Self::Continue { levels, .. } => write!(f, "continue {}", levels),
            Self::Return { exit_code, .. } => write!(f, "return {}", exit_code),
            Self::Exit { exit_code, .. } => write!(f, "exit {}", exit_code),
            Self::Errexit { exit_code, .. } => {
                write!(f, "errexit: command exited with status {}", exit_code)
            }
            Self::Expansion { stderr, .. } => write!(f, "{}", stderr.trim_end()),
            Self::Limit { message, .. } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for InterpreterError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepend_output() {
        let err = InterpreterError::break_levels(1).prepend_output("before\n", "warn\n");
        assert_eq!(err.stdout(), "before\n");
        assert_eq!(err.stderr(), "warn\n");

        let err = err.prepend_output("first\n", "");
        assert_eq!(err.stdout(), "first\nbefore\n");
    }

    #[test]
    fn test_expansion_formats_stderr() {
        let err = InterpreterError::expansion("x: unbound variable");
        assert_eq!(err.stderr(), "bash: x: unbound variable\n");
    }
}
