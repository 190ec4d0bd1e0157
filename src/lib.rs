//! shellbox - a hermetic, in-process bash interpreter.
//!
//! Scripts run against a virtual filesystem and environment; stdout,
//! stderr, and exit codes are captured, and the host system is never
//! touched.

pub mod ast;
pub mod commands;
pub mod fs;
pub mod glob;
pub mod interpreter;
pub mod network;
pub mod parser;
pub mod shell;

pub use ast::types::*;
pub use commands::{Command, CommandContext, CommandRegistry, CommandResult};
pub use fs::{FileSystem, FsError, InMemoryFs, InitialFiles};
pub use interpreter::{ControlFlowSignal, ExecResult, ExecutionLimits, ShellState, Value};
pub use network::{HttpClient, HttpRequest, HttpResponse, NetworkConfig};
pub use parser::{parse, tokenize, ParseException, Token, TokenType};
pub use shell::{Shell, ShellOptions};
