//! Shell builtins.
//!
//! Builtins run inside the interpreter against the live state, ahead of
//! the external-command registry in dispatch order.

pub mod cd_cmd;
pub mod control_cmd;
pub mod echo_cmd;
pub mod eval_cmd;
pub mod export_cmd;
pub mod printf_cmd;
pub mod read_cmd;
pub mod set_cmd;
pub mod test_cmd;

use crate::interpreter::engine::ExecutionEngine;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::{ExecResult, ShellState};

pub fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "cd" | "pwd"
            | "echo"
            | "printf"
            | "export"
            | "unset"
            | "read"
            | "exit"
            | "return"
            | "break"
            | "continue"
            | "true"
            | "false"
            | ":"
            | "set"
            | "shift"
            | "test"
            | "["
            | "let"
            | "local"
            | "declare"
            | "source"
            | "."
            | "eval"
            | "type"
    )
}

pub fn run_builtin(
    engine: &ExecutionEngine,
    state: &mut ShellState,
    argv: &[String],
    stdin: &str,
) -> Result<ExecResult, InterpreterError> {
    let args = &argv[1..];
    match argv[0].as_str() {
        "cd" => cd_cmd::cd(engine, state, args),
        "pwd" => cd_cmd::pwd(state),
        "echo" => echo_cmd::echo(args),
        "printf" => printf_cmd::printf_builtin(args),
        "export" => export_cmd::export(state, args),
        "unset" => export_cmd::unset(state, args),
        "local" => export_cmd::local(state, args),
        "declare" => export_cmd::declare(state, args),
        "read" => read_cmd::read(state, args, stdin),
        "exit" => control_cmd::exit(state, args),
        "return" => control_cmd::return_builtin(state, args),
        "break" => control_cmd::break_builtin(state, args),
        "continue" => control_cmd::continue_builtin(state, args),
        "true" => Ok(ExecResult::ok()),
        "false" => Ok(ExecResult::new(String::new(), String::new(), 1)),
        ":" => Ok(ExecResult::ok()),
        "set" => set_cmd::set(state, args),
        "shift" => set_cmd::shift(state, args),
        "test" => test_cmd::test(engine, state, args),
        "[" => test_cmd::bracket(engine, state, args),
        "let" => eval_cmd::let_builtin(state, args),
        "eval" => eval_cmd::eval(engine, state, args),
        "source" | "." => eval_cmd::source(engine, state, args),
        "type" => eval_cmd::type_builtin(engine, state, args),
        other => Ok(ExecResult::failure_with_code(
            format!("bash: {}: command not found\n", other),
            127,
        )),
    }
}
