//! Control-flow builtins: exit, return, break, continue.

use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::{ExecResult, ShellState};

pub fn exit(state: &mut ShellState, args: &[String]) -> Result<ExecResult, InterpreterError> {
    let code = match args.first() {
        Some(arg) => match arg.parse::<i64>() {
            Ok(n) => (n.rem_euclid(256)) as i32,
            Err(_) => {
                return Err(InterpreterError::Exit {
                    exit_code: 2,
                    stdout: String::new(),
                    stderr: format!("bash: exit: {}: numeric argument required\n", arg),
                });
            }
        },
        None => state.last_exit_code,
    };
    Err(InterpreterError::exit_code(code))
}

pub fn return_builtin(
    state: &mut ShellState,
    args: &[String],
) -> Result<ExecResult, InterpreterError> {
    if state.call_depth == 0 {
        return Ok(ExecResult::failure(
            "bash: return: can only `return' from a function or sourced script\n".to_string(),
        ));
    }
    let code = match args.first() {
        Some(arg) => match arg.parse::<i64>() {
            Ok(n) => (n.rem_euclid(256)) as i32,
            Err(_) => {
                return Ok(ExecResult::failure_with_code(
                    format!("bash: return: {}: numeric argument required\n", arg),
                    2,
                ));
            }
        },
        None => state.last_exit_code,
    };
    Err(InterpreterError::return_code(code))
}

pub fn break_builtin(
    _state: &mut ShellState,
    args: &[String],
) -> Result<ExecResult, InterpreterError> {
    let levels = parse_levels(args, "break")?;
    Err(InterpreterError::break_levels(levels))
}

pub fn continue_builtin(
    _state: &mut ShellState,
    args: &[String],
) -> Result<ExecResult, InterpreterError> {
    let levels = parse_levels(args, "continue")?;
    Err(InterpreterError::continue_levels(levels))
}

fn parse_levels(args: &[String], name: &str) -> Result<u32, InterpreterError> {
    match args.first() {
        None => Ok(1),
        Some(arg) => match arg.parse::<i64>() {
            Ok(n) if n >= 1 => Ok(n as u32),
            Ok(n) => Err(InterpreterError::expansion(format!(
                "{}: {}: loop count out of range",
                name, n
            ))),
            Err(_) => Err(InterpreterError::expansion(format!(
                "{}: {}: numeric argument required",
                name, arg
            ))),
        },
    }
}
