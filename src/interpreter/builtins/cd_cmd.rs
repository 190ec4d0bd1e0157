//! cd and pwd.

use crate::interpreter::engine::ExecutionEngine;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::{ExecResult, ShellState};

pub fn cd(
    engine: &ExecutionEngine,
    state: &mut ShellState,
    args: &[String],
) -> Result<ExecResult, InterpreterError> {
    let mut print_target = false;
    let target = match args.first().map(|s| s.as_str()) {
        None | Some("~") => state.get_scalar("HOME"),
        Some("-") => {
            print_target = true;
            state.previous_dir.clone()
        }
        Some(path) => path.to_string(),
    };

    if target.is_empty() {
        return Ok(ExecResult::failure("bash: cd: HOME not set\n".to_string()));
    }

    let resolved = engine.fs.resolve_path(&state.cwd, &target);
    if !engine.fs.exists(&resolved) {
        return Ok(ExecResult::failure(format!(
            "bash: cd: {}: No such file or directory\n",
            target
        )));
    }
    if !engine.fs.is_dir(&resolved) {
        return Ok(ExecResult::failure(format!("bash: cd: {}: Not a directory\n", target)));
    }

    state.previous_dir = state.cwd.clone();
    state.env.insert("OLDPWD".to_string(), state.cwd.clone());
    state.cwd = resolved.clone();
    state.env.insert("PWD".to_string(), resolved.clone());

    let stdout = if print_target { format!("{}\n", resolved) } else { String::new() };
    Ok(ExecResult::new(stdout, String::new(), 0))
}

pub fn pwd(state: &ShellState) -> Result<ExecResult, InterpreterError> {
    Ok(ExecResult::new(format!("{}\n", state.cwd), String::new(), 0))
}
