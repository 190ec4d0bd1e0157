//! eval, source, let, type.

use crate::interpreter::builtins::is_builtin;
use crate::interpreter::engine::ExecutionEngine;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::{ExecResult, ShellState};

pub fn eval(
    engine: &ExecutionEngine,
    state: &mut ShellState,
    args: &[String],
) -> Result<ExecResult, InterpreterError> {
    let script = args.join(" ");
    if script.trim().is_empty() {
        return Ok(ExecResult::ok());
    }
    match crate::parser::parse(&script) {
        Ok(ast) => engine.execute_script(state, &ast),
        Err(e) => Ok(ExecResult::failure_with_code(
            format!("bash: eval: {}\n", e.message),
            2,
        )),
    }
}

pub fn source(
    engine: &ExecutionEngine,
    state: &mut ShellState,
    args: &[String],
) -> Result<ExecResult, InterpreterError> {
    let path = match args.first() {
        Some(path) => path.clone(),
        None => {
            return Ok(ExecResult::failure_with_code(
                "bash: source: filename argument required\n".to_string(),
                2,
            ));
        }
    };

    let resolved = engine.fs.resolve_path(&state.cwd, &path);
    let script = match engine.fs.read_file(&resolved) {
        Ok(content) => content,
        Err(_) => {
            return Ok(ExecResult::failure(format!(
                "bash: source: {}: No such file or directory\n",
                path
            )));
        }
    };

    let ast = match crate::parser::parse(&script) {
        Ok(ast) => ast,
        Err(e) => {
            return Ok(ExecResult::failure_with_code(
                format!("bash: {}: {}\n", path, e.message),
                2,
            ));
        }
    };

    // Extra arguments become the positional parameters for the script
    let saved_positional = if args.len() > 1 {
        Some(std::mem::replace(&mut state.positional, args[1..].to_vec()))
    } else {
        None
    };
    state.call_depth += 1;

    let outcome = engine.execute_script(state, &ast);

    state.call_depth -= 1;
    if let Some(saved) = saved_positional {
        state.positional = saved;
    }

    match outcome {
        Ok(result) => Ok(result),
        // return inside a sourced script stops the source
        Err(InterpreterError::Return { exit_code, stdout, stderr }) => {
            Ok(ExecResult::new(stdout, stderr, exit_code))
        }
        Err(e) => Err(e),
    }
}

pub fn let_builtin(
    state: &mut ShellState,
    args: &[String],
) -> Result<ExecResult, InterpreterError> {
    if args.is_empty() {
        return Ok(ExecResult::failure_with_code(
            "bash: let: expression expected\n".to_string(),
            1,
        ));
    }

    let mut last_value = 0;
    for arg in args {
        let expr = match crate::parser::arithmetic_parser::parse_arithmetic(arg) {
            Ok(expr) => expr,
            Err(e) => {
                return Ok(ExecResult::failure(format!("bash: let: {}\n", e.message)));
            }
        };
        match crate::interpreter::arithmetic::eval_arith(state, &expr) {
            Ok(value) => last_value = value,
            Err(InterpreterError::Expansion { stderr, .. }) => {
                return Ok(ExecResult::failure(stderr));
            }
            Err(e) => return Err(e),
        }
    }

    let exit_code = if last_value != 0 { 0 } else { 1 };
    Ok(ExecResult::new(String::new(), String::new(), exit_code))
}

pub fn type_builtin(
    engine: &ExecutionEngine,
    state: &mut ShellState,
    args: &[String],
) -> Result<ExecResult, InterpreterError> {
    let mut stdout = String::new();
    let mut stderr = String::new();
    let mut exit_code = 0;

    for name in args {
        if state.functions.contains_key(name) {
            stdout.push_str(&format!("{} is a function\n", name));
        } else if is_builtin(name) {
            stdout.push_str(&format!("{} is a shell builtin\n", name));
        } else if engine.registry.contains(name) {
            stdout.push_str(&format!("{} is /usr/bin/{}\n", name, name));
        } else {
            stderr.push_str(&format!("bash: type: {}: not found\n", name));
            exit_code = 1;
        }
    }

    Ok(ExecResult::new(stdout, stderr, exit_code))
}
