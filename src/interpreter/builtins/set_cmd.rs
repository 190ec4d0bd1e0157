//! set and shift.

use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::{ExecResult, ShellState};

pub fn set(state: &mut ShellState, args: &[String]) -> Result<ExecResult, InterpreterError> {
    if args.is_empty() {
        // Print variables, sorted
        let mut names: Vec<&String> = state.vars.keys().collect();
        names.sort();
        let mut stdout = String::new();
        for name in names {
            stdout.push_str(&format!("{}={}\n", name, state.get_scalar(name)));
        }
        return Ok(ExecResult::new(stdout, String::new(), 0));
    }

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-e" => state.options.errexit = true,
            "+e" => state.options.errexit = false,
            "-u" => state.options.nounset = true,
            "+u" => state.options.nounset = false,
            "-x" => state.options.xtrace = true,
            "+x" => state.options.xtrace = false,
            "-o" | "+o" => {
                let enable = arg == "-o";
                i += 1;
                match args.get(i).map(|s| s.as_str()) {
                    Some("errexit") => state.options.errexit = enable,
                    Some("nounset") => state.options.nounset = enable,
                    Some("pipefail") => state.options.pipefail = enable,
                    Some("xtrace") => state.options.xtrace = enable,
                    Some(other) => {
                        return Ok(ExecResult::failure(format!(
                            "bash: set: {}: invalid option name\n",
                            other
                        )));
                    }
                    None => {}
                }
            }
            "--" => {
                state.positional = args[i + 1..].to_vec();
                return Ok(ExecResult::ok());
            }
            _ if arg.starts_with('-') || arg.starts_with('+') => {
                return Ok(ExecResult::failure_with_code(
                    format!("bash: set: {}: invalid option\n", arg),
                    2,
                ));
            }
            _ => {
                // Bare words replace the positional parameters
                state.positional = args[i..].to_vec();
                return Ok(ExecResult::ok());
            }
        }
        i += 1;
    }

    Ok(ExecResult::ok())
}

pub fn shift(state: &mut ShellState, args: &[String]) -> Result<ExecResult, InterpreterError> {
    let count = match args.first() {
        Some(arg) => match arg.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                return Ok(ExecResult::failure(format!(
                    "bash: shift: {}: numeric argument required\n",
                    arg
                )));
            }
        },
        None => 1,
    };

    if count > state.positional.len() {
        return Ok(ExecResult::new(String::new(), String::new(), 1));
    }
    state.positional.drain(..count);
    Ok(ExecResult::ok())
}
