//! Variable declaration builtins: export, unset, local, declare.

use indexmap::IndexMap;

use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::{ExecResult, ShellState, Value};

/// Split a NAME=value argument.
fn split_assignment_arg(arg: &str) -> (String, Option<String>) {
    match arg.split_once('=') {
        Some((name, value)) => (name.to_string(), Some(value.to_string())),
        None => (arg.to_string(), None),
    }
}

pub fn export(state: &mut ShellState, args: &[String]) -> Result<ExecResult, InterpreterError> {
    if args.is_empty() {
        let mut names: Vec<&String> = state.env.keys().collect();
        names.sort();
        let mut stdout = String::new();
        for name in names {
            stdout.push_str(&format!("declare -x {}=\"{}\"\n", name, state.env[name]));
        }
        return Ok(ExecResult::new(stdout, String::new(), 0));
    }

    for arg in args {
        if arg == "-n" || arg == "-p" {
            continue;
        }
        let (name, value) = split_assignment_arg(arg);
        if let Some(value) = value {
            state.set_scalar(&name, value);
        }
        state.export_var(&name);
    }
    Ok(ExecResult::ok())
}

pub fn unset(state: &mut ShellState, args: &[String]) -> Result<ExecResult, InterpreterError> {
    let mut functions_only = false;
    for arg in args {
        match arg.as_str() {
            "-f" => {
                functions_only = true;
                continue;
            }
            "-v" => {
                functions_only = false;
                continue;
            }
            _ => {}
        }
        if functions_only {
            state.functions.remove(arg);
        } else if state.is_set(arg) {
            state.unset_var(arg);
        } else {
            state.functions.remove(arg);
        }
    }
    Ok(ExecResult::ok())
}

pub fn local(state: &mut ShellState, args: &[String]) -> Result<ExecResult, InterpreterError> {
    if state.local_scopes.is_empty() {
        return Ok(ExecResult::failure(
            "bash: local: can only be used in a function\n".to_string(),
        ));
    }

    for arg in args {
        if arg.starts_with('-') {
            continue;
        }
        let (name, value) = split_assignment_arg(arg);
        state.declare_local(&name);
        match value {
            Some(value) => state.set_scalar(&name, value),
            None => {
                state.vars.insert(name, Value::Scalar(String::new()));
            }
        }
    }
    Ok(ExecResult::ok())
}

pub fn declare(state: &mut ShellState, args: &[String]) -> Result<ExecResult, InterpreterError> {
    let mut assoc = false;
    let mut indexed = false;
    let mut exported = false;

    let mut operands: Vec<&String> = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-A" => assoc = true,
            "-a" => indexed = true,
            "-x" => exported = true,
            "--" => {}
            _ if arg.starts_with('-') => {}
            _ => operands.push(arg),
        }
    }

    for arg in operands {
        let (name, value) = split_assignment_arg(arg);
        if !state.local_scopes.is_empty() {
            state.declare_local(&name);
        }

        if assoc {
            if !matches!(state.get_var(&name), Some(Value::Assoc(_))) {
                state.set_var(&name, Value::Assoc(IndexMap::new()));
            }
        } else if indexed {
            if !matches!(state.get_var(&name), Some(Value::Indexed(_))) {
                state.set_var(&name, Value::Indexed(Vec::new()));
            }
        }

        if let Some(value) = value {
            state.set_scalar(&name, value);
        }
        if exported {
            state.export_var(&name);
        }
    }
    Ok(ExecResult::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_export_with_value() {
        let mut state = ShellState::default();
        export(&mut state, &args(&["FOO=bar"])).unwrap();
        assert_eq!(state.env.get("FOO"), Some(&"bar".to_string()));
        assert_eq!(state.get_scalar("FOO"), "bar");
    }

    #[test]
    fn test_export_existing_var() {
        let mut state = ShellState::default();
        state.set_scalar("X", "v");
        export(&mut state, &args(&["X"])).unwrap();
        assert_eq!(state.env.get("X"), Some(&"v".to_string()));
    }

    #[test]
    fn test_unset_removes_var_and_function() {
        let mut state = ShellState::default();
        state.set_scalar("X", "v");
        unset(&mut state, &args(&["X"])).unwrap();
        assert!(!state.is_set("X"));
    }

    #[test]
    fn test_local_outside_function_fails() {
        let mut state = ShellState::default();
        let result = local(&mut state, &args(&["x=1"])).unwrap();
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn test_declare_assoc() {
        let mut state = ShellState::default();
        declare(&mut state, &args(&["-A", "map"])).unwrap();
        assert!(matches!(state.get_var("map"), Some(Value::Assoc(_))));
    }
}
