//! read.

use crate::interpreter::expansion::word_split::split_on_ifs;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::{ExecResult, ShellState, Value};

pub fn read(
    state: &mut ShellState,
    args: &[String],
    stdin: &str,
) -> Result<ExecResult, InterpreterError> {
    let mut raw = false;
    let mut array_name: Option<String> = None;
    let mut names: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-r" => raw = true,
            "-a" => {
                i += 1;
                array_name = args.get(i).cloned();
            }
            "--" => {
                names.extend(args[i + 1..].iter().cloned());
                break;
            }
            arg => names.push(arg.to_string()),
        }
        i += 1;
    }

    // Take one line: from the piped stdin if provided, otherwise from
    // the surrounding compound's redirected input
    let line = match take_line(state, stdin) {
        Some(line) => line,
        None => {
            // EOF: variables are cleared, exit 1
            for name in &names {
                state.set_scalar(name, "");
            }
            return Ok(ExecResult::new(String::new(), String::new(), 1));
        }
    };

    let line = if raw { line } else { strip_escapes(&line) };

    if let Some(array) = array_name {
        let items = split_on_ifs(&line, &state.ifs());
        state.set_var(&array, Value::Indexed(items));
        return Ok(ExecResult::ok());
    }

    if names.is_empty() {
        state.set_scalar("REPLY", line);
        return Ok(ExecResult::ok());
    }

    // Split into the named variables; the last one takes the remainder
    let ifs = state.ifs();
    let mut remainder = line.as_str();
    for (idx, name) in names.iter().enumerate() {
        if idx + 1 == names.len() {
            let trimmed = remainder.trim_matches(|c: char| ifs.contains(c) && c.is_whitespace());
            state.set_scalar(name, trimmed.to_string());
        } else {
            remainder = remainder.trim_start_matches(|c: char| ifs.contains(c));
            match remainder.find(|c: char| ifs.contains(c)) {
                Some(pos) => {
                    state.set_scalar(name, remainder[..pos].to_string());
                    remainder = &remainder[pos..];
                }
                None => {
                    state.set_scalar(name, remainder.to_string());
                    remainder = "";
                }
            }
        }
    }

    Ok(ExecResult::ok())
}

/// Pull the next line from the available input source.
fn take_line(state: &mut ShellState, stdin: &str) -> Option<String> {
    if !stdin.is_empty() {
        // A piped read sees the whole stream but consumes one line
        return Some(stdin.lines().next().unwrap_or("").to_string());
    }

    let buffer = state.group_stdin.as_mut()?;
    if buffer.is_empty() {
        return None;
    }
    match buffer.find('\n') {
        Some(pos) => {
            let line = buffer[..pos].to_string();
            *buffer = buffer[pos + 1..].to_string();
            Some(line)
        }
        None => {
            let line = std::mem::take(buffer);
            Some(line)
        }
    }
}

/// Without -r, a backslash escapes the next character.
fn strip_escapes(line: &str) -> String {
    let mut out = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_read_single_var() {
        let mut state = ShellState::default();
        let result = read(&mut state, &args(&["x"]), "hello world\n").unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(state.get_scalar("x"), "hello world");
    }

    #[test]
    fn test_read_splits_across_vars() {
        let mut state = ShellState::default();
        read(&mut state, &args(&["a", "b"]), "one two three\n").unwrap();
        assert_eq!(state.get_scalar("a"), "one");
        assert_eq!(state.get_scalar("b"), "two three");
    }

    #[test]
    fn test_read_reply_default() {
        let mut state = ShellState::default();
        read(&mut state, &[], "something\n").unwrap();
        assert_eq!(state.get_scalar("REPLY"), "something");
    }

    #[test]
    fn test_read_eof_returns_one() {
        let mut state = ShellState::default();
        let result = read(&mut state, &args(&["x"]), "").unwrap();
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn test_read_consumes_group_stdin() {
        let mut state = ShellState::default();
        state.group_stdin = Some("first\nsecond\n".to_string());
        read(&mut state, &args(&["x"]), "").unwrap();
        assert_eq!(state.get_scalar("x"), "first");
        read(&mut state, &args(&["x"]), "").unwrap();
        assert_eq!(state.get_scalar("x"), "second");
        let result = read(&mut state, &args(&["x"]), "").unwrap();
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn test_read_array() {
        let mut state = ShellState::default();
        read(&mut state, &args(&["-a", "arr"]), "a b c\n").unwrap();
        assert_eq!(
            state.get_var("arr"),
            Some(Value::Indexed(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn test_read_backslash_handling() {
        let mut state = ShellState::default();
        read(&mut state, &args(&["x"]), "a\\ b\n").unwrap();
        assert_eq!(state.get_scalar("x"), "a b");
        read(&mut state, &args(&["-r", "x"]), "a\\ b\n").unwrap();
        assert_eq!(state.get_scalar("x"), "a\\ b");
    }
}
