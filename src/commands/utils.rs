//! Shared helpers for command implementations.

use crate::commands::types::{CommandContext, CommandResult};

/// Concatenate the contents of the given operand paths, treating `-`
/// (and an empty operand list) as stdin. Returns Err with a ready
/// CommandResult when a file is missing.
pub async fn read_inputs(
    ctx: &CommandContext,
    name: &str,
    paths: &[String],
) -> Result<String, CommandResult> {
    if paths.is_empty() {
        return Ok(ctx.stdin.clone());
    }

    let mut content = String::new();
    for path in paths {
        if path == "-" {
            content.push_str(&ctx.stdin);
            continue;
        }
        let resolved = ctx.resolve(path);
        match ctx.fs.read_file(&resolved).await {
            Ok(text) => content.push_str(&text),
            Err(e) => {
                return Err(CommandResult::error(format!(
                    "{}: {}: {}\n",
                    name,
                    path,
                    e.strerror()
                )));
            }
        }
    }
    Ok(content)
}

/// Split text into lines without dropping a trailing incomplete line.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut lines: Vec<&str> = text.split('\n').collect();
    if text.ends_with('\n') {
        lines.pop();
    }
    lines
}

/// Join lines back with trailing newline (when any line exists).
pub fn join_lines(lines: &[String]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines(""), Vec::<&str>::new());
        assert_eq!(split_lines("\n"), vec![""]);
    }

    #[test]
    fn test_join_lines() {
        assert_eq!(join_lines(&["a".to_string(), "b".to_string()]), "a\nb\n");
        assert_eq!(join_lines(&[]), "");
    }
}
