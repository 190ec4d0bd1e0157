//! grep.

use async_trait::async_trait;
use regex_lite::Regex;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::commands::utils::split_lines;

pub struct GrepCommand;

#[async_trait]
impl Command for GrepCommand {
    fn name(&self) -> &'static str {
        "grep"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["i", "v", "n", "c", "l", "q", "E", "F", "r", "w", "o", "h"], &["e"]);
        let parsed = parse_flags(&spec, ctx.operands());

        let (pattern, files) = match parsed.value("e") {
            Some(p) => (p.to_string(), parsed.positional.clone()),
            None => match parsed.positional.split_first() {
                Some((p, rest)) => (p.clone(), rest.to_vec()),
                None => {
                    return CommandResult::with_exit_code(
                        String::new(),
                        "usage: grep [-ivnclqEFr] pattern [file ...]\n".to_string(),
                        2,
                    );
                }
            },
        };

        let regex = match build_regex(&pattern, &parsed) {
            Ok(regex) => regex,
            Err(message) => return CommandResult::with_exit_code(String::new(), message, 2),
        };

        // Collect (label, content) inputs
        let mut inputs: Vec<(String, String)> = Vec::new();
        if files.is_empty() {
            inputs.push((String::from("(standard input)"), ctx.stdin.clone()));
        } else {
            for file in &files {
                if file == "-" {
                    inputs.push((String::from("(standard input)"), ctx.stdin.clone()));
                    continue;
                }
                let resolved = ctx.resolve(file);
                if parsed.has("r") {
                    if let Err(result) =
                        collect_recursive(&ctx, &resolved, file, &mut inputs).await
                    {
                        return result;
                    }
                    continue;
                }
                match ctx.fs.read_file(&resolved).await {
                    Ok(content) => inputs.push((file.clone(), content)),
                    Err(e) => {
                        return CommandResult::with_exit_code(
                            String::new(),
                            format!("grep: {}: {}\n", file, e.strerror()),
                            2,
                        );
                    }
                }
            }
        }

        let show_names = inputs.len() > 1 && !parsed.has("h");
        let mut stdout = String::new();
        let mut total_matches = 0usize;

        for (label, content) in &inputs {
            let mut file_matches = 0usize;
            for (idx, line) in split_lines(content).iter().enumerate() {
                let matched = regex.is_match(line) != parsed.has("v");
                if !matched {
                    continue;
                }
                file_matches += 1;
                total_matches += 1;
                if parsed.has("q") || parsed.has("c") || parsed.has("l") {
                    continue;
                }
                if parsed.has("o") && !parsed.has("v") {
                    for m in regex.find_iter(line) {
                        if show_names {
                            stdout.push_str(&format!("{}:", label));
                        }
                        stdout.push_str(m.as_str());
                        stdout.push('\n');
                    }
                    continue;
                }
                if show_names {
                    stdout.push_str(&format!("{}:", label));
                }
                if parsed.has("n") {
                    stdout.push_str(&format!("{}:", idx + 1));
                }
                stdout.push_str(line);
                stdout.push('\n');
            }

            if parsed.has("c") {
                if show_names {
                    stdout.push_str(&format!("{}:{}\n", label, file_matches));
                } else {
                    stdout.push_str(&format!("{}\n", file_matches));
                }
            }
            if parsed.has("l") && file_matches > 0 {
                stdout.push_str(&format!("{}\n", label));
            }
        }

        let exit_code = if total_matches > 0 { 0 } else { 1 };
        if parsed.has("q") {
            return CommandResult::with_exit_code(String::new(), String::new(), exit_code);
        }
        CommandResult::with_exit_code(stdout, String::new(), exit_code)
    }
}

fn build_regex(
    pattern: &str,
    parsed: &crate::commands::flags::ParsedFlags,
) -> Result<Regex, String> {
    let mut src = if parsed.has("F") {
        escape_literal(pattern)
    } else if parsed.has("E") {
        pattern.to_string()
    } else {
        // Basic regular expressions: +, ?, |, (, ) are literal unless
        // backslash-escaped
        basic_to_extended(pattern)
    };

    if parsed.has("w") {
        src = format!(r"\b(?:{})\b", src);
    }
    if parsed.has("i") {
        src = format!("(?i){}", src);
    }

    Regex::new(&src).map_err(|_| format!("grep: invalid pattern: {}\n", pattern))
}

fn escape_literal(pattern: &str) -> String {
    let mut out = String::new();
    for c in pattern.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn basic_to_extended(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                match next {
                    // BRE \( \) \+ \? \| are the operators
                    '(' | ')' | '+' | '?' | '|' | '{' | '}' => out.push(next),
                    _ => {
                        out.push('\\');
                        out.push(next);
                    }
                }
                i += 2;
                continue;
            }
            c @ ('+' | '?' | '|' | '(' | ')' | '{' | '}') => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
        i += 1;
    }
    out
}

async fn collect_recursive(
    ctx: &CommandContext,
    resolved: &str,
    display: &str,
    inputs: &mut Vec<(String, String)>,
) -> Result<(), CommandResult> {
    let stat = match ctx.fs.stat(resolved).await {
        Ok(stat) => stat,
        Err(e) => {
            return Err(CommandResult::with_exit_code(
                String::new(),
                format!("grep: {}: {}\n", display, e.strerror()),
                2,
            ));
        }
    };

    if stat.is_file {
        if let Ok(content) = ctx.fs.read_file(resolved).await {
            inputs.push((display.to_string(), content));
        }
        return Ok(());
    }

    if let Ok(entries) = ctx.fs.readdir(resolved).await {
        for entry in entries {
            let child = format!("{}/{}", resolved.trim_end_matches('/'), entry);
            let child_display = format!("{}/{}", display.trim_end_matches('/'), entry);
            Box::pin(collect_recursive(ctx, &child, &child_display, inputs)).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileSystem, InMemoryFs};
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn run(args: &[&str], stdin: &str, fs: Arc<InMemoryFs>) -> CommandResult {
        let ctx = CommandContext {
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin: stdin.to_string(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
            network_enabled: false,
        };
        GrepCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_grep_stdin() {
        let fs = Arc::new(InMemoryFs::new());
        let result = run(&["grep", "b"], "apple\nbanana\ncherry\n", fs).await;
        assert_eq!(result.stdout, "banana\n");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn test_grep_no_match_exits_one() {
        let fs = Arc::new(InMemoryFs::new());
        let result = run(&["grep", "zzz"], "apple\n", fs).await;
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stdout, "");
    }

    #[tokio::test]
    async fn test_grep_invert_and_count() {
        let fs = Arc::new(InMemoryFs::new());
        let result = run(&["grep", "-v", "a"], "apple\nberry\n", fs.clone()).await;
        assert_eq!(result.stdout, "berry\n");
        let result = run(&["grep", "-c", "a"], "apple\nbanana\nberry\n", fs).await;
        assert_eq!(result.stdout, "2\n");
    }

    #[tokio::test]
    async fn test_grep_case_insensitive_and_line_numbers() {
        let fs = Arc::new(InMemoryFs::new());
        let result = run(&["grep", "-in", "APPLE"], "x\napple\n", fs).await;
        assert_eq!(result.stdout, "2:apple\n");
    }

    #[tokio::test]
    async fn test_grep_extended_regex() {
        let fs = Arc::new(InMemoryFs::new());
        let result = run(&["grep", "-E", "^a+$"], "aaa\nb\n", fs).await;
        assert_eq!(result.stdout, "aaa\n");
    }

    #[tokio::test]
    async fn test_grep_fixed_string() {
        let fs = Arc::new(InMemoryFs::new());
        let result = run(&["grep", "-F", "a.b"], "a.b\naxb\n", fs).await;
        assert_eq!(result.stdout, "a.b\n");
    }

    #[tokio::test]
    async fn test_grep_files_with_names() {
        let fs = Arc::new(InMemoryFs::new());
        fs.write_file("/f1", b"match here\n").await.unwrap();
        fs.write_file("/f2", b"nothing\nmatch there\n").await.unwrap();
        let result = run(&["grep", "match", "/f1", "/f2"], "", fs).await;
        assert_eq!(result.stdout, "/f1:match here\n/f2:match there\n");
    }

    #[tokio::test]
    async fn test_grep_quiet() {
        let fs = Arc::new(InMemoryFs::new());
        let result = run(&["grep", "-q", "a"], "abc\n", fs).await;
        assert_eq!(result.stdout, "");
        assert_eq!(result.exit_code, 0);
    }
}
