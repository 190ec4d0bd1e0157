//! sort.

use async_trait::async_trait;
use std::cmp::Ordering;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::commands::utils::{join_lines, read_inputs, split_lines};

pub struct SortCommand;

#[async_trait]
impl Command for SortCommand {
    fn name(&self) -> &'static str {
        "sort"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["r", "n", "u", "f", "V"], &["k", "t"]);
        let parsed = parse_flags(&spec, ctx.operands());

        let content = match read_inputs(&ctx, "sort", &parsed.positional).await {
            Ok(content) => content,
            Err(result) => return result,
        };

        let mut lines: Vec<String> =
            split_lines(&content).into_iter().map(String::from).collect();

        let numeric = parsed.has("n");
        let fold_case = parsed.has("f");
        let key_field: Option<usize> =
            parsed.value("k").and_then(|k| k.split('.').next()?.parse::<usize>().ok());
        let separator = parsed.value("t").and_then(|t| t.chars().next());

        lines.sort_by(|a, b| {
            let ka = sort_key(a, key_field, separator);
            let kb = sort_key(b, key_field, separator);
            compare(&ka, &kb, numeric, fold_case)
        });

        if parsed.has("r") {
            lines.reverse();
        }
        if parsed.has("u") {
            lines.dedup();
        }

        CommandResult::success(join_lines(&lines))
    }
}

fn sort_key(line: &str, field: Option<usize>, separator: Option<char>) -> String {
    match field {
        None => line.to_string(),
        Some(n) => {
            let fields: Vec<&str> = match separator {
                Some(sep) => line.split(sep).collect(),
                None => line.split_whitespace().collect(),
            };
            fields.get(n.saturating_sub(1)).copied().unwrap_or("").to_string()
        }
    }
}

fn compare(a: &str, b: &str, numeric: bool, fold_case: bool) -> Ordering {
    if numeric {
        let na = leading_number(a);
        let nb = leading_number(b);
        return na.partial_cmp(&nb).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b));
    }
    if fold_case {
        return a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b));
    }
    a.cmp(b)
}

fn leading_number(s: &str) -> f64 {
    let trimmed = s.trim_start();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    trimmed[..end].parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn run(args: &[&str], stdin: &str) -> CommandResult {
        let ctx = CommandContext {
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin: stdin.to_string(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs: Arc::new(InMemoryFs::new()),
            exec_fn: None,
            fetch_fn: None,
            network_enabled: false,
        };
        SortCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_sort_basic() {
        let result = run(&["sort"], "c\na\nb\n").await;
        assert_eq!(result.stdout, "a\nb\nc\n");
    }

    #[tokio::test]
    async fn test_sort_reverse() {
        let result = run(&["sort", "-r"], "a\nc\nb\n").await;
        assert_eq!(result.stdout, "c\nb\na\n");
    }

    #[tokio::test]
    async fn test_sort_numeric() {
        let result = run(&["sort", "-n"], "10\n2\n1\n").await;
        assert_eq!(result.stdout, "1\n2\n10\n");
    }

    #[tokio::test]
    async fn test_sort_unique() {
        let result = run(&["sort", "-u"], "b\na\nb\n").await;
        assert_eq!(result.stdout, "a\nb\n");
    }

    #[tokio::test]
    async fn test_sort_by_key() {
        let result = run(&["sort", "-k", "2"], "x b\ny a\n").await;
        assert_eq!(result.stdout, "y a\nx b\n");
    }

    #[tokio::test]
    async fn test_sort_with_separator() {
        let result = run(&["sort", "-t", ":", "-k", "2", "-n"], "a:3\nb:1\nc:2\n").await;
        assert_eq!(result.stdout, "b:1\nc:2\na:3\n");
    }
}
