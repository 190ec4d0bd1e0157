//! tail.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::commands::utils::{read_inputs, split_lines};

pub struct TailCommand;

#[async_trait]
impl Command for TailCommand {
    fn name(&self) -> &'static str {
        "tail"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["q", "f"], &["n", "c"])
            .with_default("n", "10")
            .with_number_alias("n");
        let parsed = parse_flags(&spec, ctx.operands());

        let content = match read_inputs(&ctx, "tail", &parsed.positional).await {
            Ok(content) => content,
            Err(result) => return result,
        };

        if parsed.has("c") {
            let count: usize = parsed.value_or("c", "0").parse().unwrap_or(0);
            let chars: Vec<char> = content.chars().collect();
            let start = chars.len().saturating_sub(count);
            return CommandResult::success(chars[start..].iter().collect());
        }

        let spec_value = parsed.value_or("n", "10");
        // +N starts output at line N
        if let Some(from) = spec_value.strip_prefix('+') {
            let from: usize = from.parse().unwrap_or(1);
            let lines = split_lines(&content);
            let mut out = String::new();
            for line in lines.iter().skip(from.saturating_sub(1)) {
                out.push_str(line);
                out.push('\n');
            }
            return CommandResult::success(out);
        }

        let count: usize = match spec_value.parse() {
            Ok(n) => n,
            Err(_) => {
                return CommandResult::error(format!(
                    "tail: invalid number of lines: '{}'\n",
                    spec_value
                ));
            }
        };

        let lines = split_lines(&content);
        let start = lines.len().saturating_sub(count);
        let mut out = String::new();
        for line in &lines[start..] {
            out.push_str(line);
            out.push('\n');
        }
        CommandResult::success(out)
    }
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
        TailCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_tail_default() {
        let input: String = (1..=15).map(|i| format!("{}\n", i)).collect();
        let result = run(&["tail"], &input).await;
        assert_eq!(result.stdout.lines().count(), 10);
        assert!(result.stdout.ends_with("15\n"));
    }

    #[tokio::test]
    async fn test_tail_n() {
        let result = run(&["tail", "-n", "2"], "a\nb\nc\n").await;
        assert_eq!(result.stdout, "b\nc\n");
        let result = run(&["tail", "-1"], "a\nb\nc\n").await;
        assert_eq!(result.stdout, "c\n");
    }

    #[tokio::test]
    async fn test_tail_plus_n() {
        let result = run(&["tail", "-n", "+2"], "a\nb\nc\n").await;
        assert_eq!(result.stdout, "b\nc\n");
    }
}
