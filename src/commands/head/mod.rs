//! head.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::commands::utils::{read_inputs, split_lines};

pub struct HeadCommand;

#[async_trait]
impl Command for HeadCommand {
    fn name(&self) -> &'static str {
        "head"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["q", "v"], &["n", "c"])
            .with_default("n", "10")
            .with_number_alias("n");
        let parsed = parse_flags(&spec, ctx.operands());

        let content = match read_inputs(&ctx, "head", &parsed.positional).await {
            Ok(content) => content,
            Err(result) => return result,
        };

        if parsed.has("c") {
            let count: usize = parsed.value_or("c", "0").parse().unwrap_or(0);
            let out: String = content.chars().take(count).collect();
            return CommandResult::success(out);
        }

        let count: usize = match parsed.value_or("n", "10").parse() {
            Ok(n) => n,
            Err(_) => {
                return CommandResult::error(format!(
                    "head: invalid number of lines: '{}'\n",
                    parsed.value_or("n", "10")
                ));
            }
        };

        let lines = split_lines(&content);
        let mut out = String::new();
        for line in lines.iter().take(count) {
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
        HeadCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_head_default_ten() {
        let input: String = (1..=15).map(|i| format!("{}\n", i)).collect();
        let result = run(&["head"], &input).await;
        assert_eq!(result.stdout.lines().count(), 10);
        assert!(result.stdout.starts_with("1\n"));
    }

    #[tokio::test]
    async fn test_head_n_flag() {
        let result = run(&["head", "-n", "2"], "a\nb\nc\n").await;
        assert_eq!(result.stdout, "a\nb\n");
    }

    #[tokio::test]
    async fn test_head_numeric_shorthand() {
        let result = run(&["head", "-2"], "a\nb\nc\n").await;
        assert_eq!(result.stdout, "a\nb\n");
    }

    #[tokio::test]
    async fn test_head_bytes() {
        let result = run(&["head", "-c", "3"], "abcdef").await;
        assert_eq!(result.stdout, "abc");
    }
}
