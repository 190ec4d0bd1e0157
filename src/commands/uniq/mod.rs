//! uniq.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::commands::utils::{read_inputs, split_lines};

pub struct UniqCommand;

#[async_trait]
impl Command for UniqCommand {
    fn name(&self) -> &'static str {
        "uniq"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["c", "d", "u", "i"], &[]);
        let parsed = parse_flags(&spec, ctx.operands());

        let content = match read_inputs(&ctx, "uniq", &parsed.positional).await {
            Ok(content) => content,
            Err(result) => return result,
        };

        let lines = split_lines(&content);
        let mut groups: Vec<(usize, &str)> = Vec::new();
        for line in lines {
            let same = groups.last().map_or(false, |(_, prev)| {
                if parsed.has("i") {
                    prev.eq_ignore_ascii_case(line)
                } else {
                    *prev == line
                }
            });
            if same {
                groups.last_mut().unwrap().0 += 1;
            } else {
                groups.push((1, line));
            }
        }

        let mut out = String::new();
        for (count, line) in groups {
            if parsed.has("d") && count < 2 {
                continue;
            }
            if parsed.has("u") && count > 1 {
                continue;
            }
            if parsed.has("c") {
                out.push_str(&format!("{:7} {}\n", count, line));
            } else {
                out.push_str(line);
                out.push('\n');
            }
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
        UniqCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_uniq_adjacent() {
        let result = run(&["uniq"], "a\na\nb\na\n").await;
        assert_eq!(result.stdout, "a\nb\na\n");
    }

    #[tokio::test]
    async fn test_uniq_count() {
        let result = run(&["uniq", "-c"], "a\na\nb\n").await;
        assert_eq!(result.stdout, "      2 a\n      1 b\n");
    }

    #[tokio::test]
    async fn test_uniq_duplicates_only() {
        let result = run(&["uniq", "-d"], "a\na\nb\n").await;
        assert_eq!(result.stdout, "a\n");
    }

    #[tokio::test]
    async fn test_uniq_unique_only() {
        let result = run(&["uniq", "-u"], "a\na\nb\n").await;
        assert_eq!(result.stdout, "b\n");
    }
}
