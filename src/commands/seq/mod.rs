//! seq.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct SeqCommand;

#[async_trait]
impl Command for SeqCommand {
    fn name(&self) -> &'static str {
        "seq"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["w"], &["s"]);
        let parsed = parse_flags(&spec, ctx.operands());
        let separator = parsed.value_or("s", "\n").to_string();

        let numbers: Vec<i64> = match parsed
            .positional
            .iter()
            .map(|s| s.parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(numbers) => numbers,
            Err(_) => {
                return CommandResult::error("seq: invalid numeric argument\n".to_string());
            }
        };

        let (first, increment, last) = match numbers.as_slice() {
            [last] => (1, 1, *last),
            [first, last] => (*first, if first <= last { 1 } else { -1 }, *last),
            [first, increment, last] => (*first, *increment, *last),
            _ => {
                return CommandResult::error("usage: seq [first [incr]] last\n".to_string());
            }
        };

        if increment == 0 {
            return CommandResult::error("seq: zero increment\n".to_string());
        }

        let mut values: Vec<String> = Vec::new();
        let mut n = first;
        if increment > 0 {
            while n <= last {
                values.push(n.to_string());
                n += increment;
            }
        } else {
            while n >= last {
                values.push(n.to_string());
                n += increment;
            }
        }

        if parsed.has("w") {
            let width = values.iter().map(|v| v.len()).max().unwrap_or(0);
            for value in &mut values {
                *value = format!("{:0>width$}", value, width = width);
            }
        }

        if values.is_empty() {
            return CommandResult::success(String::new());
        }
        CommandResult::success(format!("{}\n", values.join(&separator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn run(args: &[&str]) -> CommandResult {
        let ctx = CommandContext {
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin: String::new(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs: Arc::new(InMemoryFs::new()),
            exec_fn: None,
            fetch_fn: None,
            network_enabled: false,
        };
        SeqCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_seq_single_operand() {
        assert_eq!(run(&["seq", "3"]).await.stdout, "1\n2\n3\n");
    }

    #[tokio::test]
    async fn test_seq_first_last() {
        assert_eq!(run(&["seq", "2", "4"]).await.stdout, "2\n3\n4\n");
        assert_eq!(run(&["seq", "3", "1"]).await.stdout, "3\n2\n1\n");
    }

    #[tokio::test]
    async fn test_seq_increment() {
        assert_eq!(run(&["seq", "1", "2", "7"]).await.stdout, "1\n3\n5\n7\n");
        assert_eq!(run(&["seq", "10", "-5", "0"]).await.stdout, "10\n5\n0\n");
    }

    #[tokio::test]
    async fn test_seq_separator() {
        assert_eq!(run(&["seq", "-s", ",", "3"]).await.stdout, "1,2,3\n");
    }

    #[tokio::test]
    async fn test_seq_equal_width() {
        assert_eq!(run(&["seq", "-w", "8", "10"]).await.stdout, "08\n09\n10\n");
    }
}
