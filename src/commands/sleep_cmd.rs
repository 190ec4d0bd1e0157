//! sleep.
//!
//! Validates its operand but does not block: wall-clock time is the
//! embedder's business, not the sandbox's.

use async_trait::async_trait;

use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct SleepCommand;

#[async_trait]
impl Command for SleepCommand {
    fn name(&self) -> &'static str {
        "sleep"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let operand = match ctx.operands().first() {
            Some(operand) => operand,
            None => return CommandResult::error("sleep: missing operand\n".to_string()),
        };

        let trimmed = operand
            .trim_end_matches(|c| matches!(c, 's' | 'm' | 'h' | 'd'));
        if trimmed.parse::<f64>().is_err() {
            return CommandResult::error(format!(
                "sleep: invalid time interval '{}'\n",
                operand
            ));
        }

        CommandResult::success(String::new())
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
        SleepCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_sleep_validates() {
        assert_eq!(run(&["sleep", "1"]).await.exit_code, 0);
        assert_eq!(run(&["sleep", "0.5"]).await.exit_code, 0);
        assert_eq!(run(&["sleep", "2s"]).await.exit_code, 0);
        assert_eq!(run(&["sleep", "abc"]).await.exit_code, 1);
        assert_eq!(run(&["sleep"]).await.exit_code, 1);
    }
}
