//! rev.

use async_trait::async_trait;

use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::commands::utils::{read_inputs, split_lines};

pub struct RevCommand;

#[async_trait]
impl Command for RevCommand {
    fn name(&self) -> &'static str {
        "rev"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let operands = ctx.operands().to_vec();
        let content = match read_inputs(&ctx, "rev", &operands).await {
            Ok(content) => content,
            Err(result) => return result,
        };

        let mut out = String::new();
        for line in split_lines(&content) {
            out.extend(line.chars().rev());
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
        RevCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_rev_reverses_each_line() {
        let result = run(&["rev"], "abc\nxy\n").await;
        assert_eq!(result.stdout, "cba\nyx\n");
    }
}
