//! which.

use async_trait::async_trait;

use crate::commands::types::{Command, CommandContext, CommandResult};

/// Builtins report as found even though they never reach the registry.
const SHELL_BUILTINS: &[&str] = &[
    "cd", "pwd", "echo", "printf", "export", "unset", "read", "exit", "return", "break",
    "continue", "true", "false", "set", "shift", "test", "let", "local", "source", "eval", "type",
];

lazy_static::lazy_static! {
    static ref REGISTRY_NAMES: Vec<String> = crate::commands::default_registry()
        .names()
        .iter()
        .map(|s| s.to_string())
        .collect();
}

pub struct WhichCommand;

#[async_trait]
impl Command for WhichCommand {
    fn name(&self) -> &'static str {
        "which"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut out = String::new();
        let mut exit_code = 0;

        for name in ctx.operands() {
            if SHELL_BUILTINS.contains(&name.as_str())
                || REGISTRY_NAMES.iter().any(|n| n == name)
            {
                out.push_str(&format!("/usr/bin/{}\n", name));
            } else {
                exit_code = 1;
            }
        }

        CommandResult::with_exit_code(out, String::new(), exit_code)
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
        WhichCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_which_finds_commands_and_builtins() {
        let result = run(&["which", "cat", "cd"]).await;
        assert_eq!(result.stdout, "/usr/bin/cat\n/usr/bin/cd\n");
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn test_which_missing() {
        let result = run(&["which", "no-such-tool"]).await;
        assert_eq!(result.exit_code, 1);
    }
}
