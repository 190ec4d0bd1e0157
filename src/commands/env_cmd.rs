//! env.

use async_trait::async_trait;

use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct EnvCommand;

#[async_trait]
impl Command for EnvCommand {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut names: Vec<&String> = ctx.env.keys().collect();
        names.sort();
        let mut out = String::new();
        for name in names {
            out.push_str(&format!("{}={}\n", name, ctx.env[name]));
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

    #[tokio::test]
    async fn test_env_prints_sorted() {
        let mut env = HashMap::new();
        env.insert("B".to_string(), "2".to_string());
        env.insert("A".to_string(), "1".to_string());
        let ctx = CommandContext {
            args: vec!["env".to_string()],
            stdin: String::new(),
            cwd: "/".to_string(),
            env,
            fs: Arc::new(InMemoryFs::new()),
            exec_fn: None,
            fetch_fn: None,
            network_enabled: false,
        };
        let result = EnvCommand.execute(ctx).await;
        assert_eq!(result.stdout, "A=1\nB=2\n");
    }
}
