//! dirname.

use async_trait::async_trait;

use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct DirnameCommand;

#[async_trait]
impl Command for DirnameCommand {
    fn name(&self) -> &'static str {
        "dirname"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let operands = ctx.operands();
        if operands.is_empty() {
            return CommandResult::error("usage: dirname path\n".to_string());
        }

        let mut out = String::new();
        for path in operands {
            let trimmed = if path == "/" { "/" } else { path.trim_end_matches('/') };
            let dir = match trimmed.rfind('/') {
                Some(0) => "/",
                Some(idx) => &trimmed[..idx],
                None => ".",
            };
            out.push_str(dir);
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

    async fn run(args: &[&str]) -> String {
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
        DirnameCommand.execute(ctx).await.stdout
    }

    #[tokio::test]
    async fn test_dirname() {
        assert_eq!(run(&["dirname", "/a/b/c"]).await, "/a/b\n");
        assert_eq!(run(&["dirname", "/a"]).await, "/\n");
        assert_eq!(run(&["dirname", "relative"]).await, ".\n");
        assert_eq!(run(&["dirname", "/"]).await, "/\n");
    }
}
