//! mkdir.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::fs::MkdirOptions;

pub struct MkdirCommand;

#[async_trait]
impl Command for MkdirCommand {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["p", "v"], &["m"]);
        let parsed = parse_flags(&spec, ctx.operands());

        if parsed.positional.is_empty() {
            return CommandResult::error("mkdir: missing operand\n".to_string());
        }

        let options = MkdirOptions { recursive: parsed.has("p") };
        let mut stdout = String::new();
        let mut stderr = String::new();

        for path in &parsed.positional {
            let resolved = ctx.resolve(path);
            match ctx.fs.mkdir(&resolved, &options).await {
                Ok(()) => {
                    if parsed.has("v") {
                        stdout.push_str(&format!("mkdir: created directory '{}'\n", path));
                    }
                }
                Err(e) => {
                    stderr.push_str(&format!(
                        "mkdir: cannot create directory '{}': {}\n",
                        path,
                        e.strerror()
                    ));
                }
            }
        }

        let exit_code = if stderr.is_empty() { 0 } else { 1 };
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileSystem, InMemoryFs};
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn run(args: &[&str], fs: Arc<InMemoryFs>) -> CommandResult {
        let ctx = CommandContext {
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin: String::new(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
            network_enabled: false,
        };
        MkdirCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_mkdir() {
        let fs = Arc::new(InMemoryFs::new());
        let result = run(&["mkdir", "/d"], fs.clone()).await;
        assert_eq!(result.exit_code, 0);
        assert!(fs.exists("/d").await);
    }

    #[tokio::test]
    async fn test_mkdir_p_nested() {
        let fs = Arc::new(InMemoryFs::new());
        assert_eq!(run(&["mkdir", "/a/b/c"], fs.clone()).await.exit_code, 1);
        assert_eq!(run(&["mkdir", "-p", "/a/b/c"], fs.clone()).await.exit_code, 0);
        assert!(fs.exists("/a/b/c").await);
    }
}
