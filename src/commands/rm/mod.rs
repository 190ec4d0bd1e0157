//! rm.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::fs::RmOptions;

pub struct RmCommand;

#[async_trait]
impl Command for RmCommand {
    fn name(&self) -> &'static str {
        "rm"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["r", "R", "f", "v", "d"], &[]);
        let parsed = parse_flags(&spec, ctx.operands());

        if parsed.positional.is_empty() {
            if parsed.has("f") {
                return CommandResult::success(String::new());
            }
            return CommandResult::error("rm: missing operand\n".to_string());
        }

        let options = RmOptions {
            recursive: parsed.has("r") || parsed.has("R"),
            force: parsed.has("f"),
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        for path in &parsed.positional {
            let resolved = ctx.resolve(path);
            match ctx.fs.rm(&resolved, &options).await {
                Ok(()) => {
                    if parsed.has("v") {
                        stdout.push_str(&format!("removed '{}'\n", path));
                    }
                }
                Err(e) => {
                    stderr.push_str(&format!("rm: cannot remove '{}': {}\n", path, e.strerror()));
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
    use crate::fs::{FileSystem, InMemoryFs, MkdirOptions};
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
        RmCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_rm_file() {
        let fs = Arc::new(InMemoryFs::new());
        fs.write_file("/f", b"").await.unwrap();
        assert_eq!(run(&["rm", "/f"], fs.clone()).await.exit_code, 0);
        assert!(!fs.exists("/f").await);
    }

    #[tokio::test]
    async fn test_rm_directory_needs_r() {
        let fs = Arc::new(InMemoryFs::new());
        fs.mkdir("/d", &MkdirOptions::default()).await.unwrap();
        assert_eq!(run(&["rm", "/d"], fs.clone()).await.exit_code, 1);
        assert_eq!(run(&["rm", "-r", "/d"], fs.clone()).await.exit_code, 0);
    }

    #[tokio::test]
    async fn test_rm_missing_with_force() {
        let fs = Arc::new(InMemoryFs::new());
        assert_eq!(run(&["rm", "/nope"], fs.clone()).await.exit_code, 1);
        assert_eq!(run(&["rm", "-f", "/nope"], fs).await.exit_code, 0);
    }
}
