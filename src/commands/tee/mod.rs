//! tee.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct TeeCommand;

#[async_trait]
impl Command for TeeCommand {
    fn name(&self) -> &'static str {
        "tee"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["a", "i"], &[]);
        let parsed = parse_flags(&spec, ctx.operands());

        let mut stderr = String::new();
        for path in &parsed.positional {
            let resolved = ctx.resolve(path);
            let outcome = if parsed.has("a") {
                ctx.fs.append_file(&resolved, ctx.stdin.as_bytes()).await
            } else {
                ctx.fs.write_file(&resolved, ctx.stdin.as_bytes()).await
            };
            if let Err(e) = outcome {
                stderr.push_str(&format!("tee: {}: {}\n", path, e.strerror()));
            }
        }

        let exit_code = if stderr.is_empty() { 0 } else { 1 };
        CommandResult::with_exit_code(ctx.stdin.clone(), stderr, exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileSystem, InMemoryFs};
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn run(args: &[&str], stdin: &str, fs: Arc<InMemoryFs>) -> CommandResult {
        let ctx = CommandContext {
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin: stdin.to_string(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
            network_enabled: false,
        };
        TeeCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_tee_writes_and_passes_through() {
        let fs = Arc::new(InMemoryFs::new());
        let result = run(&["tee", "/out"], "data\n", fs.clone()).await;
        assert_eq!(result.stdout, "data\n");
        assert_eq!(fs.read_file("/out").await.unwrap(), "data\n");
    }

    #[tokio::test]
    async fn test_tee_append() {
        let fs = Arc::new(InMemoryFs::new());
        fs.write_file("/log", b"old\n").await.unwrap();
        run(&["tee", "-a", "/log"], "new\n", fs.clone()).await;
        assert_eq!(fs.read_file("/log").await.unwrap(), "old\nnew\n");
    }
}
