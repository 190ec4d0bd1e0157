//! mv.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct MvCommand;

#[async_trait]
impl Command for MvCommand {
    fn name(&self) -> &'static str {
        "mv"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["f", "v", "n"], &[]);
        let parsed = parse_flags(&spec, ctx.operands());

        if parsed.positional.len() < 2 {
            return CommandResult::error("mv: missing file operand\n".to_string());
        }

        let (sources, dest) = parsed.positional.split_at(parsed.positional.len() - 1);
        let dest = ctx.resolve(&dest[0]);

        if sources.len() > 1 && !ctx.fs.stat(&dest).await.map(|s| s.is_directory).unwrap_or(false)
        {
            return CommandResult::error(format!("mv: target '{}' is not a directory\n", dest));
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        for source in sources {
            let resolved = ctx.resolve(source);
            match ctx.fs.mv(&resolved, &dest).await {
                Ok(()) => {
                    if parsed.has("v") {
                        stdout.push_str(&format!("renamed '{}' -> '{}'\n", source, dest));
                    }
                }
                Err(e) => {
                    stderr.push_str(&format!(
                        "mv: cannot move '{}': {}\n",
                        source,
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
        MvCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_mv_rename() {
        let fs = Arc::new(InMemoryFs::new());
        fs.write_file("/a", b"x").await.unwrap();
        assert_eq!(run(&["mv", "/a", "/b"], fs.clone()).await.exit_code, 0);
        assert!(!fs.exists("/a").await);
        assert_eq!(fs.read_file("/b").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_mv_into_directory() {
        let fs = Arc::new(InMemoryFs::new());
        fs.write_file("/a", b"x").await.unwrap();
        fs.mkdir("/d", &MkdirOptions::default()).await.unwrap();
        run(&["mv", "/a", "/d"], fs.clone()).await;
        assert_eq!(fs.read_file("/d/a").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_mv_missing_source() {
        let fs = Arc::new(InMemoryFs::new());
        assert_eq!(run(&["mv", "/nope", "/x"], fs).await.exit_code, 1);
    }
}
