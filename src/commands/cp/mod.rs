//! cp.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::fs::CpOptions;

pub struct CpCommand;

#[async_trait]
impl Command for CpCommand {
    fn name(&self) -> &'static str {
        "cp"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["r", "R", "a", "f", "v", "p"], &[]);
        let parsed = parse_flags(&spec, ctx.operands());

        if parsed.positional.len() < 2 {
            return CommandResult::error("cp: missing file operand\n".to_string());
        }

        let options =
            CpOptions { recursive: parsed.has("r") || parsed.has("R") || parsed.has("a") };
        let (sources, dest) = parsed.positional.split_at(parsed.positional.len() - 1);
        let dest = ctx.resolve(&dest[0]);

        if sources.len() > 1 && !ctx.fs.stat(&dest).await.map(|s| s.is_directory).unwrap_or(false)
        {
            return CommandResult::error(format!(
                "cp: target '{}' is not a directory\n",
                dest
            ));
        }

        let mut stderr = String::new();
        for source in sources {
            let resolved = ctx.resolve(source);
            if let Err(e) = ctx.fs.cp(&resolved, &dest, &options).await {
                match e {
                    crate::fs::FsError::IsDirectory { .. } if !options.recursive => {
                        stderr.push_str(&format!(
                            "cp: -r not specified; omitting directory '{}'\n",
                            source
                        ));
                    }
                    _ => {
                        stderr.push_str(&format!("cp: cannot copy '{}': {}\n", source, e.strerror()));
                    }
                }
            }
        }

        let exit_code = if stderr.is_empty() { 0 } else { 1 };
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
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
        CpCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_cp_file() {
        let fs = Arc::new(InMemoryFs::new());
        fs.write_file("/src", b"data").await.unwrap();
        assert_eq!(run(&["cp", "/src", "/dst"], fs.clone()).await.exit_code, 0);
        assert_eq!(fs.read_file("/dst").await.unwrap(), "data");
    }

    #[tokio::test]
    async fn test_cp_directory_requires_r() {
        let fs = Arc::new(InMemoryFs::new());
        fs.mkdir("/d", &MkdirOptions::default()).await.unwrap();
        fs.write_file("/d/f", b"x").await.unwrap();
        assert_eq!(run(&["cp", "/d", "/e"], fs.clone()).await.exit_code, 1);
        assert_eq!(run(&["cp", "-r", "/d", "/e"], fs.clone()).await.exit_code, 0);
        assert_eq!(fs.read_file("/e/f").await.unwrap(), "x");
    }
}
