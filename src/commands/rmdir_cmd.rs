//! rmdir.

use async_trait::async_trait;

use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::fs::RmOptions;

pub struct RmdirCommand;

#[async_trait]
impl Command for RmdirCommand {
    fn name(&self) -> &'static str {
        "rmdir"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let operands = ctx.operands();
        if operands.is_empty() {
            return CommandResult::error("rmdir: missing operand\n".to_string());
        }

        let mut stderr = String::new();
        for path in operands {
            let resolved = ctx.resolve(path);
            match ctx.fs.stat(&resolved).await {
                Ok(stat) if stat.is_directory => {
                    match ctx.fs.readdir(&resolved).await {
                        Ok(entries) if entries.is_empty() => {
                            let _ = ctx
                                .fs
                                .rm(&resolved, &RmOptions { recursive: true, force: false })
                                .await;
                        }
                        Ok(_) => {
                            stderr.push_str(&format!(
                                "rmdir: failed to remove '{}': Directory not empty\n",
                                path
                            ));
                        }
                        Err(e) => {
                            stderr.push_str(&format!(
                                "rmdir: failed to remove '{}': {}\n",
                                path,
                                e.strerror()
                            ));
                        }
                    }
                }
                Ok(_) => {
                    stderr.push_str(&format!(
                        "rmdir: failed to remove '{}': Not a directory\n",
                        path
                    ));
                }
                Err(e) => {
                    stderr.push_str(&format!(
                        "rmdir: failed to remove '{}': {}\n",
                        path,
                        e.strerror()
                    ));
                }
            }
        }

        let exit_code = if stderr.is_empty() { 0 } else { 1 };
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}
