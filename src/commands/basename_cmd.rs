//! basename.

use async_trait::async_trait;

use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::fs;

pub struct BasenameCommand;

#[async_trait]
impl Command for BasenameCommand {
    fn name(&self) -> &'static str {
        "basename"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let operands = ctx.operands();
        let path = match operands.first() {
            Some(path) => path,
            None => return CommandResult::error("usage: basename path [suffix]\n".to_string()),
        };

        let mut base = if path == "/" {
            "/".to_string()
        } else {
            path.trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or("")
                .to_string()
        };
        if base.is_empty() {
            base = fs::basename(path);
        }

        if let Some(suffix) = operands.get(1) {
            if base.len() > suffix.len() && base.ends_with(suffix.as_str()) {
                base.truncate(base.len() - suffix.len());
            }
        }

        CommandResult::success(format!("{}\n", base))
    }
}
