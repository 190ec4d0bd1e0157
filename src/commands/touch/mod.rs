//! touch.

use async_trait::async_trait;
use std::time::SystemTime;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct TouchCommand;

#[async_trait]
impl Command for TouchCommand {
    fn name(&self) -> &'static str {
        "touch"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["a", "m", "c"], &[]);
        let parsed = parse_flags(&spec, ctx.operands());

        if parsed.positional.is_empty() {
            return CommandResult::error("touch: missing file operand\n".to_string());
        }

        let mut stderr = String::new();
        for path in &parsed.positional {
            let resolved = ctx.resolve(path);
            if ctx.fs.exists(&resolved).await {
                let _ = ctx.fs.utimes(&resolved, SystemTime::now()).await;
            } else if parsed.has("c") {
                // -c: never create
            } else if let Err(e) = ctx.fs.write_file(&resolved, b"").await {
                stderr.push_str(&format!("touch: cannot touch '{}': {}\n", path, e.strerror()));
            }
        }

        let exit_code = if stderr.is_empty() { 0 } else { 1 };
        CommandResult::with_exit_code(String::new(), stderr, exit_code)
    }
}
