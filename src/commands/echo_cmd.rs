//! echo, registry edition.
//!
//! The interpreter dispatches echo as a builtin; this registry copy
//! serves nested execution contexts (xargs default command).

use async_trait::async_trait;

use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct EchoCommand;

#[async_trait]
impl Command for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let mut operands = ctx.operands();
        let mut newline = true;
        if operands.first().map(|s| s.as_str()) == Some("-n") {
            newline = false;
            operands = &operands[1..];
        }
        let mut out = operands.join(" ");
        if newline {
            out.push('\n');
        }
        CommandResult::success(out)
    }
}
