//! tac.

use async_trait::async_trait;

use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::commands::utils::{read_inputs, split_lines};

pub struct TacCommand;

#[async_trait]
impl Command for TacCommand {
    fn name(&self) -> &'static str {
        "tac"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let operands = ctx.operands().to_vec();
        let content = match read_inputs(&ctx, "tac", &operands).await {
            Ok(content) => content,
            Err(result) => return result,
        };

        let mut out = String::new();
        for line in split_lines(&content).iter().rev() {
            out.push_str(line);
            out.push('\n');
        }
        CommandResult::success(out)
    }
}
