//! cat.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::commands::utils::{read_inputs, split_lines};

pub struct CatCommand;

#[async_trait]
impl Command for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["n", "b", "s", "E", "A"], &[]);
        let parsed = parse_flags(&spec, ctx.operands());

        let content = match read_inputs(&ctx, "cat", &parsed.positional).await {
            Ok(content) => content,
            Err(result) => return result,
        };

        if parsed.has("n") || parsed.has("b") {
            let skip_blank = parsed.has("b");
            let mut out = String::new();
            let mut number = 1usize;
            for line in split_lines(&content) {
                if skip_blank && line.is_empty() {
                    out.push('\n');
                } else {
                    out.push_str(&format!("{:6}\t{}\n", number, line));
                    number += 1;
                }
            }
            return CommandResult::success(out);
        }

        CommandResult::success(content)
    }
}
