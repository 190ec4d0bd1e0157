//! base64.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::commands::utils::read_inputs;

pub struct Base64Command;

#[async_trait]
impl Command for Base64Command {
    fn name(&self) -> &'static str {
        "base64"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["d", "i"], &["w"]);
        let parsed = parse_flags(&spec, ctx.operands());

        let content = match read_inputs(&ctx, "base64", &parsed.positional).await {
            Ok(content) => content,
            Err(result) => return result,
        };

        if parsed.has("d") {
            let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            return match STANDARD.decode(cleaned.as_bytes()) {
                Ok(bytes) => CommandResult::success(String::from_utf8_lossy(&bytes).into_owned()),
                Err(_) => CommandResult::error("base64: invalid input\n".to_string()),
            };
        }

        let encoded = STANDARD.encode(content.as_bytes());
        let wrap: usize = parsed.value_or("w", "76").parse().unwrap_or(76);
        if wrap == 0 {
            return CommandResult::success(format!("{}\n", encoded));
        }
        let mut out = String::new();
        let chars: Vec<char> = encoded.chars().collect();
        for chunk in chars.chunks(wrap) {
            out.extend(chunk.iter());
            out.push('\n');
        }
        if out.is_empty() {
            out.push('\n');
        }
        CommandResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn run(args: &[&str], stdin: &str) -> CommandResult {
        let ctx = CommandContext {
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin: stdin.to_string(),
            cwd: "/".to_string(),
            env: HashMap::new(),
            fs: Arc::new(InMemoryFs::new()),
            exec_fn: None,
            fetch_fn: None,
            network_enabled: false,
        };
        Base64Command.execute(ctx).await
    }

    #[tokio::test]
    async fn test_base64_round_trip() {
        let encoded = run(&["base64"], "hello").await;
        assert_eq!(encoded.stdout, "aGVsbG8=\n");
        let decoded = run(&["base64", "-d"], &encoded.stdout).await;
        assert_eq!(decoded.stdout, "hello");
    }

    #[tokio::test]
    async fn test_base64_invalid_input() {
        let result = run(&["base64", "-d"], "!!!\n").await;
        assert_eq!(result.exit_code, 1);
    }
}
