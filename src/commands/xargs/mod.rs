//! xargs.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct XargsCommand;

#[async_trait]
impl Command for XargsCommand {
    fn name(&self) -> &'static str {
        "xargs"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["r", "t", "0"], &["n", "I", "d"]);
        let parsed = parse_flags(&spec, ctx.operands());

        let exec_fn = match &ctx.exec_fn {
            Some(exec_fn) => exec_fn,
            None => {
                return CommandResult::error("xargs: command execution unavailable\n".to_string());
            }
        };

        let items: Vec<String> = if parsed.has("0") {
            ctx.stdin.split('\0').filter(|s| !s.is_empty()).map(String::from).collect()
        } else if let Some(delim) = parsed.value("d") {
            let delim = delim.replace("\\n", "\n").replace("\\t", "\t");
            ctx.stdin
                .split(delim.as_str())
                .filter(|s| !s.is_empty() && *s != "\n")
                .map(|s| s.trim_end_matches('\n').to_string())
                .collect()
        } else {
            ctx.stdin.split_whitespace().map(String::from).collect()
        };

        if items.is_empty() && parsed.has("r") {
            return CommandResult::success(String::new());
        }

        let template: Vec<String> = if parsed.positional.is_empty() {
            vec!["echo".to_string()]
        } else {
            parsed.positional.clone()
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        // -I: one invocation per item, {} replaced everywhere
        if let Some(placeholder) = parsed.value("I") {
            for item in &items {
                let argv: Vec<String> = template
                    .iter()
                    .map(|part| part.replace(placeholder, item))
                    .collect();
                if parsed.has("t") {
                    stderr.push_str(&format!("{}\n", argv.join(" ")));
                }
                let result = exec_fn(argv, String::new()).await;
                stdout.push_str(&result.stdout);
                stderr.push_str(&result.stderr);
                if result.exit_code != 0 {
                    exit_code = 123;
                }
            }
            return CommandResult::with_exit_code(stdout, stderr, exit_code);
        }

        let batch_size: usize = parsed
            .value("n")
            .and_then(|n| n.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(items.len().max(1));

        let mut batches: Vec<&[String]> = items.chunks(batch_size).collect();
        if batches.is_empty() {
            batches.push(&[]);
        }

        for batch in batches {
            let mut argv = template.clone();
            argv.extend(batch.iter().cloned());
            if parsed.has("t") {
                stderr.push_str(&format!("{}\n", argv.join(" ")));
            }
            let result = exec_fn(argv, String::new()).await;
            stdout.push_str(&result.stdout);
            stderr.push_str(&result.stderr);
            if result.exit_code != 0 {
                exit_code = 123;
            }
        }

        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}
