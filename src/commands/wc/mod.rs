//! wc.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct WcCommand;

#[async_trait]
impl Command for WcCommand {
    fn name(&self) -> &'static str {
        "wc"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["l", "w", "c", "m"], &[]);
        let parsed = parse_flags(&spec, ctx.operands());

        let mut rows: Vec<(Counts, Option<String>)> = Vec::new();
        let mut total = Counts::default();

        if parsed.positional.is_empty() {
            let counts = Counts::of(&ctx.stdin);
            rows.push((counts, None));
        } else {
            for path in &parsed.positional {
                let content = if path == "-" {
                    ctx.stdin.clone()
                } else {
                    match ctx.fs.read_file(&ctx.resolve(path)).await {
                        Ok(content) => content,
                        Err(e) => {
                            return CommandResult::error(format!(
                                "wc: {}: {}\n",
                                path,
                                e.strerror()
                            ));
                        }
                    }
                };
                let counts = Counts::of(&content);
                total.add(&counts);
                rows.push((counts, Some(path.clone())));
            }
            if parsed.positional.len() > 1 {
                rows.push((total, Some("total".to_string())));
            }
        }

        let mut out = String::new();
        for (counts, label) in rows {
            out.push_str(&counts.format(&parsed));
            if let Some(label) = label {
                out.push(' ');
                out.push_str(&label);
            }
            out.push('\n');
        }
        CommandResult::success(out)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    lines: usize,
    words: usize,
    bytes: usize,
    chars: usize,
}

impl Counts {
    fn of(text: &str) -> Self {
        Self {
            lines: text.matches('\n').count(),
            words: text.split_whitespace().count(),
            bytes: text.len(),
            chars: text.chars().count(),
        }
    }

    fn add(&mut self, other: &Counts) {
        self.lines += other.lines;
        self.words += other.words;
        self.bytes += other.bytes;
        self.chars += other.chars;
    }

    fn format(&self, parsed: &crate::commands::flags::ParsedFlags) -> String {
        let any = parsed.has("l") || parsed.has("w") || parsed.has("c") || parsed.has("m");
        let mut cols: Vec<usize> = Vec::new();
        if !any || parsed.has("l") {
            cols.push(self.lines);
        }
        if !any || parsed.has("w") {
            cols.push(self.words);
        }
        if parsed.has("m") {
            cols.push(self.chars);
        }
        if !any || parsed.has("c") {
            cols.push(self.bytes);
        }
        if cols.len() == 1 {
            return cols[0].to_string();
        }
        cols.iter().map(|c| format!("{:7}", c)).collect::<Vec<_>>().join(" ")
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
        WcCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_wc_lines_only() {
        let result = run(&["wc", "-l"], "a\nb\nc\n").await;
        assert_eq!(result.stdout, "3\n");
    }

    #[tokio::test]
    async fn test_wc_words_only() {
        let result = run(&["wc", "-w"], "one two three\n").await;
        assert_eq!(result.stdout, "3\n");
    }

    #[tokio::test]
    async fn test_wc_bytes() {
        let result = run(&["wc", "-c"], "abcd").await;
        assert_eq!(result.stdout, "4\n");
    }

    #[tokio::test]
    async fn test_wc_default_three_columns() {
        let result = run(&["wc"], "a b\nc\n").await;
        assert_eq!(result.stdout, "      2       3       6\n");
    }
}
