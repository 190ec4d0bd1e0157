//! cut.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::commands::utils::{read_inputs, split_lines};

pub struct CutCommand;

#[async_trait]
impl Command for CutCommand {
    fn name(&self) -> &'static str {
        "cut"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["s"], &["d", "f", "c", "b"]);
        let parsed = parse_flags(&spec, ctx.operands());

        let content = match read_inputs(&ctx, "cut", &parsed.positional).await {
            Ok(content) => content,
            Err(result) => return result,
        };

        if let Some(field_spec) = parsed.value("f") {
            let ranges = match parse_ranges(field_spec) {
                Some(ranges) => ranges,
                None => {
                    return CommandResult::error(format!(
                        "cut: invalid field list: '{}'\n",
                        field_spec
                    ));
                }
            };
            let delimiter = parsed.value_or("d", "\t").chars().next().unwrap_or('\t');
            let only_delimited = parsed.has("s");

            let mut out = String::new();
            for line in split_lines(&content) {
                if !line.contains(delimiter) {
                    if !only_delimited {
                        out.push_str(line);
                        out.push('\n');
                    }
                    continue;
                }
                let fields: Vec<&str> = line.split(delimiter).collect();
                let selected: Vec<&str> = (1..=fields.len())
                    .filter(|n| in_ranges(&ranges, *n))
                    .map(|n| fields[n - 1])
                    .collect();
                out.push_str(&selected.join(&delimiter.to_string()));
                out.push('\n');
            }
            return CommandResult::success(out);
        }

        if let Some(char_spec) = parsed.value("c").or_else(|| parsed.value("b")) {
            let ranges = match parse_ranges(char_spec) {
                Some(ranges) => ranges,
                None => {
                    return CommandResult::error(format!(
                        "cut: invalid character list: '{}'\n",
                        char_spec
                    ));
                }
            };
            let mut out = String::new();
            for line in split_lines(&content) {
                let chars: Vec<char> = line.chars().collect();
                let selected: String = (1..=chars.len())
                    .filter(|n| in_ranges(&ranges, *n))
                    .map(|n| chars[n - 1])
                    .collect();
                out.push_str(&selected);
                out.push('\n');
            }
            return CommandResult::success(out);
        }

        CommandResult::error("usage: cut -f list [-d delim] [-s] | -c list\n".to_string())
    }
}

/// A cut list: N, N-, -M, N-M, comma separated.
#[derive(Debug, Clone, Copy)]
struct Range {
    from: usize,
    to: usize,
}

fn parse_ranges(spec: &str) -> Option<Vec<Range>> {
    let mut ranges = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            return None;
        }
        if let Some(rest) = part.strip_prefix('-') {
            ranges.push(Range { from: 1, to: rest.parse().ok()? });
        } else if let Some(rest) = part.strip_suffix('-') {
            ranges.push(Range { from: rest.parse().ok()?, to: usize::MAX });
        } else if let Some((a, b)) = part.split_once('-') {
            ranges.push(Range { from: a.parse().ok()?, to: b.parse().ok()? });
        } else {
            let n: usize = part.parse().ok()?;
            ranges.push(Range { from: n, to: n });
        }
    }
    Some(ranges)
}

fn in_ranges(ranges: &[Range], n: usize) -> bool {
    ranges.iter().any(|r| n >= r.from && n <= r.to)
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
        CutCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_cut_fields() {
        let result = run(&["cut", "-d", ":", "-f", "1"], "a:b:c\nx:y:z\n").await;
        assert_eq!(result.stdout, "a\nx\n");
    }

    #[tokio::test]
    async fn test_cut_field_range() {
        let result = run(&["cut", "-d", ":", "-f", "2-3"], "a:b:c:d\n").await;
        assert_eq!(result.stdout, "b:c\n");
    }

    #[tokio::test]
    async fn test_cut_multiple_fields() {
        let result = run(&["cut", "-d", ",", "-f", "1,3"], "a,b,c\n").await;
        assert_eq!(result.stdout, "a,c\n");
    }

    #[tokio::test]
    async fn test_cut_chars() {
        let result = run(&["cut", "-c", "1-3"], "abcdef\n").await;
        assert_eq!(result.stdout, "abc\n");
    }

    #[tokio::test]
    async fn test_cut_undelimited_line_passthrough() {
        let result = run(&["cut", "-d", ":", "-f", "2"], "no-delim\n").await;
        assert_eq!(result.stdout, "no-delim\n");
        let result = run(&["cut", "-d", ":", "-f", "2", "-s"], "no-delim\n").await;
        assert_eq!(result.stdout, "");
    }
}
