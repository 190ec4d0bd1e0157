//! tr.

use async_trait::async_trait;

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct TrCommand;

#[async_trait]
impl Command for TrCommand {
    fn name(&self) -> &'static str {
        "tr"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["d", "s", "c"], &[]);
        let parsed = parse_flags(&spec, ctx.operands());

        let set1 = match parsed.positional.first() {
            Some(set) => expand_set(set),
            None => {
                return CommandResult::error("usage: tr [-cds] set1 [set2]\n".to_string());
            }
        };
        let set2 = parsed.positional.get(1).map(|s| expand_set(s));

        let input = &ctx.stdin;
        let mut out = String::new();

        if parsed.has("d") {
            let complement = parsed.has("c");
            for ch in input.chars() {
                let in_set = set1.contains(&ch);
                if in_set == complement {
                    out.push(ch);
                }
            }
            if parsed.has("s") {
                if let Some(set2) = &set2 {
                    out = squeeze(&out, set2);
                }
            }
            return CommandResult::success(out);
        }

        match &set2 {
            Some(set2) if !set2.is_empty() => {
                for ch in input.chars() {
                    match set1.iter().position(|&c| c == ch) {
                        Some(idx) => {
                            let mapped = set2.get(idx).copied().unwrap_or(*set2.last().unwrap());
                            out.push(mapped);
                        }
                        None => out.push(ch),
                    }
                }
            }
            _ => {
                if parsed.has("s") {
                    return CommandResult::success(squeeze(input, &set1));
                }
                return CommandResult::error("tr: missing operand\n".to_string());
            }
        }

        if parsed.has("s") {
            out = squeeze(&out, set2.as_ref().unwrap_or(&set1));
        }
        CommandResult::success(out)
    }
}

/// Expand a tr set: ranges (a-z), classes ([:alpha:]), and escapes.
fn expand_set(spec: &str) -> Vec<char> {
    match spec {
        "[:alpha:]" => return ('a'..='z').chain('A'..='Z').collect(),
        "[:digit:]" => return ('0'..='9').collect(),
        "[:alnum:]" => {
            return ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
        }
        "[:lower:]" => return ('a'..='z').collect(),
        "[:upper:]" => return ('A'..='Z').collect(),
        "[:space:]" => return vec![' ', '\t', '\n', '\r', '\x0b', '\x0c'],
        "[:punct:]" => {
            return "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~".chars().collect();
        }
        _ => {}
    }

    let chars: Vec<char> = spec.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            out.push(match chars[i + 1] {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '\\' => '\\',
                c => c,
            });
            i += 2;
            continue;
        }
        // a-z range
        if i + 2 < chars.len() && chars[i + 1] == '-' && chars[i + 2] as u32 >= chars[i] as u32 {
            let (start, end) = (chars[i] as u32, chars[i + 2] as u32);
            for code in start..=end {
                if let Some(c) = char::from_u32(code) {
                    out.push(c);
                }
            }
            i += 3;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Squeeze runs of set members down to a single occurrence.
fn squeeze(input: &str, set: &[char]) -> String {
    let mut out = String::new();
    let mut previous: Option<char> = None;
    for ch in input.chars() {
        if Some(ch) == previous && set.contains(&ch) {
            continue;
        }
        out.push(ch);
        previous = Some(ch);
    }
    out
}
