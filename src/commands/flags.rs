//! Shared flag parser for commands.
//!
//! Splits an argv into recognized flags and positional operands:
//! combined short booleans (-la = -l -a), value flags taking the next
//! item, -NUM as an alias for -n NUM, `--` ending flag parsing, and
//! unknown flags passed through as positionals.

use std::collections::HashMap;

/// Declaration of the flags a command accepts.
#[derive(Debug, Clone, Default)]
pub struct FlagSpec {
    /// Boolean flag names, without the dash ("l", "a", "recursive")
    pub boolean: Vec<&'static str>,
    /// Flags that consume the next argv item as their value
    pub value: Vec<&'static str>,
    /// Default values
    pub defaults: HashMap<&'static str, String>,
    /// When set, a bare -NUM becomes this value flag (head/tail -5)
    pub number_alias: Option<&'static str>,
}

impl FlagSpec {
    pub fn new(boolean: &[&'static str], value: &[&'static str]) -> Self {
        Self {
            boolean: boolean.to_vec(),
            value: value.to_vec(),
            defaults: HashMap::new(),
            number_alias: None,
        }
    }

    pub fn with_number_alias(mut self, flag: &'static str) -> Self {
        self.number_alias = Some(flag);
        self
    }

    pub fn with_default(mut self, flag: &'static str, value: impl Into<String>) -> Self {
        self.defaults.insert(flag, value.into());
        self
    }
}

/// Parsed flags plus remaining positional operands.
#[derive(Debug, Clone, Default)]
pub struct ParsedFlags {
    values: HashMap<String, String>,
    set: Vec<String>,
    pub positional: Vec<String>,
}

impl ParsedFlags {
    pub fn has(&self, flag: &str) -> bool {
        self.set.iter().any(|f| f == flag)
    }

    pub fn value(&self, flag: &str) -> Option<&str> {
        self.values.get(flag).map(|s| s.as_str())
    }

    pub fn value_or<'a>(&'a self, flag: &str, default: &'a str) -> &'a str {
        self.value(flag).unwrap_or(default)
    }
}

/// Parse an argv (without the command name) against a spec.
pub fn parse_flags(spec: &FlagSpec, args: &[String]) -> ParsedFlags {
    let mut parsed = ParsedFlags::default();
    for (flag, value) in &spec.defaults {
        parsed.values.insert(flag.to_string(), value.clone());
    }

    let mut i = 0;
    let mut no_more_flags = false;

    while i < args.len() {
        let arg = &args[i];

        if no_more_flags || arg == "-" || !arg.starts_with('-') {
            parsed.positional.push(arg.clone());
            i += 1;
            continue;
        }

        if arg == "--" {
            no_more_flags = true;
            i += 1;
            continue;
        }

        // Long flags: --name or --name=value
        if let Some(body) = arg.strip_prefix("--") {
            let (name, inline) = match body.split_once('=') {
                Some((n, v)) => (n, Some(v.to_string())),
                None => (body, None),
            };
            if spec.value.contains(&name) {
                let value = match inline {
                    Some(v) => v,
                    None => {
                        i += 1;
                        args.get(i).cloned().unwrap_or_default()
                    }
                };
                parsed.values.insert(name.to_string(), value);
                parsed.set.push(name.to_string());
            } else if spec.boolean.contains(&name) {
                parsed.set.push(name.to_string());
            } else {
                parsed.positional.push(arg.clone());
            }
            i += 1;
            continue;
        }

        let body = &arg[1..];

        // -NUM alias (head -5)
        if spec.number_alias.is_some() && body.chars().all(|c| c.is_ascii_digit()) && !body.is_empty()
        {
            let flag = spec.number_alias.unwrap();
            parsed.values.insert(flag.to_string(), body.to_string());
            parsed.set.push(flag.to_string());
            i += 1;
            continue;
        }

        // Single short value flag: -n 5 or -n5
        let first = &body[..body.chars().next().map(|c| c.len_utf8()).unwrap_or(0)];
        if spec.value.contains(&first) {
            let rest = &body[first.len()..];
            let value = if !rest.is_empty() {
                rest.to_string()
            } else {
                i += 1;
                args.get(i).cloned().unwrap_or_default()
            };
            parsed.values.insert(first.to_string(), value);
            parsed.set.push(first.to_string());
            i += 1;
            continue;
        }

        // Combined short booleans: -la
        let mut all_known = true;
        for c in body.chars() {
            if !spec.boolean.contains(&c.to_string().as_str()) {
                all_known = false;
                break;
            }
        }
        if all_known && !body.is_empty() {
            for c in body.chars() {
                parsed.set.push(c.to_string());
            }
            i += 1;
            continue;
        }

        // Unknown flags pass through as positionals
        parsed.positional.push(arg.clone());
        i += 1;
    }

    parsed
}

// ============================================================================
// Tests
// ============================================================================
