//! find.
//!
//! Supports -name, -type, -maxdepth, -mindepth and -exec with {} and
//! the ; terminator.

use async_trait::async_trait;

use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::interpreter::expansion::pattern::matches_pattern;

pub struct FindCommand;

#[derive(Debug, Default)]
struct FindOptions {
    name: Option<String>,
    kind: Option<char>,
    maxdepth: Option<usize>,
    mindepth: usize,
    exec: Option<Vec<String>>,
}

#[async_trait]
impl Command for FindCommand {
    fn name(&self) -> &'static str {
        "find"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let operands = ctx.operands();
        let mut roots: Vec<String> = Vec::new();
        let mut options = FindOptions::default();

        let mut i = 0;
        while i < operands.len() {
            match operands[i].as_str() {
                "-name" => {
                    i += 1;
                    options.name = operands.get(i).cloned();
                }
                "-type" => {
                    i += 1;
                    options.kind = operands.get(i).and_then(|s| s.chars().next());
                }
                "-maxdepth" => {
                    i += 1;
                    options.maxdepth = operands.get(i).and_then(|s| s.parse().ok());
                }
                "-mindepth" => {
                    i += 1;
                    options.mindepth =
                        operands.get(i).and_then(|s| s.parse().ok()).unwrap_or(0);
                }
                "-exec" => {
                    let mut template = Vec::new();
                    i += 1;
                    while i < operands.len() && operands[i] != ";" && operands[i] != "\\;" {
                        template.push(operands[i].clone());
                        i += 1;
                    }
                    options.exec = Some(template);
                }
                arg if arg.starts_with('-') => {
                    return CommandResult::error(format!("find: unknown predicate '{}'\n", arg));
                }
                arg => roots.push(arg.to_string()),
            }
            i += 1;
        }

        if roots.is_empty() {
            roots.push(".".to_string());
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        for root in &roots {
            let resolved = ctx.resolve(root);
            if !ctx.fs.exists(&resolved).await {
                stderr.push_str(&format!(
                    "find: '{}': No such file or directory\n",
                    root
                ));
                continue;
            }
            walk(&ctx, &resolved, root, 0, &options, &mut stdout, &mut stderr).await;
        }

        let exit_code = if stderr.is_empty() { 0 } else { 1 };
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

#[allow(clippy::too_many_arguments)]
async fn walk(
    ctx: &CommandContext,
    resolved: &str,
    display: &str,
    depth: usize,
    options: &FindOptions,
    stdout: &mut String,
    stderr: &mut String,
) {
    if let Some(max) = options.maxdepth {
        if depth > max {
            return;
        }
    }

    let stat = match ctx.fs.stat(resolved).await {
        Ok(stat) => stat,
        Err(_) => return,
    };

    if depth >= options.mindepth && matches(ctx, display, &stat, options).await {
        emit(ctx, display, options, stdout, stderr).await;
    }

    if stat.is_directory {
        if let Ok(entries) = ctx.fs.readdir(resolved).await {
            for entry in entries {
                let child = format!("{}/{}", resolved.trim_end_matches('/'), entry);
                let child_display = format!("{}/{}", display.trim_end_matches('/'), entry);
                Box::pin(walk(ctx, &child, &child_display, depth + 1, options, stdout, stderr))
                    .await;
            }
        }
    }
}

async fn matches(
    _ctx: &CommandContext,
    display: &str,
    stat: &crate::fs::FsStat,
    options: &FindOptions,
) -> bool {
    if let Some(kind) = options.kind {
        let ok = match kind {
            'f' => stat.is_file,
            'd' => stat.is_directory,
            'l' => stat.is_symlink,
            _ => false,
        };
        if !ok {
            return false;
        }
    }
    if let Some(pattern) = &options.name {
        let base = display.rsplit('/').next().unwrap_or(display);
        if !matches_pattern(pattern, base) {
            return false;
        }
    }
    true
}

async fn emit(
    ctx: &CommandContext,
    display: &str,
    options: &FindOptions,
    stdout: &mut String,
    stderr: &mut String,
) {
    match (&options.exec, &ctx.exec_fn) {
        (Some(template), Some(exec_fn)) => {
            let argv: Vec<String> = template
                .iter()
                .map(|part| part.replace("{}", display))
                .collect();
            if argv.is_empty() {
                return;
            }
            let result = exec_fn(argv, String::new()).await;
            stdout.push_str(&result.stdout);
            stderr.push_str(&result.stderr);
        }
        _ => {
            stdout.push_str(display);
            stdout.push('\n');
        }
    }
}
