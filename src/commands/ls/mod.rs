//! ls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::fs::FsStat;

pub struct LsCommand;

#[async_trait]
impl Command for LsCommand {
    fn name(&self) -> &'static str {
        "ls"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["a", "A", "l", "1", "d", "r", "t", "F"], &[]);
        let parsed = parse_flags(&spec, ctx.operands());

        let targets: Vec<String> = if parsed.positional.is_empty() {
            vec![ctx.cwd.clone()]
        } else {
            parsed.positional.clone()
        };
        let multiple = targets.len() > 1;

        let mut stdout = String::new();
        let mut stderr = String::new();

        for (i, target) in targets.iter().enumerate() {
            let resolved = ctx.resolve(target);
            let stat = match ctx.fs.stat(&resolved).await {
                Ok(stat) => stat,
                Err(e) => {
                    stderr.push_str(&format!(
                        "ls: cannot access '{}': {}\n",
                        target,
                        e.strerror()
                    ));
                    continue;
                }
            };

            if i > 0 {
                stdout.push('\n');
            }

            if !stat.is_directory || parsed.has("d") {
                stdout.push_str(&self.render(&ctx, &parsed, target, &stat).await);
                continue;
            }

            if multiple {
                stdout.push_str(&format!("{}:\n", target));
            }

            let mut entries = match ctx.fs.readdir(&resolved).await {
                Ok(entries) => entries,
                Err(e) => {
                    stderr.push_str(&format!("ls: {}: {}\n", target, e.strerror()));
                    continue;
                }
            };

            if !parsed.has("a") && !parsed.has("A") {
                entries.retain(|name| !name.starts_with('.'));
            }
            if parsed.has("r") {
                entries.reverse();
            }

            if parsed.has("l") {
                for entry in &entries {
                    let full = format!("{}/{}", resolved.trim_end_matches('/'), entry);
                    if let Ok(entry_stat) = ctx.fs.lstat(&full).await {
                        stdout.push_str(&self.render(&ctx, &parsed, entry, &entry_stat).await);
                    }
                }
            } else {
                for entry in &entries {
                    stdout.push_str(entry);
                    if parsed.has("F") {
                        let full = format!("{}/{}", resolved.trim_end_matches('/'), entry);
                        if ctx.fs.stat(&full).await.map(|s| s.is_directory).unwrap_or(false) {
                            stdout.push('/');
                        }
                    }
                    stdout.push('\n');
                }
            }
        }

        let exit_code = if stderr.is_empty() { 0 } else { 2 };
        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

impl LsCommand {
    async fn render(
        &self,
        _ctx: &CommandContext,
        parsed: &crate::commands::flags::ParsedFlags,
        name: &str,
        stat: &FsStat,
    ) -> String {
        if !parsed.has("l") {
            return format!("{}\n", name);
        }

        let kind = if stat.is_directory {
            'd'
        } else if stat.is_symlink {
            'l'
        } else {
            '-'
        };
        let mode = render_mode(stat.mode);
        let mtime: DateTime<Utc> = stat.mtime.into();
        format!(
            "{}{} 1 user user {:>8} {} {}\n",
            kind,
            mode,
            stat.size,
            mtime.format("%b %e %H:%M"),
            name
        )
    }
}

fn render_mode(mode: u32) -> String {
    let mut out = String::with_capacity(9);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileSystem, InMemoryFs, MkdirOptions};
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn run(args: &[&str], cwd: &str, fs: Arc<InMemoryFs>) -> CommandResult {
        let ctx = CommandContext {
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin: String::new(),
            cwd: cwd.to_string(),
            env: HashMap::new(),
            fs,
            exec_fn: None,
            fetch_fn: None,
            network_enabled: false,
        };
        LsCommand.execute(ctx).await
    }

    async fn fixture() -> Arc<InMemoryFs> {
        let fs = Arc::new(InMemoryFs::new());
        fs.mkdir("/dir/sub", &MkdirOptions { recursive: true }).await.unwrap();
        fs.write_file("/dir/b.txt", b"bb").await.unwrap();
        fs.write_file("/dir/a.txt", b"a").await.unwrap();
        fs.write_file("/dir/.hidden", b"").await.unwrap();
        fs
    }

    #[tokio::test]
    async fn test_ls_sorted_without_hidden() {
        let fs = fixture().await;
        let result = run(&["ls"], "/dir", fs).await;
        assert_eq!(result.stdout, "a.txt\nb.txt\nsub\n");
    }

    #[tokio::test]
    async fn test_ls_all() {
        let fs = fixture().await;
        let result = run(&["ls", "-a"], "/dir", fs).await;
        assert!(result.stdout.contains(".hidden"));
    }

    #[tokio::test]
    async fn test_ls_long_format() {
        let fs = fixture().await;
        let result = run(&["ls", "-l"], "/dir", fs).await;
        assert!(result.stdout.contains("-rw-r--r--"));
        assert!(result.stdout.contains("a.txt"));
        assert!(result.stdout.lines().any(|l| l.starts_with('d') && l.ends_with("sub")));
    }

    #[tokio::test]
    async fn test_ls_missing_path() {
        let fs = fixture().await;
        let result = run(&["ls", "/nope"], "/", fs).await;
        assert_eq!(result.exit_code, 2);
        assert!(result.stderr.contains("No such file or directory"));
    }

    #[tokio::test]
    async fn test_ls_file_operand() {
        let fs = fixture().await;
        let result = run(&["ls", "/dir/a.txt"], "/", fs).await;
        assert_eq!(result.stdout, "/dir/a.txt\n");
    }
}
