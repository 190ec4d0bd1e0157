//! date.

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};

use crate::commands::flags::{parse_flags, FlagSpec};
use crate::commands::types::{Command, CommandContext, CommandResult};

pub struct DateCommand;

#[async_trait]
impl Command for DateCommand {
    fn name(&self) -> &'static str {
        "date"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        let spec = FlagSpec::new(&["u", "R", "I"], &["d"]);
        let parsed = parse_flags(&spec, ctx.operands());

        // SOURCE_DATE_EPOCH pins the clock for reproducible runs
        let now: DateTime<Utc> = match ctx.env.get("SOURCE_DATE_EPOCH") {
            Some(epoch) => match epoch.parse::<i64>() {
                Ok(secs) => match Utc.timestamp_opt(secs, 0) {
                    chrono::LocalResult::Single(t) => t,
                    _ => Utc::now(),
                },
                Err(_) => Utc::now(),
            },
            None => Utc::now(),
        };

        // -d @EPOCH
        let now = match parsed.value("d") {
            Some(spec_text) => match spec_text.strip_prefix('@').and_then(|s| s.parse::<i64>().ok())
            {
                Some(secs) => match Utc.timestamp_opt(secs, 0) {
                    chrono::LocalResult::Single(t) => t,
                    _ => now,
                },
                None => {
                    return CommandResult::error(format!(
                        "date: invalid date '{}'\n",
                        spec_text
                    ));
                }
            },
            None => now,
        };

        let format = parsed
            .positional
            .iter()
            .find(|arg| arg.starts_with('+'))
            .map(|arg| arg[1..].to_string());

        let output = if parsed.has("R") {
            now.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
        } else if parsed.has("I") {
            now.format("%Y-%m-%d").to_string()
        } else {
            match format {
                Some(fmt) => render_format(&now, &fmt, parsed.has("u")),
                None => now.format("%a %b %e %H:%M:%S UTC %Y").to_string(),
            }
        };

        CommandResult::success(format!("{}\n", output))
    }
}

fn render_format(now: &DateTime<Utc>, format: &str, utc: bool) -> String {
    // chrono shares the strftime vocabulary; %N needs padding help
    let format = format.replace("%N", "000000000");
    if utc {
        now.format(&format).to_string()
    } else {
        now.with_timezone(&Local).format(&format).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::InMemoryFs;
    use std::collections::HashMap;
    use std::sync::Arc;

    async fn run(args: &[&str], env: &[(&str, &str)]) -> CommandResult {
        let ctx = CommandContext {
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin: String::new(),
            cwd: "/".to_string(),
            env: env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            fs: Arc::new(InMemoryFs::new()),
            exec_fn: None,
            fetch_fn: None,
            network_enabled: false,
        };
        DateCommand.execute(ctx).await
    }

    #[tokio::test]
    async fn test_date_epoch_format() {
        let result = run(&["date", "-u", "+%Y-%m-%d"], &[("SOURCE_DATE_EPOCH", "0")]).await;
        assert_eq!(result.stdout, "1970-01-01\n");
    }

    #[tokio::test]
    async fn test_date_seconds_format() {
        let result = run(&["date", "-u", "+%s"], &[("SOURCE_DATE_EPOCH", "1234")]).await;
        assert_eq!(result.stdout, "1234\n");
    }

    #[tokio::test]
    async fn test_date_d_epoch() {
        let result = run(&["date", "-u", "-d", "@86400", "+%Y-%m-%d"], &[]).await;
        assert_eq!(result.stdout, "1970-01-02\n");
    }

    #[tokio::test]
    async fn test_date_invalid_spec() {
        let result = run(&["date", "-d", "next tuesday"], &[]).await;
        assert_eq!(result.exit_code, 1);
    }
}
