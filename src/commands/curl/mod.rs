//! curl.
//!
//! The only command that leaves the sandbox, and only through the
//! embedder's HTTP hook. With networking disabled (the default) it
//! fails fast.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::commands::types::{Command, CommandContext, CommandResult};
use crate::network::HttpRequest;

pub struct CurlCommand;

#[derive(Debug, Default)]
struct CurlOptions {
    url: Option<String>,
    method: Option<String>,
    headers: HashMap<String, String>,
    body: Option<String>,
    include_headers: bool,
    fail_on_error: bool,
    output: Option<String>,
    head_only: bool,
}

#[async_trait]
impl Command for CurlCommand {
    fn name(&self) -> &'static str {
        "curl"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandResult {
        if !ctx.network_enabled {
            return CommandResult::error("curl: network access is disabled\n".to_string());
        }
        let fetch_fn = match &ctx.fetch_fn {
            Some(fetch_fn) => fetch_fn,
            None => {
                return CommandResult::error("curl: network access is disabled\n".to_string());
            }
        };

        let options = match parse_curl_args(ctx.operands()) {
            Ok(options) => options,
            Err(message) => return CommandResult::with_exit_code(String::new(), message, 2),
        };

        let url = match &options.url {
            Some(url) => url.clone(),
            None => {
                return CommandResult::with_exit_code(
                    String::new(),
                    "curl: no URL specified\n".to_string(),
                    2,
                );
            }
        };

        let method = options
            .method
            .clone()
            .unwrap_or_else(|| {
                if options.head_only {
                    "HEAD".to_string()
                } else if options.body.is_some() {
                    "POST".to_string()
                } else {
                    "GET".to_string()
                }
            })
            .to_uppercase();

        let request = HttpRequest {
            url: url.clone(),
            method,
            headers: options.headers.clone(),
            body: options.body.clone(),
        };

        let response = match fetch_fn(request).await {
            Ok(response) => response,
            Err(message) => {
                return CommandResult::with_exit_code(
                    String::new(),
                    format!("curl: (6) {}\n", message),
                    6,
                );
            }
        };

        if options.fail_on_error && response.status >= 400 {
            return CommandResult::with_exit_code(
                String::new(),
                format!("curl: (22) The requested URL returned error: {}\n", response.status),
                22,
            );
        }

        let mut output = String::new();
        if options.include_headers || options.head_only {
            output.push_str(&format!(
                "HTTP/1.1 {} {}\r\n",
                response.status,
                response.status_text()
            ));
            let mut names: Vec<&String> = response.headers.keys().collect();
            names.sort();
            for name in names {
                output.push_str(&format!("{}: {}\r\n", name, response.headers[name]));
            }
            output.push_str("\r\n");
        }
        if !options.head_only {
            output.push_str(&response.body);
        }

        if let Some(path) = &options.output {
            let resolved = ctx.resolve(path);
            if let Err(e) = ctx.fs.write_file(&resolved, output.as_bytes()).await {
                return CommandResult::error(format!(
                    "curl: (23) Failed writing body: {}\n",
                    e.strerror()
                ));
            }
            return CommandResult::success(String::new());
        }

        CommandResult::success(output)
    }
}

fn parse_curl_args(args: &[String]) -> Result<CurlOptions, String> {
    let mut options = CurlOptions::default();
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-X" | "--request" => {
                i += 1;
                options.method = args.get(i).cloned();
            }
            "-H" | "--header" => {
                i += 1;
                if let Some(header) = args.get(i) {
                    if let Some((name, value)) = header.split_once(':') {
                        options.headers.insert(name.trim().to_string(), value.trim().to_string());
                    }
                }
            }
            "-d" | "--data" | "--data-raw" => {
                i += 1;
                options.body = args.get(i).cloned();
                options
                    .headers
                    .entry("content-type".to_string())
                    .or_insert_with(|| "application/x-www-form-urlencoded".to_string());
            }
            "--json" => {
                i += 1;
                options.body = args.get(i).cloned();
                if let Some(body) = &options.body {
                    if serde_json::from_str::<serde_json::Value>(body).is_err() {
                        return Err("curl: (3) malformed JSON in --json argument\n".to_string());
                    }
                }
                options
                    .headers
                    .insert("content-type".to_string(), "application/json".to_string());
            }
            "-o" | "--output" => {
                i += 1;
                options.output = args.get(i).cloned();
            }
            "-i" | "--include" => options.include_headers = true,
            "-I" | "--head" => options.head_only = true,
            "-f" | "--fail" => options.fail_on_error = true,
            "-s" | "--silent" | "-L" | "--location" | "-S" | "--show-error" => {}
            _ if arg.starts_with('-') => {
                return Err(format!("curl: option {}: is unknown\n", arg));
            }
            url => options.url = Some(url.to_string()),
        }
        i += 1;
    }

    Ok(options)
}
