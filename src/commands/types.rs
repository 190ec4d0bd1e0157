//! Command contract.
//!
//! Every registry command is a thin stream transformer: argv plus stdin
//! in, stdout/stderr/exit out, with filesystem access through the
//! shared virtual fs handle. argv[0] is the command name.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::fs::FileSystem;
use crate::network::{HttpRequest, HttpResponse};

/// Callback for running a nested command (xargs, find -exec). Takes the
/// argv and stdin, yields the result.
pub type ExecFn = Arc<
    dyn Fn(Vec<String>, String) -> Pin<Box<dyn Future<Output = CommandResult> + Send>>
        + Send
        + Sync,
>;

/// Callback for HTTP requests (curl).
pub type FetchFn = Arc<
    dyn Fn(HttpRequest) -> Pin<Box<dyn Future<Output = Result<HttpResponse, String>> + Send>>
        + Send
        + Sync,
>;

/// Result of one command invocation.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(stdout: String) -> Self {
        Self { stdout, stderr: String::new(), exit_code: 0 }
    }

    pub fn error(stderr: String) -> Self {
        Self { stdout: String::new(), stderr, exit_code: 1 }
    }

    pub fn with_exit_code(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self { stdout, stderr, exit_code }
    }
}

/// Invocation context handed to a command.
pub struct CommandContext {
    /// Full argv; args[0] is the command name
    pub args: Vec<String>,
    pub stdin: String,
    pub cwd: String,
    /// Exported environment
    pub env: HashMap<String, String>,
    pub fs: Arc<dyn FileSystem>,
    pub exec_fn: Option<ExecFn>,
    pub fetch_fn: Option<FetchFn>,
    pub network_enabled: bool,
}

impl CommandContext {
    /// argv without the command name.
    pub fn operands(&self) -> &[String] {
        if self.args.is_empty() {
            &[]
        } else {
            &self.args[1..]
        }
    }

    /// Resolve an operand path against the working directory.
    pub fn resolve(&self, path: &str) -> String {
        self.fs.resolve_path(&self.cwd, path)
    }
}

#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, ctx: CommandContext) -> CommandResult;
}
