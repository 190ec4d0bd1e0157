//! Shell environment.
//!
//! The embedder entry point: builds the sandbox (default env, default
//! filesystem layout, injected files), parses scripts, and drives the
//! execution engine, mapping parse failures and escaped control flow
//! into the captured result.

use std::collections::HashMap;
use std::sync::Arc;

use crate::commands::registry::CommandRegistry;
use crate::fs::{FileSystem, FsError, InMemoryFs, InitialFiles, MkdirOptions};
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::sync_fs::SyncFsAdapter;
use crate::interpreter::types::{ControlFlowSignal, ExecResult, ExecutionLimits, ShellState};
use crate::interpreter::ExecutionEngine;
use crate::network::{HttpClient, NetworkConfig};
use crate::parser::parse;

/// Options for creating a shell sandbox.
#[derive(Default)]
pub struct ShellOptions {
    /// Extra environment variables merged over the defaults
    pub env: Option<HashMap<String, String>>,
    /// Working directory; must exist (it is created if missing)
    pub cwd: Option<String>,
    /// Initial filesystem content
    pub files: Option<InitialFiles>,
    /// Filesystem instance (defaults to a fresh InMemoryFs)
    pub fs: Option<Arc<dyn FileSystem>>,
    pub network: NetworkConfig,
    pub http_client: Option<Arc<dyn HttpClient>>,
    /// ~user resolution table
    pub user_homes: Option<HashMap<String, String>>,
    pub limits: Option<ExecutionLimits>,
}

/// The sandboxed shell.
pub struct Shell {
    pub fs: Arc<dyn FileSystem>,
    limits: ExecutionLimits,
    registry: Arc<CommandRegistry>,
    http_client: Option<Arc<dyn HttpClient>>,
    state: ShellState,
}

impl Shell {
    pub async fn new(options: ShellOptions) -> Self {
        let cwd = options.cwd.unwrap_or_else(|| "/home/user".to_string());
        let (fs, memfs): (Arc<dyn FileSystem>, Option<Arc<InMemoryFs>>) = match options.fs {
            Some(fs) => (fs, None),
            None => {
                let memfs = Arc::new(InMemoryFs::new());
                (memfs.clone(), Some(memfs))
            }
        };
        let limits = options.limits.unwrap_or_default();

        let mut env = HashMap::new();
        env.insert("HOME".to_string(), "/home/user".to_string());
        env.insert("PATH".to_string(), "/usr/bin:/bin".to_string());
        env.insert("USER".to_string(), "user".to_string());
        env.insert("SHELL".to_string(), "/bin/bash".to_string());
        env.insert("PWD".to_string(), cwd.clone());
        env.insert("OLDPWD".to_string(), cwd.clone());
        if let Some(user_env) = options.env {
            env.extend(user_env);
        }

        init_filesystem(&*fs).await;
        let _ = fs.mkdir(&cwd, &MkdirOptions { recursive: true }).await;

        if let Some(files) = options.files {
            match &memfs {
                Some(memfs) => memfs.add_initial_files(files),
                None => {
                    // A custom filesystem takes eager content only
                    for (path, init) in files {
                        match init.content {
                            crate::fs::FileContent::Text(text) => {
                                let _ = fs.write_file(&path, text.as_bytes()).await;
                            }
                            crate::fs::FileContent::Binary(bytes) => {
                                let _ = fs.write_file(&path, &bytes).await;
                            }
                            crate::fs::FileContent::Lazy(provider) => {
                                let _ = fs.write_file(&path, &provider()).await;
                            }
                        }
                    }
                }
            }
        }

        let mut state = ShellState {
            env,
            cwd: cwd.clone(),
            previous_dir: cwd,
            network_enabled: options.network.enabled,
            user_homes: options.user_homes.unwrap_or_default(),
            ..Default::default()
        };
        state.script_name = "bash".to_string();

        Self {
            fs,
            limits,
            registry: Arc::new(crate::commands::default_registry()),
            http_client: options.http_client,
            state,
        }
    }

    /// Execute a script string end to end.
    pub async fn exec(&mut self, script: &str) -> ExecResult {
        if script.trim().is_empty() {
            return ExecResult::ok().with_env(self.state.env.clone());
        }

        let ast = match parse(script) {
            Ok(ast) => ast,
            Err(e) => {
                return ExecResult::failure_with_code(
                    format!("bash: syntax error: {}\n", e.message),
                    2,
                )
                .with_env(self.state.env.clone());
            }
        };

        self.state.command_count = 0;

        let result = tokio::task::block_in_place(|| {
            let handle = tokio::runtime::Handle::current();
            let sync_fs = SyncFsAdapter::new(self.fs.clone(), handle.clone());
            let engine = ExecutionEngine::new(
                &self.limits,
                &sync_fs,
                self.fs.clone(),
                self.registry.clone(),
                handle,
                self.http_client.clone(),
            );

            match engine.execute_script(&mut self.state, &ast) {
                Ok(result) => result,
                Err(e) => unwind_to_result(&mut self.state, e),
            }
        });

        self.state.last_exit_code = result.exit_code;
        result.with_env(self.state.env.clone())
    }

    pub fn get_cwd(&self) -> &str {
        &self.state.cwd
    }

    pub fn get_env(&self) -> &HashMap<String, String> {
        &self.state.env
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Read a file relative to the current directory.
    pub async fn read_file(&self, path: &str) -> Result<String, FsError> {
        let resolved = self.fs.resolve_path(&self.state.cwd, path);
        self.fs.read_file(&resolved).await
    }

    /// Write a file relative to the current directory.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<(), FsError> {
        let resolved = self.fs.resolve_path(&self.state.cwd, path);
        self.fs.write_file(&resolved, content.as_bytes()).await
    }
}

/// Convert an escaped control-flow error into the top-level result.
fn unwind_to_result(state: &mut ShellState, error: InterpreterError) -> ExecResult {
    match error {
        InterpreterError::Exit { exit_code, stdout, stderr } => {
            ExecResult::new(stdout, stderr, exit_code)
        }
        InterpreterError::Errexit { exit_code, stdout, stderr } => {
            ExecResult::new(stdout, stderr, exit_code)
        }
        InterpreterError::Expansion { exit_code, stdout, stderr, .. } => {
            ExecResult::new(stdout, stderr, exit_code)
        }
        InterpreterError::Limit { stdout, stderr, .. } => {
            ExecResult::new(stdout, stderr, InterpreterError::LIMIT_EXIT_CODE)
        }
        InterpreterError::Break { levels, stdout, stderr } => {
            let mut result = ExecResult::new(stdout, stderr, state.last_exit_code);
            result.signal = Some(ControlFlowSignal::Break(levels));
            result
        }
        InterpreterError::Continue { levels, stdout, stderr } => {
            let mut result = ExecResult::new(stdout, stderr, state.last_exit_code);
            result.signal = Some(ControlFlowSignal::Continue(levels));
            result
        }
        InterpreterError::Return { exit_code, stdout, stderr } => {
            let mut result = ExecResult::new(stdout, stderr, exit_code);
            result.signal = Some(ControlFlowSignal::Return(exit_code));
            result
        }
    }
}

/// Standard directory and device layout.
async fn init_filesystem(fs: &dyn FileSystem) {
    let recursive = MkdirOptions { recursive: true };
    let _ = fs.mkdir("/bin", &recursive).await;
    let _ = fs.mkdir("/usr/bin", &recursive).await;
    let _ = fs.mkdir("/home/user", &recursive).await;
    let _ = fs.mkdir("/tmp", &recursive).await;
    let _ = fs.mkdir("/dev", &recursive).await;
    let _ = fs.write_file("/dev/null", b"").await;
    let _ = fs.write_file("/dev/stdin", b"").await;
    let _ = fs.write_file("/dev/stdout", b"").await;
    let _ = fs.write_file("/dev/stderr", b"").await;
}

// ============================================================================
// Tests
// ============================================================================
