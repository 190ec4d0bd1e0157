//! Interpreter types: the sandbox state threaded through execution and
//! the result record handed back to the embedder.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::ast::types::FunctionDefNode;

/// A shell variable value. Scalars and arrays share one namespace:
/// assigning a scalar over an array replaces it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(String),
    Indexed(Vec<String>),
    /// Associative array; insertion order is preserved so expansion of
    /// ${map[@]} is deterministic.
    Assoc(IndexMap<String, String>),
}

impl Value {
    pub fn scalar(s: impl Into<String>) -> Self {
        Value::Scalar(s.into())
    }

    /// The value seen by a plain `$name` lookup (arrays yield element 0).
    pub fn as_scalar(&self) -> String {
        match self {
            Value::Scalar(s) => s.clone(),
            Value::Indexed(items) => items.first().cloned().unwrap_or_default(),
            Value::Assoc(map) => map.get("0").cloned().unwrap_or_default(),
        }
    }
}

/// The recognized shell option subset (set -e, set -u, set -o pipefail,
/// set -x).
#[derive(Debug, Clone, Default)]
pub struct ShellOptions {
    pub errexit: bool,
    pub nounset: bool,
    pub pipefail: bool,
    pub xtrace: bool,
}

/// Control-flow signal carried on a result when break/continue/return
/// escapes uncaught to the top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ControlFlowSignal {
    Break(u32),
    Continue(u32),
    Return(i32),
}

/// The sandbox state: env, variables, cwd, functions, bookkeeping.
/// Every interpreter operation reads and updates one of these; subshells
/// and pipeline stages run against a clone that is then discarded.
#[derive(Debug, Clone)]
pub struct ShellState {
    /// Exported variables, as seen by commands
    pub env: HashMap<String, String>,
    /// All shell variables (scalars and arrays)
    pub vars: HashMap<String, Value>,
    /// Absolute, normalized working directory
    pub cwd: String,
    /// Previous directory, for `cd -`
    pub previous_dir: String,
    /// $? source
    pub last_exit_code: i32,
    /// Per-stage exit codes of the most recent pipeline
    pub pipestatus: Vec<i32>,
    /// $1..$N
    pub positional: Vec<String>,
    /// $0
    pub script_name: String,
    pub options: ShellOptions,
    pub functions: HashMap<String, FunctionDefNode>,
    /// Saved outer values for `local` declarations, one frame per call
    pub local_scopes: Vec<HashMap<String, Option<Value>>>,
    /// Current loop nesting (for break/continue validation)
    pub loop_depth: u32,
    /// True while evaluating an if/while/until condition (errexit off)
    pub in_condition: bool,
    /// Current function call depth (for recursion limits)
    pub call_depth: u32,
    /// Commands executed so far (execution limit bookkeeping)
    pub command_count: u64,
    /// $$ of the virtual shell
    pub shell_pid: u32,
    /// $! of the most recent background statement
    pub last_background_pid: u32,
    /// Next pseudo-PID handed to a background statement
    pub next_pid: u32,
    /// Redirected stdin available to commands inside a compound
    /// (`while read l; do ...; done < file`); consumed progressively
    pub group_stdin: Option<String>,
    /// Whether `curl` may call the HTTP hook
    pub network_enabled: bool,
    /// ~user lookup table
    pub user_homes: HashMap<String, String>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            env: HashMap::new(),
            vars: HashMap::new(),
            cwd: String::from("/"),
            previous_dir: String::from("/"),
            last_exit_code: 0,
            pipestatus: Vec::new(),
            positional: Vec::new(),
            script_name: String::from("bash"),
            options: ShellOptions::default(),
            functions: HashMap::new(),
            local_scopes: Vec::new(),
            loop_depth: 0,
            in_condition: false,
            call_depth: 0,
            command_count: 0,
            shell_pid: 1234,
            last_background_pid: 0,
            next_pid: 1000,
            group_stdin: None,
            network_enabled: false,
            user_homes: HashMap::new(),
        }
    }
}

impl ShellState {
    /// Look up a variable: shell vars first, then exported env.
    pub fn get_var(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.vars.get(name) {
            return Some(v.clone());
        }
        self.env.get(name).map(|s| Value::Scalar(s.clone()))
    }

    /// Scalar view of a variable, empty when unset.
    pub fn get_scalar(&self, name: &str) -> String {
        self.get_var(name).map(|v| v.as_scalar()).unwrap_or_default()
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.vars.contains_key(name) || self.env.contains_key(name)
    }

    /// Set a variable; exported variables keep env in sync.
    pub fn set_var(&mut self, name: &str, value: Value) {
        if self.env.contains_key(name) {
            if let Value::Scalar(ref s) = value {
                self.env.insert(name.to_string(), s.clone());
            }
        }
        self.vars.insert(name.to_string(), value);
    }

    pub fn set_scalar(&mut self, name: &str, value: impl Into<String>) {
        self.set_var(name, Value::Scalar(value.into()));
    }

    pub fn unset_var(&mut self, name: &str) {
        self.vars.remove(name);
        self.env.remove(name);
    }

    /// Mark a variable exported, copying its current scalar value.
    pub fn export_var(&mut self, name: &str) {
        if let Some(value) = self.vars.get(name) {
            self.env.insert(name.to_string(), value.as_scalar());
        } else {
            self.env.insert(name.to_string(), String::new());
        }
    }

    /// The field separator set, defaulting to space-tab-newline.
    pub fn ifs(&self) -> String {
        match self.get_var("IFS") {
            Some(v) => v.as_scalar(),
            None => " \t\n".to_string(),
        }
    }

    /// Record a `local` declaration: save the outer value into the
    /// innermost scope frame so it can be restored on function return.
    pub fn declare_local(&mut self, name: &str) {
        if let Some(scope) = self.local_scopes.last_mut() {
            if !scope.contains_key(name) {
                let saved = self.vars.get(name).cloned();
                scope.insert(name.to_string(), saved);
            }
        }
    }

    /// Pop a scope frame, restoring saved outer values.
    pub fn pop_local_scope(&mut self) {
        if let Some(scope) = self.local_scopes.pop() {
            for (name, saved) in scope {
                match saved {
                    Some(value) => {
                        self.vars.insert(name, value);
                    }
                    None => {
                        self.vars.remove(&name);
                    }
                }
            }
        }
    }
}

/// Execution result from a command or script. Serializable so
/// embedders can golden-snapshot captured runs.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Uncaught break/continue/return
    pub signal: Option<ControlFlowSignal>,
    /// Exported env echoed back by the top-level execute
    pub env: Option<HashMap<String, String>>,
}

impl ExecResult {
    pub fn new(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self { stdout, stderr, exit_code, signal: None, env: None }
    }

    pub fn ok() -> Self {
        Self::new(String::new(), String::new(), 0)
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        Self::new(String::new(), stderr.into(), 1)
    }

    pub fn failure_with_code(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self::new(String::new(), stderr.into(), exit_code)
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }
}

impl Default for ExecResult {
    fn default() -> Self {
        Self::ok()
    }
}

/// Execution limits against runaway scripts.
#[derive(Debug, Clone)]
pub struct ExecutionLimits {
    pub max_recursion_depth: u32,
    pub max_command_count: u64,
    pub max_iterations: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_recursion_depth: 1000,
            max_command_count: 100_000,
            max_iterations: 1_000_000,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_shadows_array() {
        let mut state = ShellState::default();
        state.set_var("x", Value::Indexed(vec!["a".into(), "b".into()]));
        assert_eq!(state.get_scalar("x"), "a");
        state.set_scalar("x", "plain");
        assert_eq!(state.get_var("x"), Some(Value::Scalar("plain".to_string())));
    }

    #[test]
    fn test_export_keeps_env_in_sync() {
        let mut state = ShellState::default();
        state.set_scalar("FOO", "one");
        assert!(!state.env.contains_key("FOO"));
        state.export_var("FOO");
        assert_eq!(state.env.get("FOO"), Some(&"one".to_string()));
        state.set_scalar("FOO", "two");
        assert_eq!(state.env.get("FOO"), Some(&"two".to_string()));
    }

    #[test]
    fn test_env_var_visible_through_get() {
        let mut state = ShellState::default();
        state.env.insert("HOME".to_string(), "/home/user".to_string());
        assert_eq!(state.get_scalar("HOME"), "/home/user");
        assert!(state.is_set("HOME"));
    }

    #[test]
    fn test_ifs_default() {
        let state = ShellState::default();
        assert_eq!(state.ifs(), " \t\n");
    }

    #[test]
    fn test_local_scope_restore() {
        let mut state = ShellState::default();
        state.set_scalar("x", "outer");
        state.local_scopes.push(HashMap::new());
        state.declare_local("x");
        state.set_scalar("x", "inner");
        assert_eq!(state.get_scalar("x"), "inner");
        state.pop_local_scope();
        assert_eq!(state.get_scalar("x"), "outer");
    }

    #[test]
    fn test_local_scope_removes_fresh_vars() {
        let mut state = ShellState::default();
        state.local_scopes.push(HashMap::new());
        state.declare_local("fresh");
        state.set_scalar("fresh", "v");
        state.pop_local_scope();
        assert!(!state.is_set("fresh"));
    }
}
