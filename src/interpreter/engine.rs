//! Execution engine.
//!
//! The tree-walking executor:
//!
//! execute_script -> execute_statement -> execute_pipeline -> execute_command
//!
//! Statements short-circuit across && / ||; pipeline stages run against
//! a cloned state (stage isolation) with their predecessor's stdout as
//! stdin; simple commands dispatch to functions, builtins, then the
//! external-command registry.

use std::sync::Arc;

use crate::ast::types::*;
use crate::commands::registry::CommandRegistry;
use crate::commands::types::{CommandContext, CommandResult, ExecFn, FetchFn};
use crate::fs::FileSystem;
use crate::interpreter::arithmetic::eval_arith_in;
use crate::interpreter::builtins;
use crate::interpreter::conditionals::eval_conditional;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::expansion::pattern::matches_pattern;
use crate::interpreter::redirections::{apply_io_plan, build_io_plan, IoPlan};
use crate::interpreter::sync_fs::{SyncFs, SyncFsAdapter};
use crate::interpreter::types::{ExecResult, ExecutionLimits, ShellState, Value};
use crate::interpreter::word_expansion::Expander;
use crate::network::HttpClient;

/// The execution engine. Holds the runtime services; all mutable state
/// lives in the `ShellState` threaded through the methods.
pub struct ExecutionEngine<'a> {
    pub limits: &'a ExecutionLimits,
    /// Sync view of the filesystem for the engine itself
    pub fs: &'a dyn SyncFs,
    /// Async filesystem handed to registry commands
    pub async_fs: Arc<dyn FileSystem>,
    pub registry: Arc<CommandRegistry>,
    pub handle: tokio::runtime::Handle,
    pub http_client: Option<Arc<dyn HttpClient>>,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(
        limits: &'a ExecutionLimits,
        fs: &'a dyn SyncFs,
        async_fs: Arc<dyn FileSystem>,
        registry: Arc<CommandRegistry>,
        handle: tokio::runtime::Handle,
        http_client: Option<Arc<dyn HttpClient>>,
    ) -> Self {
        Self { limits, fs, async_fs, registry, handle, http_client }
    }

    pub(crate) fn block_on<F, T>(&self, f: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        tokio::task::block_in_place(|| self.handle.block_on(f))
    }

    // =========================================================================
    // Script & statement execution
    // =========================================================================

    pub fn execute_script(
        &self,
        state: &mut ShellState,
        script: &ScriptNode,
    ) -> Result<ExecResult, InterpreterError> {
        self.execute_statements(state, &script.statements)
    }

    pub fn execute_statements(
        &self,
        state: &mut ShellState,
        statements: &[StatementNode],
    ) -> Result<ExecResult, InterpreterError> {
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for statement in statements {
            match self.execute_statement(state, statement) {
                Ok(result) => {
                    stdout.push_str(&result.stdout);
                    stderr.push_str(&result.stderr);
                    exit_code = result.exit_code;
                    state.last_exit_code = exit_code;
                }
                Err(InterpreterError::Expansion {
                    exit_code: code,
                    stdout: out,
                    stderr: err,
                    fatal: false,
                }) => {
                    // Recoverable expansion error: the command is
                    // abandoned, the script goes on
                    stdout.push_str(&out);
                    stderr.push_str(&err);
                    exit_code = code;
                    state.last_exit_code = exit_code;
                    if state.options.errexit && !state.in_condition {
                        return Err(InterpreterError::Errexit {
                            exit_code,
                            stdout,
                            stderr,
                        });
                    }
                }
                Err(e) => return Err(e.prepend_output(&stdout, &stderr)),
            }
        }

        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    pub fn execute_statement(
        &self,
        state: &mut ShellState,
        statement: &StatementNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut last_executed = 0usize;
        let mut last_negated = false;

        for (i, pipeline) in statement.pipelines.iter().enumerate() {
            if i > 0 {
                match statement.operators[i - 1] {
                    StatementOperator::And if exit_code != 0 => continue,
                    StatementOperator::Or if exit_code == 0 => continue,
                    _ => {}
                }
            }

            let result = match self.execute_pipeline(state, pipeline) {
                Ok(result) => result,
                Err(e) => return Err(e.prepend_output(&stdout, &stderr)),
            };
            stdout.push_str(&result.stdout);
            stderr.push_str(&result.stderr);
            exit_code = result.exit_code;
            last_executed = i;
            last_negated = pipeline.negated;
            state.last_exit_code = exit_code;
        }

        if statement.background {
            // Degraded background: already ran synchronously; hand out a
            // pseudo-PID for $!
            state.last_background_pid = state.next_pid;
            state.next_pid += 1;
            exit_code = 0;
            state.last_exit_code = 0;
        }

        let short_circuited = last_executed + 1 < statement.pipelines.len();
        if state.options.errexit
            && exit_code != 0
            && !short_circuited
            && !last_negated
            && !state.in_condition
        {
            return Err(InterpreterError::Errexit { exit_code, stdout, stderr });
        }

        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    // =========================================================================
    // Pipelines
    // =========================================================================

    pub fn execute_pipeline(
        &self,
        state: &mut ShellState,
        pipeline: &PipelineNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut result = if pipeline.commands.len() == 1 {
            self.execute_command(state, &pipeline.commands[0], "")
                .map(|r| {
                    state.pipestatus = vec![r.exit_code];
                    r
                })?
        } else {
            self.execute_multi_stage(state, &pipeline.commands)?
        };

        if pipeline.negated {
            result.exit_code = if result.exit_code == 0 { 1 } else { 0 };
        }

        Ok(result)
    }

    /// Multi-stage pipeline: a left-to-right fold of captured stdout.
    /// Each stage runs against cloned state and a forked filesystem;
    /// only PIPESTATUS and the exit code survive.
    fn execute_multi_stage(
        &self,
        state: &mut ShellState,
        commands: &[CommandNode],
    ) -> Result<ExecResult, InterpreterError> {
        let mut stdin = String::new();
        let mut stderr = String::new();
        let mut pipestatus = Vec::new();
        let mut last_stdout = String::new();

        for (i, command) in commands.iter().enumerate() {
            let is_last = i + 1 == commands.len();
            let stage_stdin = std::mem::take(&mut stdin);

            let (outcome, stage_state) = self.run_in_subshell(state, |engine, stage_state| {
                stage_state.group_stdin = None;
                engine.execute_command(stage_state, command, &stage_stdin)
            });
            state.command_count = stage_state.command_count;

            let result = match outcome {
                Ok(result) => result,
                // A stage is a subshell: exit and control flow end the
                // stage, not the script
                Err(InterpreterError::Limit { message, stdout, stderr }) => {
                    return Err(InterpreterError::Limit { message, stdout, stderr });
                }
                Err(e) => {
                    let code = match &e {
                        InterpreterError::Exit { exit_code, .. }
                        | InterpreterError::Return { exit_code, .. }
                        | InterpreterError::Errexit { exit_code, .. }
                        | InterpreterError::Expansion { exit_code, .. } => *exit_code,
                        _ => 0,
                    };
                    ExecResult::new(e.stdout().to_string(), e.stderr().to_string(), code)
                }
            };

            pipestatus.push(result.exit_code);
            stderr.push_str(&result.stderr);
            if is_last {
                last_stdout = result.stdout;
            } else {
                stdin = result.stdout;
            }
        }

        let exit_code = if state.options.pipefail {
            pipestatus.iter().rev().find(|&&c| c != 0).copied().unwrap_or(0)
        } else {
            *pipestatus.last().unwrap_or(&0)
        };

        state.pipestatus = pipestatus;
        Ok(ExecResult::new(last_stdout, stderr, exit_code))
    }

    // =========================================================================
    // Command dispatch
    // =========================================================================

    pub fn execute_command(
        &self,
        state: &mut ShellState,
        command: &CommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        state.command_count += 1;
        if state.command_count > self.limits.max_command_count {
            return Err(InterpreterError::limit(format!(
                "maximum command count ({}) exceeded (possible infinite loop)",
                self.limits.max_command_count
            )));
        }

        match command {
            CommandNode::Simple(simple) => self.execute_simple_command(state, simple, stdin),
            CommandNode::Compound(compound) => {
                self.execute_compound_command(state, compound, stdin)
            }
            CommandNode::FunctionDef(def) => {
                state.functions.insert(def.name.clone(), def.clone());
                Ok(ExecResult::ok())
            }
        }
    }

    // =========================================================================
    // Simple commands
    // =========================================================================

    pub fn execute_simple_command(
        &self,
        state: &mut ShellState,
        command: &SimpleCommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        let mut expander = Expander::new(self);

        // Expand the command name and arguments
        let mut words: Vec<WordNode> = Vec::new();
        if let Some(name) = &command.name {
            words.push(name.clone());
        }
        words.extend(command.args.iter().cloned());
        let argv = expander.expand_words(state, &words)?;

        // Assignment-only command: assignments persist
        if argv.is_empty() {
            for assignment in &command.assignments {
                self.apply_assignment(state, &mut expander, assignment)?;
            }
            let plan = build_io_plan(&mut expander, state, &command.redirections)?;
            let exit_code = expander.last_subst_exit.unwrap_or(0);
            let raw = ExecResult::new(String::new(), String::new(), exit_code);
            let mut result = apply_io_plan(self, raw, &plan);
            result.stderr = format!("{}{}", expander.stderr, result.stderr);
            return Ok(result);
        }

        let xtrace = if state.options.xtrace {
            format!("+ {}\n", argv.join(" "))
        } else {
            String::new()
        };

        // Prefix assignments are scoped to this invocation
        let saved = self.apply_temp_assignments(state, &command.assignments, &mut expander)?;

        let outcome = self.run_resolved_command(state, command, &argv, stdin, &mut expander);

        restore_temp_assignments(state, saved);

        let expansion_stderr = std::mem::take(&mut expander.stderr);
        match outcome {
            Ok(mut result) => {
                result.stderr = format!("{}{}{}", xtrace, expansion_stderr, result.stderr);
                Ok(result)
            }
            Err(e) => Err(e.prepend_output("", &format!("{}{}", xtrace, expansion_stderr))),
        }
    }

    fn run_resolved_command(
        &self,
        state: &mut ShellState,
        command: &SimpleCommandNode,
        argv: &[String],
        stdin: &str,
        expander: &mut Expander,
    ) -> Result<ExecResult, InterpreterError> {
        let plan = build_io_plan(expander, state, &command.redirections)?;

        let mut piped: Option<String> = plan.stdin.clone();
        if piped.is_none() && !stdin.is_empty() {
            piped = Some(stdin.to_string());
        }

        let name = argv[0].as_str();

        let raw = if let Some(func) = state.functions.get(name).cloned() {
            self.invoke_function(state, &func, &argv[1..], piped.as_deref().unwrap_or(""))?
        } else if builtins::is_builtin(name) {
            let effective_stdin = match &piped {
                Some(s) => s.clone(),
                None => String::new(),
            };
            builtins::run_builtin(self, state, argv, &effective_stdin)?
        } else {
            // External commands drain the surrounding group stdin
            let effective_stdin = match piped {
                Some(s) => s,
                None => match state.group_stdin.take() {
                    Some(gs) => {
                        state.group_stdin = Some(String::new());
                        gs
                    }
                    None => String::new(),
                },
            };
            self.run_external(state, argv, &effective_stdin)
        };

        Ok(apply_io_plan(self, raw, &plan))
    }

    /// Look up and run a registry command; a miss is exit 127.
    pub fn run_external(&self, state: &mut ShellState, argv: &[String], stdin: &str) -> ExecResult {
        let name = argv[0].as_str();
        let command = match self.registry.get(name) {
            Some(command) => command,
            None => {
                return ExecResult::failure_with_code(
                    format!("bash: {}: command not found\n", name),
                    127,
                );
            }
        };

        let ctx = CommandContext {
            args: argv.to_vec(),
            stdin: stdin.to_string(),
            cwd: state.cwd.clone(),
            env: state.env.clone(),
            fs: self.async_fs.clone(),
            exec_fn: Some(self.make_exec_fn(state)),
            fetch_fn: self.make_fetch_fn(),
            network_enabled: state.network_enabled,
        };

        let result = self.block_on(command.execute(ctx));
        ExecResult::new(result.stdout, result.stderr, result.exit_code)
    }

    /// Nested-exec callback for xargs / find -exec: dispatches straight
    /// into the registry, no shell re-entry.
    fn make_exec_fn(&self, state: &ShellState) -> ExecFn {
        let registry = self.registry.clone();
        let fs = self.async_fs.clone();
        let env = state.env.clone();
        let cwd = state.cwd.clone();
        let network_enabled = state.network_enabled;
        let fetch_fn = self.make_fetch_fn();

        Arc::new(move |argv: Vec<String>, stdin: String| {
            let registry = registry.clone();
            let fs = fs.clone();
            let env = env.clone();
            let cwd = cwd.clone();
            let fetch_fn = fetch_fn.clone();
            Box::pin(async move {
                let name = match argv.first() {
                    Some(name) => name.clone(),
                    None => return CommandResult::error("exec: empty command\n".to_string()),
                };
                match registry.get(&name) {
                    Some(command) => {
                        let ctx = CommandContext {
                            args: argv,
                            stdin,
                            cwd,
                            env,
                            fs,
                            exec_fn: None,
                            fetch_fn,
                            network_enabled,
                        };
                        command.execute(ctx).await
                    }
                    None => CommandResult::with_exit_code(
                        String::new(),
                        format!("{}: command not found\n", name),
                        127,
                    ),
                }
            })
        })
    }

    fn make_fetch_fn(&self) -> Option<FetchFn> {
        let client = self.http_client.clone()?;
        Some(Arc::new(move |request| {
            let client = client.clone();
            Box::pin(async move { client.request(request).await })
        }))
    }

    // =========================================================================
    // Assignments
    // =========================================================================

    /// Apply an assignment permanently to the state.
    pub fn apply_assignment(
        &self,
        state: &mut ShellState,
        expander: &mut Expander,
        assignment: &AssignmentNode,
    ) -> Result<(), InterpreterError> {
        let name = assignment.name.as_str();

        // Array literal: name=(a b c) / name+=(d)
        if let Some(elements) = &assignment.array {
            let values = expander.expand_words(state, elements)?;
            let new_value = if assignment.append {
                match state.get_var(name) {
                    Some(Value::Indexed(mut items)) => {
                        items.extend(values);
                        Value::Indexed(items)
                    }
                    Some(Value::Scalar(s)) => {
                        let mut items = vec![s];
                        items.extend(values);
                        Value::Indexed(items)
                    }
                    _ => Value::Indexed(values),
                }
            } else {
                Value::Indexed(values)
            };
            state.set_var(name, new_value);
            return Ok(());
        }

        let value = match &assignment.value {
            Some(word) => expander.expand_word_single(state, word)?,
            None => String::new(),
        };

        // Subscript assignment: name[sub]=value
        if let Some(subscript) = &assignment.subscript {
            return self.assign_element(state, name, subscript, &value, assignment.append);
        }

        if assignment.append {
            match state.get_var(name) {
                Some(Value::Scalar(s)) => state.set_scalar(name, format!("{}{}", s, value)),
                Some(Value::Indexed(mut items)) => {
                    // name+=x appends to element 0
                    if items.is_empty() {
                        items.push(value);
                    } else {
                        items[0] = format!("{}{}", items[0], value);
                    }
                    state.set_var(name, Value::Indexed(items));
                }
                Some(Value::Assoc(mut map)) => {
                    let entry = map.entry("0".to_string()).or_default();
                    entry.push_str(&value);
                    state.set_var(name, Value::Assoc(map));
                }
                None => state.set_scalar(name, value),
            }
        } else {
            state.set_scalar(name, value);
        }
        Ok(())
    }

    fn assign_element(
        &self,
        state: &mut ShellState,
        name: &str,
        subscript: &str,
        value: &str,
        append: bool,
    ) -> Result<(), InterpreterError> {
        // Associative arrays take the subscript as a literal key
        if let Some(Value::Assoc(mut map)) = state.get_var(name) {
            let key = subscript.trim_matches(|c| c == '"' || c == '\'').to_string();
            let entry = map.entry(key).or_default();
            if append {
                entry.push_str(value);
            } else {
                *entry = value.to_string();
            }
            state.set_var(name, Value::Assoc(map));
            return Ok(());
        }

        let expr = crate::parser::arithmetic_parser::parse_arithmetic(subscript)
            .map_err(|e| InterpreterError::expansion(e.message))?;
        let idx = eval_arith_in(Some(self), state, &expr)?;

        let mut items = match state.get_var(name) {
            Some(Value::Indexed(items)) => items,
            Some(Value::Scalar(s)) if !s.is_empty() => vec![s],
            _ => Vec::new(),
        };
        let i = if idx < 0 {
            let adjusted = items.len() as i64 + idx;
            if adjusted < 0 {
                return Err(InterpreterError::expansion(format!(
                    "{}[{}]: bad array subscript",
                    name, subscript
                )));
            }
            adjusted as usize
        } else {
            idx as usize
        };
        if i >= items.len() {
            items.resize(i + 1, String::new());
        }
        if append {
            items[i] = format!("{}{}", items[i], value);
        } else {
            items[i] = value.to_string();
        }
        state.set_var(name, Value::Indexed(items));
        Ok(())
    }

    /// Prefix assignments before a command: set and export for the
    /// invocation, returning the entries to restore.
    fn apply_temp_assignments(
        &self,
        state: &mut ShellState,
        assignments: &[AssignmentNode],
        expander: &mut Expander,
    ) -> Result<Vec<(String, Option<Value>, Option<String>)>, InterpreterError> {
        let mut saved = Vec::new();
        for assignment in assignments {
            let name = assignment.name.clone();
            let prior_var = state.vars.get(&name).cloned();
            let prior_env = state.env.get(&name).cloned();
            saved.push((name.clone(), prior_var, prior_env));

            self.apply_assignment(state, expander, assignment)?;
            // Visible in the command's environment
            let value = state.get_scalar(&name);
            state.env.insert(name, value);
        }
        Ok(saved)
    }

    // =========================================================================
    // Functions
    // =========================================================================

    pub fn invoke_function(
        &self,
        state: &mut ShellState,
        func: &FunctionDefNode,
        args: &[String],
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        if state.call_depth >= self.limits.max_recursion_depth {
            return Err(InterpreterError::limit(format!(
                "maximum function recursion depth ({}) exceeded",
                self.limits.max_recursion_depth
            )));
        }

        let saved_positional = std::mem::replace(&mut state.positional, args.to_vec());
        let saved_name = std::mem::replace(&mut state.script_name, func.name.clone());
        let saved_loop_depth = std::mem::replace(&mut state.loop_depth, 0);
        state.call_depth += 1;
        state.local_scopes.push(Default::default());

        let outcome = self.execute_compound_command(state, &func.body, stdin);

        state.pop_local_scope();
        state.call_depth -= 1;
        state.loop_depth = saved_loop_depth;
        state.script_name = saved_name;
        state.positional = saved_positional;

        match outcome {
            Ok(result) => Ok(result),
            Err(InterpreterError::Return { exit_code, stdout, stderr }) => {
                Ok(ExecResult::new(stdout, stderr, exit_code))
            }
            // An over-deep break/continue unwinds out of the function
            Err(InterpreterError::Break { stdout, stderr, .. })
            | Err(InterpreterError::Continue { stdout, stderr, .. }) => {
                Ok(ExecResult::new(stdout, stderr, state.last_exit_code))
            }
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Compound commands
    // =========================================================================

    pub fn execute_compound_command(
        &self,
        state: &mut ShellState,
        compound: &CompoundCommandNode,
        stdin: &str,
    ) -> Result<ExecResult, InterpreterError> {
        let mut expander = Expander::new(self);
        let redirections = compound_redirections(compound);
        let plan = build_io_plan(&mut expander, state, redirections)?;

        // A compound's own stdin redirection beats the pipe
        let effective_stdin = plan.stdin.clone().unwrap_or_else(|| stdin.to_string());
        let saved_group_stdin = state.group_stdin.clone();
        if !effective_stdin.is_empty() {
            state.group_stdin = Some(effective_stdin);
        }

        let outcome = self.run_compound_body(state, compound, &plan);

        state.group_stdin = saved_group_stdin;

        let mut result = match outcome {
            Ok(result) => result,
            Err(e) => return Err(e.prepend_output("", &expander.stderr)),
        };
        result = apply_io_plan(self, result, &plan);
        result.stderr = format!("{}{}", expander.stderr, result.stderr);
        Ok(result)
    }

    fn run_compound_body(
        &self,
        state: &mut ShellState,
        compound: &CompoundCommandNode,
        _plan: &IoPlan,
    ) -> Result<ExecResult, InterpreterError> {
        match compound {
            CompoundCommandNode::If(node) => self.execute_if(state, node),
            CompoundCommandNode::While(node) => {
                self.execute_while_until(state, &node.condition, &node.body, false)
            }
            CompoundCommandNode::Until(node) => {
                self.execute_while_until(state, &node.condition, &node.body, true)
            }
            CompoundCommandNode::For(node) => self.execute_for(state, node),
            CompoundCommandNode::CStyleFor(node) => self.execute_c_style_for(state, node),
            CompoundCommandNode::Case(node) => self.execute_case(state, node),
            CompoundCommandNode::Subshell(node) => self.execute_subshell(state, &node.body),
            CompoundCommandNode::Group(node) => self.execute_statements(state, &node.body),
            CompoundCommandNode::Arithmetic(node) => {
                match eval_arith_in(Some(self), state, &node.expression) {
                    Ok(value) => {
                        let exit_code = if value != 0 { 0 } else { 1 };
                        Ok(ExecResult::new(String::new(), String::new(), exit_code))
                    }
                    Err(InterpreterError::Expansion { stderr, .. }) => {
                        Ok(ExecResult::failure(stderr))
                    }
                    Err(e) => Err(e),
                }
            }
            CompoundCommandNode::Conditional(node) => {
                let mut expander = Expander::new(self);
                let truth = eval_conditional(&mut expander, state, &node.expression)?;
                let exit_code = if truth { 0 } else { 1 };
                Ok(ExecResult::new(String::new(), expander.stderr.clone(), exit_code))
            }
        }
    }

    fn execute_if(
        &self,
        state: &mut ShellState,
        node: &IfNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut stdout = String::new();
        let mut stderr = String::new();

        for clause in &node.clauses {
            let was_in_condition = state.in_condition;
            state.in_condition = true;
            let cond = self.execute_statements(state, &clause.condition);
            state.in_condition = was_in_condition;
            let cond = cond?;

            stdout.push_str(&cond.stdout);
            stderr.push_str(&cond.stderr);

            if cond.exit_code == 0 {
                let body = match self.execute_statements(state, &clause.body) {
                    Ok(result) => result,
                    Err(e) => return Err(e.prepend_output(&stdout, &stderr)),
                };
                stdout.push_str(&body.stdout);
                stderr.push_str(&body.stderr);
                return Ok(ExecResult::new(stdout, stderr, body.exit_code));
            }
        }

        if let Some(else_body) = &node.else_body {
            let body = match self.execute_statements(state, else_body) {
                Ok(result) => result,
                Err(e) => return Err(e.prepend_output(&stdout, &stderr)),
            };
            stdout.push_str(&body.stdout);
            stderr.push_str(&body.stderr);
            return Ok(ExecResult::new(stdout, stderr, body.exit_code));
        }

        Ok(ExecResult::new(stdout, stderr, 0))
    }

    fn execute_while_until(
        &self,
        state: &mut ShellState,
        condition: &[StatementNode],
        body: &[StatementNode],
        until: bool,
    ) -> Result<ExecResult, InterpreterError> {
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut iterations: u64 = 0;

        state.loop_depth += 1;
        let outcome = loop {
            iterations += 1;
            if iterations > self.limits.max_iterations {
                break Err(InterpreterError::limit(format!(
                    "maximum loop iterations ({}) exceeded",
                    self.limits.max_iterations
                )));
            }

            let was_in_condition = state.in_condition;
            state.in_condition = true;
            let cond = self.execute_statements(state, condition);
            state.in_condition = was_in_condition;
            let cond = match cond {
                Ok(result) => result,
                Err(e) => break Err(e),
            };
            stdout.push_str(&cond.stdout);
            stderr.push_str(&cond.stderr);

            let proceed = if until { cond.exit_code != 0 } else { cond.exit_code == 0 };
            if !proceed {
                break Ok(());
            }

            match self.execute_statements(state, body) {
                Ok(result) => {
                    stdout.push_str(&result.stdout);
                    stderr.push_str(&result.stderr);
                    exit_code = result.exit_code;
                }
                Err(e) => match self.handle_loop_signal(e, &mut stdout, &mut stderr) {
                    LoopSignal::Break => break Ok(()),
                    LoopSignal::Continue => continue,
                    LoopSignal::Propagate(err) => break Err(err),
                },
            }
        };
        state.loop_depth -= 1;

        match outcome {
            Ok(()) => Ok(ExecResult::new(stdout, stderr, exit_code)),
            Err(e) => Err(e.prepend_output(&stdout, &stderr)),
        }
    }

    fn execute_for(
        &self,
        state: &mut ShellState,
        node: &ForNode,
    ) -> Result<ExecResult, InterpreterError> {
        let words = match &node.words {
            Some(words) => {
                let mut expander = Expander::new(self);
                expander.expand_words(state, words)?
            }
            None => state.positional.clone(),
        };

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        state.loop_depth += 1;
        let mut outcome = Ok(());
        'iteration: for (i, word) in words.iter().enumerate() {
            if (i as u64) >= self.limits.max_iterations {
                outcome = Err(InterpreterError::limit(format!(
                    "maximum loop iterations ({}) exceeded",
                    self.limits.max_iterations
                )));
                break;
            }
            state.set_scalar(&node.variable, word.clone());

            match self.execute_statements(state, &node.body) {
                Ok(result) => {
                    stdout.push_str(&result.stdout);
                    stderr.push_str(&result.stderr);
                    exit_code = result.exit_code;
                }
                Err(e) => match self.handle_loop_signal(e, &mut stdout, &mut stderr) {
                    LoopSignal::Break => break,
                    LoopSignal::Continue => continue 'iteration,
                    LoopSignal::Propagate(err) => {
                        outcome = Err(err);
                        break;
                    }
                },
            }
        }
        state.loop_depth -= 1;

        match outcome {
            Ok(()) => Ok(ExecResult::new(stdout, stderr, exit_code)),
            Err(e) => Err(e.prepend_output(&stdout, &stderr)),
        }
    }

    fn execute_c_style_for(
        &self,
        state: &mut ShellState,
        node: &CStyleForNode,
    ) -> Result<ExecResult, InterpreterError> {
        if let Some(init) = &node.init {
            eval_arith_in(Some(self), state, init)?;
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut iterations: u64 = 0;

        state.loop_depth += 1;
        let outcome = loop {
            iterations += 1;
            if iterations > self.limits.max_iterations {
                break Err(InterpreterError::limit(format!(
                    "maximum loop iterations ({}) exceeded",
                    self.limits.max_iterations
                )));
            }

            let proceed = match &node.condition {
                Some(condition) => match eval_arith_in(Some(self), state, condition) {
                    Ok(value) => value != 0,
                    Err(e) => break Err(e),
                },
                None => true,
            };
            if !proceed {
                break Ok(());
            }

            match self.execute_statements(state, &node.body) {
                Ok(result) => {
                    stdout.push_str(&result.stdout);
                    stderr.push_str(&result.stderr);
                    exit_code = result.exit_code;
                }
                Err(e) => match self.handle_loop_signal(e, &mut stdout, &mut stderr) {
                    LoopSignal::Break => break Ok(()),
                    LoopSignal::Continue => {
                        if let Some(update) = &node.update {
                            if let Err(e) = eval_arith_in(Some(self), state, update) {
                                break Err(e);
                            }
                        }
                        continue;
                    }
                    LoopSignal::Propagate(err) => break Err(err),
                },
            }

            if let Some(update) = &node.update {
                if let Err(e) = eval_arith_in(Some(self), state, update) {
                    break Err(e);
                }
            }
        };
        state.loop_depth -= 1;

        match outcome {
            Ok(()) => Ok(ExecResult::new(stdout, stderr, exit_code)),
            Err(e) => Err(e.prepend_output(&stdout, &stderr)),
        }
    }

    fn execute_case(
        &self,
        state: &mut ShellState,
        node: &CaseNode,
    ) -> Result<ExecResult, InterpreterError> {
        let mut expander = Expander::new(self);
        let subject = expander.expand_word_single(state, &node.word)?;

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut fall_through = false;

        for item in &node.items {
            let mut run = fall_through;
            if !run {
                for pattern_word in &item.patterns {
                    let pattern = expander.expand_word_pattern(state, pattern_word)?;
                    if matches_pattern(&pattern, &subject) {
                        run = true;
                        break;
                    }
                }
            }
            if !run {
                continue;
            }

            let result = match self.execute_statements(state, &item.body) {
                Ok(result) => result,
                Err(e) => return Err(e.prepend_output(&stdout, &stderr)),
            };
            stdout.push_str(&result.stdout);
            stderr.push_str(&result.stderr);
            exit_code = result.exit_code;

            match item.terminator {
                CaseTerminator::Break => break,
                CaseTerminator::FallThrough => fall_through = true,
                CaseTerminator::Continue => fall_through = false,
            }
        }

        let stderr = format!("{}{}", expander.stderr, stderr);
        Ok(ExecResult::new(stdout, stderr, exit_code))
    }

    /// Run a closure against cloned state and a forked filesystem. The
    /// fork (and every mutation made through it) is dropped afterwards;
    /// the final sub-state is returned for bookkeeping.
    fn run_in_subshell<F>(
        &self,
        state: &ShellState,
        body: F,
    ) -> (Result<ExecResult, InterpreterError>, ShellState)
    where
        F: FnOnce(&ExecutionEngine, &mut ShellState) -> Result<ExecResult, InterpreterError>,
    {
        let forked_fs = self.block_on(self.async_fs.fork());
        let sync_fs = SyncFsAdapter::new(forked_fs.clone(), self.handle.clone());
        let sub_engine = ExecutionEngine::new(
            self.limits,
            &sync_fs,
            forked_fs,
            self.registry.clone(),
            self.handle.clone(),
            self.http_client.clone(),
        );

        let mut sub_state = state.clone();
        let outcome = body(&sub_engine, &mut sub_state);
        (outcome, sub_state)
    }

    /// Subshell: run against a clone, discard state changes (including
    /// filesystem writes), keep output.
    fn execute_subshell(
        &self,
        state: &mut ShellState,
        body: &[StatementNode],
    ) -> Result<ExecResult, InterpreterError> {
        let (outcome, sub_state) =
            self.run_in_subshell(state, |engine, sub_state| {
                engine.execute_statements(sub_state, body)
            });

        let result = match outcome {
            Ok(result) => result,
            Err(InterpreterError::Exit { exit_code, stdout, stderr })
            | Err(InterpreterError::Errexit { exit_code, stdout, stderr }) => {
                ExecResult::new(stdout, stderr, exit_code)
            }
            Err(InterpreterError::Break { stdout, stderr, .. })
            | Err(InterpreterError::Continue { stdout, stderr, .. }) => {
                ExecResult::new(stdout, stderr, 0)
            }
            Err(InterpreterError::Return { exit_code, stdout, stderr }) => {
                ExecResult::new(stdout, stderr, exit_code)
            }
            Err(e) => return Err(e),
        };
        // Bookkeeping that crosses the subshell boundary
        state.command_count = sub_state.command_count;
        state.last_exit_code = result.exit_code;
        Ok(result)
    }

    /// Command substitution body: subshell semantics with captured output.
    pub fn run_command_substitution(&self, state: &mut ShellState, body: &ScriptNode) -> ExecResult {
        let (outcome, sub_state) = self.run_in_subshell(state, |engine, sub_state| {
            sub_state.group_stdin = None;
            engine.execute_statements(sub_state, &body.statements)
        });

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                let exit_code = match &e {
                    InterpreterError::Exit { exit_code, .. }
                    | InterpreterError::Return { exit_code, .. }
                    | InterpreterError::Errexit { exit_code, .. }
                    | InterpreterError::Expansion { exit_code, .. } => *exit_code,
                    InterpreterError::Limit { .. } => InterpreterError::LIMIT_EXIT_CODE,
                    _ => 0,
                };
                ExecResult::new(e.stdout().to_string(), e.stderr().to_string(), exit_code)
            }
        };
        state.command_count = sub_state.command_count;
        result
    }

    /// Literal text of a word without any expansion (quoted here-docs).
    pub fn literal_word_text(&self, word: &WordNode) -> String {
        let mut out = String::new();
        for part in &word.parts {
            match part {
                WordPart::Literal(s)
                | WordPart::SingleQuoted(s)
                | WordPart::Escaped(s)
                | WordPart::Glob(s) => out.push_str(s),
                _ => {}
            }
        }
        out
    }

    fn handle_loop_signal(
        &self,
        error: InterpreterError,
        stdout: &mut String,
        stderr: &mut String,
    ) -> LoopSignal {
        match error {
            InterpreterError::Break { levels, stdout: out, stderr: err } => {
                stdout.push_str(&out);
                stderr.push_str(&err);
                if levels > 1 {
                    LoopSignal::Propagate(InterpreterError::break_levels(levels - 1))
                } else {
                    LoopSignal::Break
                }
            }
            InterpreterError::Continue { levels, stdout: out, stderr: err } => {
                stdout.push_str(&out);
                stderr.push_str(&err);
                if levels > 1 {
                    LoopSignal::Propagate(InterpreterError::continue_levels(levels - 1))
                } else {
                    LoopSignal::Continue
                }
            }
            other => LoopSignal::Propagate(other),
        }
    }
}

/// Undo prefix assignments after the command they scoped to.
fn restore_temp_assignments(
    state: &mut ShellState,
    saved: Vec<(String, Option<Value>, Option<String>)>,
) {
    for (name, prior_var, prior_env) in saved.into_iter().rev() {
        match prior_var {
            Some(value) => {
                state.vars.insert(name.clone(), value);
            }
            None => {
                state.vars.remove(&name);
            }
        }
        match prior_env {
            Some(value) => {
                state.env.insert(name, value);
            }
            None => {
                state.env.remove(&name);
            }
        }
    }
}

enum LoopSignal {
    Break,
    Continue,
    Propagate(InterpreterError),
}

fn compound_redirections(compound: &CompoundCommandNode) -> &[RedirectionNode] {
    match compound {
        CompoundCommandNode::If(n) => &n.redirections,
        CompoundCommandNode::For(n) => &n.redirections,
        CompoundCommandNode::CStyleFor(n) => &n.redirections,
        CompoundCommandNode::While(n) => &n.redirections,
        CompoundCommandNode::Until(n) => &n.redirections,
        CompoundCommandNode::Case(n) => &n.redirections,
        CompoundCommandNode::Subshell(n) => &n.redirections,
        CompoundCommandNode::Group(n) => &n.redirections,
        CompoundCommandNode::Arithmetic(n) => &n.redirections,
        CompoundCommandNode::Conditional(n) => &n.redirections,
    }
}
