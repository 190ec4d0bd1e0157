//! Redirection handling.
//!
//! A command's redirection list is translated into an `IoPlan` before
//! the command runs: an effective stdin string plus sink descriptions
//! for stdout and stderr. After the command produces its raw output,
//! `apply_io_plan` routes the streams into captures or the virtual
//! filesystem.

use crate::ast::types::{RedirectionNode, RedirectionOperator, RedirectionTarget};
use crate::interpreter::engine::ExecutionEngine;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::{ExecResult, ShellState};
use crate::interpreter::word_expansion::Expander;

/// Where an output stream goes.
#[derive(Debug, Clone, PartialEq)]
pub enum OutTarget {
    /// Captured into the result
    Capture,
    /// Written to a file in the virtual fs
    File { path: String, append: bool },
    /// Folded into the other stream's capture (2>&1 / 1>&2)
    MergeToStdout,
    MergeToStderr,
    /// Dropped (/dev/null or closed fd)
    Discard,
}

/// The effective I/O bindings for one command invocation.
#[derive(Debug, Clone)]
pub struct IoPlan {
    /// Replacement stdin, when a redirection provided one
    pub stdin: Option<String>,
    pub stdout: OutTarget,
    pub stderr: OutTarget,
}

impl Default for IoPlan {
    fn default() -> Self {
        Self { stdin: None, stdout: OutTarget::Capture, stderr: OutTarget::Capture }
    }
}

/// Interpret a file path as an output target, handling the device files.
fn file_target(path: String, append: bool) -> OutTarget {
    match path.as_str() {
        "/dev/null" => OutTarget::Discard,
        "/dev/stdout" => OutTarget::Capture,
        "/dev/stderr" => OutTarget::MergeToStderr,
        _ => OutTarget::File { path, append },
    }
}

/// Build the I/O plan for a redirection list, in order. Input files are
/// read eagerly; a missing file aborts the command with exit 1.
pub fn build_io_plan(
    expander: &mut Expander,
    state: &mut ShellState,
    redirections: &[RedirectionNode],
) -> Result<IoPlan, InterpreterError> {
    let mut plan = IoPlan::default();

    for redirection in redirections {
        match redirection.operator {
            RedirectionOperator::Less | RedirectionOperator::LessGreat => {
                let path = expand_target(expander, state, redirection)?;
                let resolved = expander.engine.fs.resolve_path(&state.cwd, &path);
                match expander.engine.fs.read_file(&resolved) {
                    Ok(content) => plan.stdin = Some(content),
                    Err(e) => {
                        if redirection.operator == RedirectionOperator::LessGreat {
                            let _ = expander.engine.fs.write_file(&resolved, "");
                            plan.stdin = Some(String::new());
                        } else {
                            return Err(InterpreterError::expansion(format!(
                                "{}: {}",
                                path,
                                e.strerror()
                            )));
                        }
                    }
                }
            }

            RedirectionOperator::TLess => {
                let word = expand_target(expander, state, redirection)?;
                plan.stdin = Some(format!("{}\n", word));
            }

            RedirectionOperator::DLess | RedirectionOperator::DLessDash => {
                if let RedirectionTarget::HereDoc(heredoc) = &redirection.target {
                    let body = match &heredoc.content {
                        Some(word) => {
                            if heredoc.quoted {
                                expander
                                    .engine
                                    .literal_word_text(word)
                            } else {
                                expander.expand_word_single(state, word)?
                            }
                        }
                        None => String::new(),
                    };
                    plan.stdin = Some(body);
                }
            }

            RedirectionOperator::Great | RedirectionOperator::Clobber => {
                let path = expand_target(expander, state, redirection)?;
                let resolved = expander.engine.fs.resolve_path(&state.cwd, &path);
                route_output(
                    expander.engine,
                    &mut plan,
                    redirection.fd.unwrap_or(1),
                    file_target(resolved, false),
                );
            }

            RedirectionOperator::DGreat => {
                let path = expand_target(expander, state, redirection)?;
                let resolved = expander.engine.fs.resolve_path(&state.cwd, &path);
                route_output(
                    expander.engine,
                    &mut plan,
                    redirection.fd.unwrap_or(1),
                    file_target(resolved, true),
                );
            }

            RedirectionOperator::AndGreat | RedirectionOperator::AndDGreat => {
                let append = redirection.operator == RedirectionOperator::AndDGreat;
                let path = expand_target(expander, state, redirection)?;
                let resolved = expander.engine.fs.resolve_path(&state.cwd, &path);
                let target = file_target(resolved, append);
                plan.stdout = target.clone();
                plan.stderr = target;
            }

            RedirectionOperator::GreatAnd => {
                let target_text = expand_target(expander, state, redirection)?;
                let fd = redirection.fd.unwrap_or(1);
                match target_text.as_str() {
                    "1" => {
                        if fd == 2 {
                            plan.stderr = dup_of(&plan.stdout, true);
                        }
                    }
                    "2" => {
                        if fd == 1 {
                            plan.stdout = dup_of(&plan.stderr, false);
                        }
                    }
                    "-" => route_output(expander.engine, &mut plan, fd, OutTarget::Discard),
                    text if text.chars().all(|c| c.is_ascii_digit()) => {
                        // Duplications onto fds we don't model are dropped
                    }
                    path => {
                        // >&file is the historical spelling of &>file
                        let resolved = expander.engine.fs.resolve_path(&state.cwd, path);
                        if redirection.fd.is_none() {
                            let target = file_target(resolved, false);
                            plan.stdout = target.clone();
                            plan.stderr = target;
                        } else {
                            route_output(
                                expander.engine,
                                &mut plan,
                                fd,
                                file_target(resolved, false),
                            );
                        }
                    }
                }
            }

            RedirectionOperator::LessAnd => {
                // <&n duplication of input fds: nothing to model
            }
        }
    }

    Ok(plan)
}

fn expand_target(
    expander: &mut Expander,
    state: &mut ShellState,
    redirection: &RedirectionNode,
) -> Result<String, InterpreterError> {
    match &redirection.target {
        RedirectionTarget::Word(word) => expander.expand_word_single(state, word),
        RedirectionTarget::HereDoc(_) => Ok(String::new()),
    }
}

/// Bind an output target to an fd. Streams 1 and 2 flow through the
/// plan; any other fd is opened for effect only, so its file is created
/// (or truncated) immediately.
fn route_output(engine: &ExecutionEngine, plan: &mut IoPlan, fd: i32, target: OutTarget) {
    match fd {
        1 => plan.stdout = target,
        2 => plan.stderr = target,
        _ => {
            if let OutTarget::File { path, append } = target {
                let _ = if append {
                    engine.fs.append_file(&path, "")
                } else {
                    engine.fs.write_file(&path, "")
                };
            }
        }
    }
}

/// `2>&1`: stderr follows wherever stdout currently points.
fn dup_of(current: &OutTarget, to_stdout: bool) -> OutTarget {
    match current {
        OutTarget::Capture => {
            if to_stdout {
                OutTarget::MergeToStdout
            } else {
                OutTarget::MergeToStderr
            }
        }
        other => other.clone(),
    }
}

/// Route a command's raw streams through the plan, performing file
/// writes against the virtual fs.
pub fn apply_io_plan(
    engine: &ExecutionEngine,
    result: ExecResult,
    plan: &IoPlan,
) -> ExecResult {
    let mut captured_out = String::new();
    let mut captured_err = String::new();

    // &>file: both streams into one file, stdout first
    if let (OutTarget::File { path: p1, append }, OutTarget::File { path: p2, .. }) =
        (&plan.stdout, &plan.stderr)
    {
        if p1 == p2 {
            let combined = format!("{}{}", result.stdout, result.stderr);
            let outcome = if *append {
                engine.fs.append_file(p1, &combined)
            } else {
                engine.fs.write_file(p1, &combined)
            };
            if let Err(e) = outcome {
                captured_err.push_str(&format!("bash: {}: {}\n", p1, e.strerror()));
            }
            let mut routed = result;
            routed.stdout = captured_out;
            routed.stderr = captured_err;
            return routed;
        }
    }

    match &plan.stdout {
        OutTarget::Capture => captured_out.push_str(&result.stdout),
        OutTarget::MergeToStderr => captured_err.push_str(&result.stdout),
        OutTarget::MergeToStdout => captured_out.push_str(&result.stdout),
        OutTarget::Discard => {}
        OutTarget::File { path, append } => {
            let outcome = if *append {
                engine.fs.append_file(path, &result.stdout)
            } else {
                engine.fs.write_file(path, &result.stdout)
            };
            if let Err(e) = outcome {
                captured_err.push_str(&format!("bash: {}: {}\n", path, e.strerror()));
            }
        }
    }

    match &plan.stderr {
        OutTarget::Capture => captured_err.push_str(&result.stderr),
        OutTarget::MergeToStdout => captured_out.push_str(&result.stderr),
        OutTarget::MergeToStderr => captured_err.push_str(&result.stderr),
        OutTarget::Discard => {}
        OutTarget::File { path, append } => {
            let outcome = if *append {
                engine.fs.append_file(path, &result.stderr)
            } else {
                engine.fs.write_file(path, &result.stderr)
            };
            if let Err(e) = outcome {
                captured_err.push_str(&format!("bash: {}: {}\n", path, e.strerror()));
            }
        }
    }

    let mut routed = result;
    routed.stdout = captured_out;
    routed.stderr = captured_err;
    routed
}
