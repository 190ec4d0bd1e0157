//! Conditional evaluation for [[ ]] and the test builtin backend.

use regex_lite::Regex;

use crate::ast::types::{CondBinaryOp, CondExpr, CondUnaryOp};
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::expansion::pattern::matches_pattern;
use crate::interpreter::sync_fs::SyncFs;
use crate::interpreter::types::ShellState;
use crate::interpreter::word_expansion::Expander;

/// Evaluate a [[ ]] expression to a boolean.
pub fn eval_conditional(
    expander: &mut Expander,
    state: &mut ShellState,
    expr: &CondExpr,
) -> Result<bool, InterpreterError> {
    match expr {
        CondExpr::Not(inner) => Ok(!eval_conditional(expander, state, inner)?),
        CondExpr::Group(inner) => eval_conditional(expander, state, inner),
        CondExpr::And(left, right) => {
            // Short-circuit like the command-level &&
            if !eval_conditional(expander, state, left)? {
                return Ok(false);
            }
            eval_conditional(expander, state, right)
        }
        CondExpr::Or(left, right) => {
            if eval_conditional(expander, state, left)? {
                return Ok(true);
            }
            eval_conditional(expander, state, right)
        }
        CondExpr::Word(word) => {
            let value = expander.expand_word_single(state, word)?;
            Ok(!value.is_empty())
        }
        CondExpr::Unary { op, operand } => {
            let value = expander.expand_word_single(state, operand)?;
            Ok(eval_unary(expander.engine.fs, state, *op, &value))
        }
        CondExpr::Binary { op, left, right } => {
            let lhs = expander.expand_word_single(state, left)?;
            match op {
                CondBinaryOp::Eq | CondBinaryOp::Ne => {
                    // The right side is a shell pattern inside [[ ]]
                    let pattern = expander.expand_word_pattern(state, right)?;
                    let matched = matches_pattern(&pattern, &lhs);
                    Ok(if *op == CondBinaryOp::Eq { matched } else { !matched })
                }
                CondBinaryOp::Match => {
                    let regex_src = expander.expand_word_single(state, right)?;
                    match Regex::new(&regex_src) {
                        Ok(re) => Ok(re.is_match(&lhs)),
                        Err(_) => Err(InterpreterError::expansion(format!(
                            "invalid regex: {}",
                            regex_src
                        ))),
                    }
                }
                CondBinaryOp::Lt => {
                    let rhs = expander.expand_word_single(state, right)?;
                    Ok(lhs < rhs)
                }
                CondBinaryOp::Gt => {
                    let rhs = expander.expand_word_single(state, right)?;
                    Ok(lhs > rhs)
                }
                CondBinaryOp::NumEq
                | CondBinaryOp::NumNe
                | CondBinaryOp::NumLt
                | CondBinaryOp::NumLe
                | CondBinaryOp::NumGt
                | CondBinaryOp::NumGe => {
                    let rhs = expander.expand_word_single(state, right)?;
                    let a = arith_value(state, &lhs)?;
                    let b = arith_value(state, &rhs)?;
                    Ok(numeric_compare(*op, a, b))
                }
                CondBinaryOp::Nt | CondBinaryOp::Ot | CondBinaryOp::Ef => {
                    let rhs = expander.expand_word_single(state, right)?;
                    Ok(file_compare(expander.engine.fs, state, *op, &lhs, &rhs))
                }
            }
        }
    }
}

/// Numeric operands inside [[ ]] are arithmetic expressions.
pub fn arith_value(state: &mut ShellState, text: &str) -> Result<i64, InterpreterError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    match crate::parser::arithmetic_parser::parse_arithmetic(trimmed) {
        Ok(expr) => crate::interpreter::arithmetic::eval_arith(state, &expr),
        Err(_) => Err(InterpreterError::expansion(format!(
            "{}: integer expression expected",
            text
        ))),
    }
}

pub fn numeric_compare(op: CondBinaryOp, a: i64, b: i64) -> bool {
    match op {
        CondBinaryOp::NumEq => a == b,
        CondBinaryOp::NumNe => a != b,
        CondBinaryOp::NumLt => a < b,
        CondBinaryOp::NumLe => a <= b,
        CondBinaryOp::NumGt => a > b,
        CondBinaryOp::NumGe => a >= b,
        _ => false,
    }
}

/// Unary predicates; file tests resolve against the cwd.
pub fn eval_unary(fs: &dyn SyncFs, state: &ShellState, op: CondUnaryOp, operand: &str) -> bool {
    match op {
        CondUnaryOp::IsZero => operand.is_empty(),
        CondUnaryOp::IsNonZero => !operand.is_empty(),
        CondUnaryOp::IsSetVar => state.is_set(operand),
        CondUnaryOp::IsTty => false,
        _ => {
            let path = fs.resolve_path(&state.cwd, operand);
            match op {
                CondUnaryOp::Exists => fs.exists(&path),
                CondUnaryOp::IsFile => fs.is_file(&path),
                CondUnaryOp::IsDirectory => fs.is_dir(&path),
                CondUnaryOp::IsSymlink => {
                    fs.lstat(&path).map(|s| s.is_symlink).unwrap_or(false)
                }
                // No user/group model in the sandbox: any permission
                // bit of the class satisfies the test
                CondUnaryOp::IsReadable => {
                    fs.stat(&path).map(|s| s.mode & 0o444 != 0).unwrap_or(false)
                }
                CondUnaryOp::IsWritable => {
                    fs.stat(&path).map(|s| s.mode & 0o222 != 0).unwrap_or(false)
                }
                CondUnaryOp::IsExecutable => {
                    fs.stat(&path).map(|s| s.is_directory || s.mode & 0o111 != 0).unwrap_or(false)
                }
                CondUnaryOp::NonEmptyFile => fs.stat(&path).map(|s| s.size > 0).unwrap_or(false),
                _ => false,
            }
        }
    }
}

/// -nt / -ot / -ef comparisons.
pub fn file_compare(
    fs: &dyn SyncFs,
    state: &ShellState,
    op: CondBinaryOp,
    left: &str,
    right: &str,
) -> bool {
    let lp = fs.resolve_path(&state.cwd, left);
    let rp = fs.resolve_path(&state.cwd, right);
    match op {
        CondBinaryOp::Ef => fs.exists(&lp) && fs.exists(&rp) && lp == rp,
        CondBinaryOp::Nt | CondBinaryOp::Ot => {
            let lm = fs.stat(&lp).ok().map(|s| s.mtime);
            let rm = fs.stat(&rp).ok().map(|s| s.mtime);
            match (lm, rm, op) {
                (Some(a), Some(b), CondBinaryOp::Nt) => a > b,
                (Some(a), Some(b), CondBinaryOp::Ot) => a < b,
                (Some(_), None, CondBinaryOp::Nt) => true,
                (None, Some(_), CondBinaryOp::Ot) => true,
                _ => false,
            }
        }
        _ => false,
    }
}

/// Map a test-builtin unary flag to its predicate.
pub fn unary_op_for_flag(flag: &str) -> Option<CondUnaryOp> {
    match flag {
        "-e" | "-a" => Some(CondUnaryOp::Exists),
        "-f" => Some(CondUnaryOp::IsFile),
        "-d" => Some(CondUnaryOp::IsDirectory),
        "-h" | "-L" => Some(CondUnaryOp::IsSymlink),
        "-r" => Some(CondUnaryOp::IsReadable),
        "-w" => Some(CondUnaryOp::IsWritable),
        "-x" => Some(CondUnaryOp::IsExecutable),
        "-s" => Some(CondUnaryOp::NonEmptyFile),
        "-z" => Some(CondUnaryOp::IsZero),
        "-n" => Some(CondUnaryOp::IsNonZero),
        "-v" => Some(CondUnaryOp::IsSetVar),
        "-t" => Some(CondUnaryOp::IsTty),
        _ => None,
    }
}

/// Map a test-builtin binary flag to its comparison.
pub fn binary_op_for_flag(flag: &str) -> Option<CondBinaryOp> {
    match flag {
        "=" | "==" => Some(CondBinaryOp::Eq),
        "!=" => Some(CondBinaryOp::Ne),
        "<" => Some(CondBinaryOp::Lt),
        ">" => Some(CondBinaryOp::Gt),
        "-eq" => Some(CondBinaryOp::NumEq),
        "-ne" => Some(CondBinaryOp::NumNe),
        "-lt" => Some(CondBinaryOp::NumLt),
        "-le" => Some(CondBinaryOp::NumLe),
        "-gt" => Some(CondBinaryOp::NumGt),
        "-ge" => Some(CondBinaryOp::NumGe),
        "-nt" => Some(CondBinaryOp::Nt),
        "-ot" => Some(CondBinaryOp::Ot),
        "-ef" => Some(CondBinaryOp::Ef),
        _ => None,
    }
}
