//! test / [ builtin.
//!
//! Same predicate set as [[ ]] minus pattern matching and =~: string
//! comparisons are literal, plus the -a / -o connectives and ! and
//! ( ) grouping.

use crate::interpreter::conditionals::{
    binary_op_for_flag, eval_unary, file_compare, numeric_compare, unary_op_for_flag,
};
use crate::ast::types::CondBinaryOp;
use crate::interpreter::engine::ExecutionEngine;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::{ExecResult, ShellState};

pub fn bracket(
    engine: &ExecutionEngine,
    state: &mut ShellState,
    args: &[String],
) -> Result<ExecResult, InterpreterError> {
    match args.last() {
        Some(last) if last == "]" => test(engine, state, &args[..args.len() - 1]),
        _ => Ok(ExecResult::failure_with_code("bash: [: missing `]'\n", 2)),
    }
}

pub fn test(
    engine: &ExecutionEngine,
    state: &mut ShellState,
    args: &[String],
) -> Result<ExecResult, InterpreterError> {
    let mut parser = TestParser { engine, state, args, pos: 0 };
    match parser.parse_or() {
        Ok(value) => {
            if parser.pos < args.len() {
                return Ok(ExecResult::failure_with_code(
                    format!("bash: test: {}: unexpected argument\n", args[parser.pos]),
                    2,
                ));
            }
            Ok(ExecResult::new(String::new(), String::new(), if value { 0 } else { 1 }))
        }
        Err(message) => Ok(ExecResult::failure_with_code(format!("bash: test: {}\n", message), 2)),
    }
}

struct TestParser<'p, 'a> {
    engine: &'p ExecutionEngine<'a>,
    state: &'p mut ShellState,
    args: &'p [String],
    pos: usize,
}

impl<'p, 'a> TestParser<'p, 'a> {
    fn peek(&self) -> Option<&str> {
        self.args.get(self.pos).map(|s| s.as_str())
    }

    fn bump(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos).cloned();
        if arg.is_some() {
            self.pos += 1;
        }
        arg
    }

    fn parse_or(&mut self) -> Result<bool, String> {
        let mut value = self.parse_and()?;
        while self.peek() == Some("-o") {
            self.pos += 1;
            let right = self.parse_and()?;
            value = value || right;
        }
        Ok(value)
    }

    fn parse_and(&mut self) -> Result<bool, String> {
        let mut value = self.parse_not()?;
        while self.peek() == Some("-a") {
            self.pos += 1;
            let right = self.parse_not()?;
            value = value && right;
        }
        Ok(value)
    }

    fn parse_not(&mut self) -> Result<bool, String> {
        if self.peek() == Some("!") {
            self.pos += 1;
            return Ok(!self.parse_not()?);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<bool, String> {
        if self.peek() == Some("(") {
            self.pos += 1;
            let value = self.parse_or()?;
            if self.bump().as_deref() != Some(")") {
                return Err("expected `)'".to_string());
            }
            return Ok(value);
        }

        let first = match self.bump() {
            Some(arg) => arg,
            // Zero arguments: false
            None => return Ok(false),
        };

        // Unary predicate with operand. Note: -a doubles as the file
        // existence test when an operand follows and no binary op does.
        if let Some(op) = unary_op_for_flag(&first) {
            let binary_follows =
                self.args.get(self.pos + 1).map(|a| binary_op_for_flag(a).is_some()).unwrap_or(false);
            if self.peek().is_some() && (first != "-a" || !binary_follows) {
                let operand = self.bump().unwrap();
                return Ok(eval_unary(self.engine.fs, self.state, op, &operand));
            }
        }

        // Binary comparison
        if let Some(op_text) = self.peek() {
            if let Some(op) = binary_op_for_flag(op_text) {
                let op_text = op_text.to_string();
                self.pos += 1;
                let right = self
                    .bump()
                    .ok_or_else(|| format!("{}: unary operator expected", op_text))?;
                return self.eval_binary(op, &first, &right);
            }
        }

        // A lone argument: true when non-empty
        Ok(!first.is_empty())
    }

    fn eval_binary(&mut self, op: CondBinaryOp, left: &str, right: &str) -> Result<bool, String> {
        match op {
            CondBinaryOp::Eq => Ok(left == right),
            CondBinaryOp::Ne => Ok(left != right),
            CondBinaryOp::Lt => Ok(left < right),
            CondBinaryOp::Gt => Ok(left > right),
            CondBinaryOp::NumEq
            | CondBinaryOp::NumNe
            | CondBinaryOp::NumLt
            | CondBinaryOp::NumLe
            | CondBinaryOp::NumGt
            | CondBinaryOp::NumGe => {
                let a = parse_number(left)?;
                let b = parse_number(right)?;
                Ok(numeric_compare(op, a, b))
            }
            CondBinaryOp::Nt | CondBinaryOp::Ot | CondBinaryOp::Ef => {
                Ok(file_compare(self.engine.fs, self.state, op, left, right))
            }
            CondBinaryOp::Match => Err("=~: operator not supported by test".to_string()),
        }
    }
}

fn parse_number(text: &str) -> Result<i64, String> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| format!("{}: integer expression expected", text))
}
