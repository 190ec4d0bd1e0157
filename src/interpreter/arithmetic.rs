//! Arithmetic evaluation.
//!
//! Walks the arithmetic AST with 64-bit wrapping semantics, truncated
//! division, and assignment side effects on the shell state. Undefined
//! identifiers evaluate to 0; a variable's value is itself parsed as an
//! integer (leading/trailing whitespace tolerated).

use crate::ast::types::{ArithAssignOp, ArithBinaryOp, ArithExpr, ArithUnaryOp};
use crate::interpreter::engine::ExecutionEngine;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::types::{ShellState, Value};

/// Evaluate an arithmetic expression against the state. Nested command
/// substitutions evaluate to 0 without an engine; use `eval_arith_in`
/// where one is available.
pub fn eval_arith(state: &mut ShellState, expr: &ArithExpr) -> Result<i64, InterpreterError> {
    eval_arith_in(None, state, expr)
}

pub fn eval_arith_in(
    engine: Option<&ExecutionEngine>,
    state: &mut ShellState,
    expr: &ArithExpr,
) -> Result<i64, InterpreterError> {
    match expr {
        ArithExpr::Number(n) => Ok(*n),
        ArithExpr::Variable(name) => Ok(variable_value(state, name)),
        ArithExpr::Group(inner) => eval_arith_in(engine, state, inner),

        ArithExpr::CommandSubst(script) => match engine {
            Some(engine) => {
                let result = engine.run_command_substitution(state, script);
                Ok(parse_int(result.stdout.trim()))
            }
            None => Ok(0),
        },

        ArithExpr::ArrayElement { array, index } => {
            let idx = eval_arith_in(engine, state, index)?;
            Ok(array_element_value(state, array, idx))
        }

        ArithExpr::Binary { op, left, right } => {
            match op {
                // Logical operators short-circuit
                ArithBinaryOp::LogAnd => {
                    if eval_arith_in(engine, state, left)? == 0 {
                        return Ok(0);
                    }
                    return Ok((eval_arith_in(engine, state, right)? != 0) as i64);
                }
                ArithBinaryOp::LogOr => {
                    if eval_arith_in(engine, state, left)? != 0 {
                        return Ok(1);
                    }
                    return Ok((eval_arith_in(engine, state, right)? != 0) as i64);
                }
                ArithBinaryOp::Comma => {
                    eval_arith_in(engine, state, left)?;
                    return eval_arith_in(engine, state, right);
                }
                _ => {}
            }

            let a = eval_arith_in(engine, state, left)?;
            let b = eval_arith_in(engine, state, right)?;
            apply_binary(*op, a, b)
        }

        ArithExpr::Unary { op, operand, prefix } => match op {
            ArithUnaryOp::Neg => Ok(eval_arith_in(engine, state, operand)?.wrapping_neg()),
            ArithUnaryOp::Pos => eval_arith_in(engine, state, operand),
            ArithUnaryOp::Not => Ok((eval_arith_in(engine, state, operand)? == 0) as i64),
            ArithUnaryOp::BitNot => Ok(!eval_arith_in(engine, state, operand)?),
            ArithUnaryOp::Inc | ArithUnaryOp::Dec => {
                let delta = if *op == ArithUnaryOp::Inc { 1 } else { -1 };
                let (name, subscript) = match operand.as_ref() {
                    ArithExpr::Variable(name) => (name.clone(), None),
                    ArithExpr::ArrayElement { array, index } => {
                        (array.clone(), Some(eval_arith_in(engine, state, index)?))
                    }
                    _ => {
                        return Err(InterpreterError::expansion(
                            "++: operand must be a variable",
                        ));
                    }
                };
                let old = match subscript {
                    Some(idx) => array_element_value(state, &name, idx),
                    None => variable_value(state, &name),
                };
                let new = old.wrapping_add(delta);
                store(state, &name, subscript, new);
                Ok(if *prefix { new } else { old })
            }
        },

        ArithExpr::Ternary { condition, consequent, alternate } => {
            if eval_arith_in(engine, state, condition)? != 0 {
                eval_arith_in(engine, state, consequent)
            } else {
                eval_arith_in(engine, state, alternate)
            }
        }

        ArithExpr::Assignment { op, variable, subscript, value } => {
            let rhs = eval_arith_in(engine, state, value)?;
            let idx = match subscript {
                Some(s) => Some(eval_arith_in(engine, state, s)?),
                None => None,
            };
            let new = if *op == ArithAssignOp::Assign {
                rhs
            } else {
                let old = match idx {
                    Some(i) => array_element_value(state, variable, i),
                    None => variable_value(state, variable),
                };
                let bin_op = match op {
                    ArithAssignOp::Add => ArithBinaryOp::Add,
                    ArithAssignOp::Sub => ArithBinaryOp::Sub,
                    ArithAssignOp::Mul => ArithBinaryOp::Mul,
                    ArithAssignOp::Div => ArithBinaryOp::Div,
                    ArithAssignOp::Mod => ArithBinaryOp::Mod,
                    ArithAssignOp::LShift => ArithBinaryOp::LShift,
                    ArithAssignOp::RShift => ArithBinaryOp::RShift,
                    ArithAssignOp::And => ArithBinaryOp::BitAnd,
                    ArithAssignOp::Or => ArithBinaryOp::BitOr,
                    ArithAssignOp::Xor => ArithBinaryOp::BitXor,
                    ArithAssignOp::Assign => unreachable!(),
                };
                apply_binary(bin_op, old, rhs)?
            };
            store(state, variable, idx, new);
            Ok(new)
        }
    }
}

fn apply_binary(op: ArithBinaryOp, a: i64, b: i64) -> Result<i64, InterpreterError> {
    match op {
        ArithBinaryOp::Add => Ok(a.wrapping_add(b)),
        ArithBinaryOp::Sub => Ok(a.wrapping_sub(b)),
        ArithBinaryOp::Mul => Ok(a.wrapping_mul(b)),
        ArithBinaryOp::Div => {
            if b == 0 {
                return Err(InterpreterError::expansion("division by 0"));
            }
            Ok(a.wrapping_div(b))
        }
        ArithBinaryOp::Mod => {
            if b == 0 {
                return Err(InterpreterError::expansion("division by 0"));
            }
            Ok(a.wrapping_rem(b))
        }
        ArithBinaryOp::Pow => {
            if b < 0 {
                return Err(InterpreterError::expansion("exponent less than 0"));
            }
            let mut result: i64 = 1;
            for _ in 0..b {
                result = result.wrapping_mul(a);
            }
            Ok(result)
        }
        ArithBinaryOp::LShift => Ok(a.wrapping_shl((b & 63) as u32)),
        ArithBinaryOp::RShift => Ok(a.wrapping_shr((b & 63) as u32)),
        ArithBinaryOp::Lt => Ok((a < b) as i64),
        ArithBinaryOp::Le => Ok((a <= b) as i64),
        ArithBinaryOp::Gt => Ok((a > b) as i64),
        ArithBinaryOp::Ge => Ok((a >= b) as i64),
        ArithBinaryOp::Eq => Ok((a == b) as i64),
        ArithBinaryOp::Ne => Ok((a != b) as i64),
        ArithBinaryOp::BitAnd => Ok(a & b),
        ArithBinaryOp::BitOr => Ok(a | b),
        ArithBinaryOp::BitXor => Ok(a ^ b),
        ArithBinaryOp::LogAnd | ArithBinaryOp::LogOr | ArithBinaryOp::Comma => unreachable!(),
    }
}

/// Integer value of a variable; non-numeric strings evaluate to 0.
fn variable_value(state: &ShellState, name: &str) -> i64 {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
        let n: usize = name.parse().unwrap_or(0);
        return state
            .positional
            .get(n.wrapping_sub(1))
            .map(|s| parse_int(s))
            .unwrap_or(0);
    }
    match name {
        "#" => state.positional.len() as i64,
        "?" => state.last_exit_code as i64,
        "$" => state.shell_pid as i64,
        "!" => state.last_background_pid as i64,
        _ => parse_int(&state.get_scalar(name)),
    }
}

fn array_element_value(state: &ShellState, name: &str, index: i64) -> i64 {
    match state.get_var(name) {
        Some(Value::Indexed(items)) => {
            let idx = normalize_index(index, items.len());
            idx.and_then(|i| items.get(i)).map(|s| parse_int(s)).unwrap_or(0)
        }
        Some(Value::Assoc(map)) => {
            map.get(&index.to_string()).map(|s| parse_int(s)).unwrap_or(0)
        }
        Some(Value::Scalar(s)) if index == 0 => parse_int(&s),
        _ => 0,
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    if index >= 0 {
        Some(index as usize)
    } else {
        let adjusted = len as i64 + index;
        if adjusted >= 0 {
            Some(adjusted as usize)
        } else {
            None
        }
    }
}

fn parse_int(s: &str) -> i64 {
    s.trim().parse::<i64>().unwrap_or(0)
}

fn store(state: &mut ShellState, name: &str, index: Option<i64>, value: i64) {
    match index {
        None => state.set_scalar(name, value.to_string()),
        Some(idx) => {
            let mut items = match state.get_var(name) {
                Some(Value::Indexed(items)) => items,
                Some(Value::Scalar(s)) => vec![s],
                _ => Vec::new(),
            };
            let i = normalize_index(idx, items.len()).unwrap_or(0);
            if i >= items.len() {
                items.resize(i + 1, String::new());
            }
            items[i] = value.to_string();
            state.set_var(name, Value::Indexed(items));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::arithmetic_parser::parse_arithmetic;

    fn eval_str(state: &mut ShellState, src: &str) -> Result<i64, InterpreterError> {
        let expr = parse_arithmetic(src).unwrap();
        eval_arith(state, &expr)
    }

    #[test]
    fn test_basic_arithmetic() {
        let mut state = ShellState::default();
        assert_eq!(eval_str(&mut state, "1 + 2 * 3").unwrap(), 7);
        assert_eq!(eval_str(&mut state, "(1 + 2) * 3").unwrap(), 9);
        assert_eq!(eval_str(&mut state, "2 ** 10").unwrap(), 1024);
        assert_eq!(eval_str(&mut state, "7 % 3").unwrap(), 1);
    }

    #[test]
    fn test_truncated_division() {
        let mut state = ShellState::default();
        assert_eq!(eval_str(&mut state, "7 / 2").unwrap(), 3);
        assert_eq!(eval_str(&mut state, "-7 / 2").unwrap(), -3);
        assert_eq!(eval_str(&mut state, "7 / -2").unwrap(), -3);
    }

    #[test]
    fn test_division_by_zero() {
        let mut state = ShellState::default();
        assert!(eval_str(&mut state, "1 / 0").is_err());
        assert!(eval_str(&mut state, "1 % 0").is_err());
    }

    #[test]
    fn test_variables_default_to_zero() {
        let mut state = ShellState::default();
        assert_eq!(eval_str(&mut state, "missing + 1").unwrap(), 1);
        state.set_scalar("x", "41");
        assert_eq!(eval_str(&mut state, "x + 1").unwrap(), 42);
        state.set_scalar("junk", "abc");
        assert_eq!(eval_str(&mut state, "junk").unwrap(), 0);
    }

    #[test]
    fn test_assignment_side_effect() {
        let mut state = ShellState::default();
        assert_eq!(eval_str(&mut state, "x = 5").unwrap(), 5);
        assert_eq!(state.get_scalar("x"), "5");
        assert_eq!(eval_str(&mut state, "x += 3").unwrap(), 8);
        assert_eq!(state.get_scalar("x"), "8");
    }

    #[test]
    fn test_increment_decrement() {
        let mut state = ShellState::default();
        state.set_scalar("i", "5");
        assert_eq!(eval_str(&mut state, "i++").unwrap(), 5);
        assert_eq!(state.get_scalar("i"), "6");
        assert_eq!(eval_str(&mut state, "++i").unwrap(), 7);
        assert_eq!(eval_str(&mut state, "--i").unwrap(), 6);
        assert_eq!(eval_str(&mut state, "i--").unwrap(), 6);
        assert_eq!(state.get_scalar("i"), "5");
    }

    #[test]
    fn test_logical_short_circuit() {
        let mut state = ShellState::default();
        // The right side would divide by zero; && must not evaluate it
        assert_eq!(eval_str(&mut state, "0 && (1 / 0)").unwrap(), 0);
        assert_eq!(eval_str(&mut state, "1 || (1 / 0)").unwrap(), 1);
        assert_eq!(eval_str(&mut state, "2 && 3").unwrap(), 1);
    }

    #[test]
    fn test_ternary() {
        let mut state = ShellState::default();
        state.set_scalar("x", "5");
        assert_eq!(eval_str(&mut state, "x > 3 ? 10 : 20").unwrap(), 10);
        assert_eq!(eval_str(&mut state, "x > 9 ? 10 : 20").unwrap(), 20);
    }

    #[test]
    fn test_comparisons_and_bitwise() {
        let mut state = ShellState::default();
        assert_eq!(eval_str(&mut state, "3 < 5").unwrap(), 1);
        assert_eq!(eval_str(&mut state, "3 >= 5").unwrap(), 0);
        assert_eq!(eval_str(&mut state, "6 & 3").unwrap(), 2);
        assert_eq!(eval_str(&mut state, "6 | 3").unwrap(), 7);
        assert_eq!(eval_str(&mut state, "6 ^ 3").unwrap(), 5);
        assert_eq!(eval_str(&mut state, "1 << 4").unwrap(), 16);
        assert_eq!(eval_str(&mut state, "~0").unwrap(), -1);
    }

    #[test]
    fn test_array_elements() {
        let mut state = ShellState::default();
        state.set_var("a", Value::Indexed(vec!["10".into(), "20".into(), "30".into()]));
        assert_eq!(eval_str(&mut state, "a[1]").unwrap(), 20);
        assert_eq!(eval_str(&mut state, "a[0] + a[2]").unwrap(), 40);
        assert_eq!(eval_str(&mut state, "a[1] = 99").unwrap(), 99);
        assert_eq!(
            state.get_var("a"),
            Some(Value::Indexed(vec!["10".into(), "99".into(), "30".into()]))
        );
    }

    #[test]
    fn test_comma_sequence() {
        let mut state = ShellState::default();
        assert_eq!(eval_str(&mut state, "x = 1, x + 10").unwrap(), 11);
    }

    #[test]
    fn test_negative_exponent_errors() {
        let mut state = ShellState::default();
        assert!(eval_str(&mut state, "2 ** -1").is_err());
    }
}
