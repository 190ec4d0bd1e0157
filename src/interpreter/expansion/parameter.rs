//! Parameter expansion evaluation.
//!
//! Resolves `$name`, the special parameters, array subscripts, and the
//! `${...}` operator suite against the sandbox state. Multi-valued
//! expansions ($@, $*, ${a[@]}, ${a[*]}) are surfaced as lists so the
//! caller can apply the quoting-dependent field rules.

use rand::Rng;

use crate::ast::types::{ParameterExpansionPart, ParameterOperation, PatternSide};
use crate::interpreter::arithmetic::eval_arith_in;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::expansion::pattern::{
    case_modify, remove_prefix, remove_suffix, replace_pattern,
};
use crate::interpreter::types::{ShellState, Value};
use crate::interpreter::word_expansion::Expander;

/// The value of a parameter expansion.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Single(String),
    /// $@-style: one entry per element
    AtList(Vec<String>),
    /// $*-style: joined with the first IFS char when quoted
    StarList(Vec<String>),
}

impl ParamValue {
    fn map(self, f: impl Fn(&str) -> String) -> ParamValue {
        match self {
            ParamValue::Single(s) => ParamValue::Single(f(&s)),
            ParamValue::AtList(v) => ParamValue::AtList(v.iter().map(|s| f(s)).collect()),
            ParamValue::StarList(v) => ParamValue::StarList(v.iter().map(|s| f(s)).collect()),
        }
    }
}

/// Raw lookup result before operators apply.
enum Base {
    Unset,
    Scalar(String),
    At(Vec<String>),
    Star(Vec<String>),
}

impl Base {
    fn is_unset(&self) -> bool {
        matches!(self, Base::Unset)
    }

    fn is_empty(&self) -> bool {
        match self {
            Base::Unset => true,
            Base::Scalar(s) => s.is_empty(),
            Base::At(v) | Base::Star(v) => v.is_empty(),
        }
    }

    fn into_value(self) -> ParamValue {
        match self {
            Base::Unset => ParamValue::Single(String::new()),
            Base::Scalar(s) => ParamValue::Single(s),
            Base::At(v) => ParamValue::AtList(v),
            Base::Star(v) => ParamValue::StarList(v),
        }
    }
}

impl<'e, 'a> Expander<'e, 'a> {
    pub fn expand_parameter(
        &mut self,
        state: &mut ShellState,
        part: &ParameterExpansionPart,
        _in_quotes: bool,
    ) -> Result<ParamValue, InterpreterError> {
        let (name, subscript) = split_subscript(&part.parameter);
        let base = self.resolve_base(state, &name, subscript.as_deref())?;

        let operation = match &part.operation {
            None => {
                self.check_nounset(state, &name, &base)?;
                return Ok(base.into_value());
            }
            Some(op) => op,
        };

        match operation {
            ParameterOperation::DefaultValue { word, check_empty } => {
                let use_default =
                    if *check_empty { base.is_empty() } else { base.is_unset() };
                if use_default {
                    Ok(ParamValue::Single(self.expand_word_single(state, word)?))
                } else {
                    Ok(base.into_value())
                }
            }

            ParameterOperation::AssignDefault { word, check_empty } => {
                let use_default =
                    if *check_empty { base.is_empty() } else { base.is_unset() };
                if use_default {
                    let value = self.expand_word_single(state, word)?;
                    if is_assignable_name(&name) {
                        state.set_scalar(&name, value.clone());
                    }
                    Ok(ParamValue::Single(value))
                } else {
                    Ok(base.into_value())
                }
            }

            ParameterOperation::ErrorIfUnset { word, check_empty } => {
                let failed = if *check_empty { base.is_empty() } else { base.is_unset() };
                if failed {
                    let message = match word {
                        Some(w) => self.expand_word_single(state, w)?,
                        None => "parameter null or not set".to_string(),
                    };
                    return Err(InterpreterError::expansion_fatal(format!("{}: {}", name, message)));
                }
                Ok(base.into_value())
            }

            ParameterOperation::UseAlternative { word, check_empty } => {
                let is_set = if *check_empty { !base.is_empty() } else { !base.is_unset() };
                if is_set {
                    Ok(ParamValue::Single(self.expand_word_single(state, word)?))
                } else {
                    Ok(ParamValue::Single(String::new()))
                }
            }

            ParameterOperation::Length => {
                self.check_nounset(state, &name, &base)?;
                let length = match base {
                    Base::Unset => 0,
                    Base::Scalar(s) => s.chars().count(),
                    Base::At(v) | Base::Star(v) => v.len(),
                };
                Ok(ParamValue::Single(length.to_string()))
            }

            ParameterOperation::Indirection => {
                let target = match base {
                    Base::Scalar(s) => s,
                    _ => String::new(),
                };
                if target.is_empty() {
                    if state.options.nounset {
                        return Err(InterpreterError::expansion_fatal(format!(
                            "{}: unbound variable",
                            name
                        )));
                    }
                    return Ok(ParamValue::Single(String::new()));
                }
                let (tname, tsub) = split_subscript(&target);
                let tbase = self.resolve_base(state, &tname, tsub.as_deref())?;
                self.check_nounset(state, &tname, &tbase)?;
                Ok(tbase.into_value())
            }

            ParameterOperation::Substring { offset, length } => {
                self.check_nounset(state, &name, &base)?;
                let off = eval_arith_in(Some(self.engine), state, offset)?;
                let len = match length {
                    Some(expr) => Some(eval_arith_in(Some(self.engine), state, expr)?),
                    None => None,
                };
                Ok(apply_substring(base, off, len))
            }

            ParameterOperation::PatternRemoval { pattern, side, greedy } => {
                self.check_nounset(state, &name, &base)?;
                let pat = self.expand_word_pattern(state, pattern)?;
                let greedy = *greedy;
                Ok(match side {
                    PatternSide::Prefix => {
                        base.into_value().map(|s| remove_prefix(s, &pat, greedy))
                    }
                    PatternSide::Suffix => {
                        base.into_value().map(|s| remove_suffix(s, &pat, greedy))
                    }
                })
            }

            ParameterOperation::PatternReplacement { pattern, replacement, all, anchor } => {
                self.check_nounset(state, &name, &base)?;
                let pat = self.expand_word_pattern(state, pattern)?;
                let repl = match replacement {
                    Some(w) => self.expand_word_single(state, w)?,
                    None => String::new(),
                };
                let (all, anchor) = (*all, *anchor);
                Ok(base.into_value().map(|s| replace_pattern(s, &pat, &repl, all, anchor)))
            }

            ParameterOperation::CaseModification { direction, all, pattern } => {
                self.check_nounset(state, &name, &base)?;
                let pat = match pattern {
                    Some(w) => Some(self.expand_word_pattern(state, w)?),
                    None => None,
                };
                let (direction, all) = (*direction, *all);
                Ok(base
                    .into_value()
                    .map(|s| case_modify(s, direction, all, pat.as_deref())))
            }
        }
    }

    fn check_nounset(
        &self,
        state: &ShellState,
        name: &str,
        base: &Base,
    ) -> Result<(), InterpreterError> {
        if state.options.nounset && base.is_unset() && !is_special_name(name) {
            return Err(InterpreterError::expansion_fatal(format!("{}: unbound variable", name)));
        }
        Ok(())
    }

    /// Resolve a parameter name (plus optional subscript) to its base value.
    fn resolve_base(
        &mut self,
        state: &mut ShellState,
        name: &str,
        subscript: Option<&str>,
    ) -> Result<Base, InterpreterError> {
        // Special parameters
        if subscript.is_none() {
            match name {
                "@" => return Ok(Base::At(state.positional.clone())),
                "*" => return Ok(Base::Star(state.positional.clone())),
                "#" => return Ok(Base::Scalar(state.positional.len().to_string())),
                "?" => return Ok(Base::Scalar(state.last_exit_code.to_string())),
                "$" => return Ok(Base::Scalar(state.shell_pid.to_string())),
                "!" => {
                    if state.last_background_pid == 0 {
                        return Ok(Base::Unset);
                    }
                    return Ok(Base::Scalar(state.last_background_pid.to_string()));
                }
                "-" => return Ok(Base::Scalar(option_flags(state))),
                "0" => return Ok(Base::Scalar(state.script_name.clone())),
                _ => {}
            }

            if name.chars().all(|c| c.is_ascii_digit()) {
                let n: usize = name.parse().unwrap_or(0);
                return Ok(match state.positional.get(n.wrapping_sub(1)) {
                    Some(v) => Base::Scalar(v.clone()),
                    None => Base::Unset,
                });
            }

            if name == "RANDOM" && !state.is_set("RANDOM") {
                let n: u16 = rand::thread_rng().gen_range(0..32768);
                return Ok(Base::Scalar(n.to_string()));
            }

            if name == "PIPESTATUS" {
                return Ok(Base::Scalar(
                    state
                        .pipestatus
                        .first()
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| state.last_exit_code.to_string()),
                ));
            }

            return Ok(match state.get_var(name) {
                Some(value) => Base::Scalar(value.as_scalar()),
                None => Base::Unset,
            });
        }

        let sub = subscript.unwrap();

        // PIPESTATUS behaves as an indexed array
        if name == "PIPESTATUS" {
            let items: Vec<String> =
                state.pipestatus.iter().map(|c| c.to_string()).collect();
            return self.index_list(state, items, sub);
        }

        match state.get_var(name) {
            Some(Value::Indexed(items)) => self.index_list(state, items, sub),
            Some(Value::Assoc(map)) => match sub {
                "@" => Ok(Base::At(map.values().cloned().collect())),
                "*" => Ok(Base::Star(map.values().cloned().collect())),
                key => {
                    let key = self.subscript_key(state, key)?;
                    Ok(match map.get(&key) {
                        Some(v) => Base::Scalar(v.clone()),
                        None => Base::Unset,
                    })
                }
            },
            Some(Value::Scalar(s)) => match sub {
                "@" | "*" => Ok(Base::At(vec![s])),
                _ => {
                    let expr = crate::parser::arithmetic_parser::parse_arithmetic(sub)
                        .map_err(|e| InterpreterError::expansion(e.message))?;
                    let idx = eval_arith_in(Some(self.engine), state, &expr)?;
                    if idx == 0 {
                        Ok(Base::Scalar(s))
                    } else {
                        Ok(Base::Unset)
                    }
                }
            },
            None => Ok(Base::Unset),
        }
    }

    fn index_list(
        &mut self,
        state: &mut ShellState,
        items: Vec<String>,
        sub: &str,
    ) -> Result<Base, InterpreterError> {
        match sub {
            "@" => Ok(Base::At(items)),
            "*" => Ok(Base::Star(items)),
            _ => {
                let expr = crate::parser::arithmetic_parser::parse_arithmetic(sub)
                    .map_err(|e| InterpreterError::expansion(e.message))?;
                let idx = eval_arith_in(Some(self.engine), state, &expr)?;
                let adjusted = if idx < 0 { items.len() as i64 + idx } else { idx };
                if adjusted < 0 {
                    return Err(InterpreterError::expansion(format!(
                        "{}: bad array subscript",
                        sub
                    )));
                }
                Ok(match items.get(adjusted as usize) {
                    Some(v) => Base::Scalar(v.clone()),
                    None => Base::Unset,
                })
            }
        }
    }

    /// An associative-array key may itself be a $variable reference.
    fn subscript_key(
        &mut self,
        state: &mut ShellState,
        key: &str,
    ) -> Result<String, InterpreterError> {
        if let Some(stripped) = key.strip_prefix('$') {
            return Ok(state.get_scalar(stripped.trim_start_matches('{').trim_end_matches('}')));
        }
        Ok(key.trim_matches(|c| c == '"' || c == '\'').to_string())
    }
}

/// Split "name[sub]" into (name, Some(sub)).
fn split_subscript(parameter: &str) -> (String, Option<String>) {
    match parameter.find('[') {
        Some(open) if parameter.ends_with(']') => {
            let name = parameter[..open].to_string();
            let sub = parameter[open + 1..parameter.len() - 1].to_string();
            (name, Some(sub))
        }
        _ => (parameter.to_string(), None),
    }
}

fn is_special_name(name: &str) -> bool {
    matches!(name, "@" | "*" | "#" | "?" | "$" | "!" | "-" | "0")
}

fn is_assignable_name(name: &str) -> bool {
    crate::parser::lexer::is_valid_name(name)
}

/// The $- option string.
fn option_flags(state: &ShellState) -> String {
    let mut flags = String::from("h");
    if state.options.errexit {
        flags.push('e');
    }
    if state.options.nounset {
        flags.push('u');
    }
    if state.options.xtrace {
        flags.push('x');
    }
    flags.push('B');
    flags
}

/// ${var:offset:length} on scalars (chars) and lists (elements).
fn apply_substring(base: Base, offset: i64, length: Option<i64>) -> ParamValue {
    match base {
        Base::Unset => ParamValue::Single(String::new()),
        Base::Scalar(s) => {
            let chars: Vec<char> = s.chars().collect();
            let len = chars.len() as i64;
            let start = if offset < 0 { (len + offset).max(0) } else { offset.min(len) };
            let end = match length {
                None => len,
                Some(l) if l < 0 => (len + l).max(start),
                Some(l) => (start + l).min(len),
            };
            ParamValue::Single(chars[start as usize..end.max(start) as usize].iter().collect())
        }
        Base::At(items) | Base::Star(items) => {
            let len = items.len() as i64;
            let start = if offset < 0 { (len + offset).max(0) } else { offset.min(len) };
            let end = match length {
                None => len,
                Some(l) if l < 0 => (len + l).max(start),
                Some(l) => (start + l).min(len),
            };
            ParamValue::AtList(items[start as usize..end.max(start) as usize].to_vec())
        }
    }
}

// ============================================================================
// Tests (exercised through the engine in engine.rs and shell.rs; the
// pure helpers are tested here)
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_subscript() {
        assert_eq!(split_subscript("plain"), ("plain".to_string(), None));
        assert_eq!(
            split_subscript("arr[2]"),
            ("arr".to_string(), Some("2".to_string()))
        );
        assert_eq!(
            split_subscript("arr[@]"),
            ("arr".to_string(), Some("@".to_string()))
        );
    }

    #[test]
    fn test_apply_substring_scalar() {
        let v = apply_substring(Base::Scalar("hello".into()), 1, Some(3));
        assert_eq!(v, ParamValue::Single("ell".to_string()));

        let v = apply_substring(Base::Scalar("hello".into()), -3, None);
        assert_eq!(v, ParamValue::Single("llo".to_string()));

        let v = apply_substring(Base::Scalar("hello".into()), 0, Some(-1));
        assert_eq!(v, ParamValue::Single("hell".to_string()));

        let v = apply_substring(Base::Scalar("hi".into()), 10, None);
        assert_eq!(v, ParamValue::Single(String::new()));
    }

    #[test]
    fn test_apply_substring_list() {
        let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let v = apply_substring(Base::At(items.clone()), 1, None);
        assert_eq!(v, ParamValue::AtList(vec!["b".to_string(), "c".to_string()]));

        let v = apply_substring(Base::At(items), 0, Some(2));
        assert_eq!(v, ParamValue::AtList(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_param_value_map() {
        let v = ParamValue::AtList(vec!["ab".to_string(), "cb".to_string()]);
        let mapped = v.map(|s| s.replace('b', "x"));
        assert_eq!(mapped, ParamValue::AtList(vec!["ax".to_string(), "cx".to_string()]));
    }
}
