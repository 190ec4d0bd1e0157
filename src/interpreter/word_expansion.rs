//! Word expansion.
//!
//! The ordered expansion pipeline: brace expansion, tilde expansion,
//! parameter / command / arithmetic expansion, IFS word splitting,
//! pathname expansion, quote removal. Fields carry a parallel "pattern"
//! text in which quoted characters are escaped, so the glob phase knows
//! which metacharacters are live.

use crate::ast::types::{BraceItem, WordNode, WordPart};
use crate::interpreter::arithmetic::eval_arith_in;
use crate::interpreter::engine::ExecutionEngine;
use crate::interpreter::errors::InterpreterError;
use crate::interpreter::expansion::brace::expand_braces;
use crate::interpreter::expansion::parameter::ParamValue;
use crate::interpreter::expansion::tilde::expand_tilde;
use crate::interpreter::expansion::word_split::split_on_ifs;
use crate::interpreter::types::ShellState;

/// One output field being accumulated.
#[derive(Debug, Clone, Default)]
struct Field {
    value: String,
    /// Pattern text with quoted characters backslash-escaped
    pattern: String,
    /// Whether any quoted (or otherwise field-forcing) content landed here
    touched: bool,
    quoted: bool,
}

#[derive(Debug, Default)]
struct FieldAccumulator {
    done: Vec<Field>,
    current: Field,
}

impl FieldAccumulator {
    fn append_quoted(&mut self, text: &str) {
        self.current.value.push_str(text);
        self.current.pattern.push_str(&escape_pattern(text));
        self.current.touched = true;
        self.current.quoted = true;
    }

    fn append_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.current.value.push_str(text);
        self.current.pattern.push_str(&escape_pattern(text));
        self.current.touched = true;
    }

    /// Raw glob text: metacharacters stay live in the pattern.
    fn append_glob(&mut self, text: &str) {
        self.current.value.push_str(text);
        self.current.pattern.push_str(text);
        self.current.touched = true;
    }

    /// Close the current field (if it has anything) and start fresh.
    fn break_field(&mut self) {
        if self.current.touched {
            self.done.push(std::mem::take(&mut self.current));
        }
    }

    /// Unquoted expansion result: IFS-split into fields.
    fn append_split(&mut self, value: &str, ifs: &str) {
        if value.is_empty() {
            return;
        }
        let first = value.chars().next().unwrap();
        let last = value.chars().last().unwrap();
        if ifs.contains(first) {
            self.break_field();
        }
        let pieces = split_on_ifs(value, ifs);
        for (i, piece) in pieces.iter().enumerate() {
            if i > 0 {
                self.break_field();
                // Explicit delimiters force even empty fields
                self.current.touched = true;
            }
            self.current.value.push_str(piece);
            self.current.pattern.push_str(piece);
            if !piece.is_empty() {
                self.current.touched = true;
            }
        }
        if ifs.contains(last) {
            self.break_field();
        }
    }

    fn finish(mut self) -> Vec<Field> {
        self.break_field();
        self.done
    }
}

/// Escape glob metacharacters so quoted text matches literally.
fn escape_pattern(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Whether a pattern string contains a live (unescaped) glob character.
fn has_live_glob(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '*' | '?' | '[' => return true,
            _ => i += 1,
        }
    }
    false
}

/// Word expander: evaluates parts against the state, accumulating any
/// stderr and exit codes produced by command substitutions.
pub struct Expander<'e, 'a> {
    pub engine: &'e ExecutionEngine<'a>,
    /// stderr produced by command substitutions during expansion
    pub stderr: String,
    /// Exit code of the last command substitution, if any ran
    pub last_subst_exit: Option<i32>,
}

impl<'e, 'a> Expander<'e, 'a> {
    pub fn new(engine: &'e ExecutionEngine<'a>) -> Self {
        Self { engine, stderr: String::new(), last_subst_exit: None }
    }

    /// Full expansion of a word list into argv entries: brace, tilde,
    /// parameter/command/arithmetic, splitting, pathname, quote removal.
    pub fn expand_words(
        &mut self,
        state: &mut ShellState,
        words: &[WordNode],
    ) -> Result<Vec<String>, InterpreterError> {
        let mut argv = Vec::new();
        for word in words {
            for candidate in expand_braces(word) {
                let fields = self.expand_to_fields(state, &candidate)?;
                for field in fields {
                    if !field.touched {
                        continue;
                    }
                    if has_live_glob(&field.pattern) {
                        let matches = crate::glob::expand_pathnames(
                            self.engine.fs,
                            &state.cwd,
                            &field.pattern,
                        );
                        if matches.is_empty() {
                            argv.push(field.value);
                        } else {
                            argv.extend(matches);
                        }
                    } else {
                        argv.push(field.value);
                    }
                }
            }
        }
        Ok(argv)
    }

    /// Expand a single word to one string: no brace multiplication, no
    /// splitting, no pathname expansion (redirection targets, case
    /// words, conditional operands, assignment values).
    pub fn expand_word_single(
        &mut self,
        state: &mut ShellState,
        word: &WordNode,
    ) -> Result<String, InterpreterError> {
        let mut out = String::new();
        for part in &word.parts {
            out.push_str(&self.part_to_text(state, part, false)?);
        }
        Ok(out)
    }

    /// Expand a word into pattern text: quoted characters escaped so the
    /// pattern engine treats them literally.
    pub fn expand_word_pattern(
        &mut self,
        state: &mut ShellState,
        word: &WordNode,
    ) -> Result<String, InterpreterError> {
        let mut out = String::new();
        for part in &word.parts {
            match part {
                WordPart::Literal(s) => out.push_str(s),
                WordPart::Glob(s) => out.push_str(s),
                WordPart::SingleQuoted(s) => out.push_str(&escape_pattern(s)),
                WordPart::Escaped(s) => out.push_str(&escape_pattern(s)),
                WordPart::DoubleQuoted(inner) => {
                    for p in inner {
                        let text = self.part_to_text(state, p, true)?;
                        out.push_str(&escape_pattern(&text));
                    }
                }
                other => out.push_str(&self.part_to_text(state, other, false)?),
            }
        }
        Ok(out)
    }

    /// Evaluate one part to plain text (joins multi-value expansions).
    fn part_to_text(
        &mut self,
        state: &mut ShellState,
        part: &WordPart,
        in_quotes: bool,
    ) -> Result<String, InterpreterError> {
        match part {
            WordPart::Literal(s) | WordPart::SingleQuoted(s) | WordPart::Escaped(s) => {
                Ok(s.clone())
            }
            WordPart::Glob(s) => Ok(s.clone()),
            WordPart::DoubleQuoted(inner) => {
                let mut out = String::new();
                for p in inner {
                    out.push_str(&self.part_to_text(state, p, true)?);
                }
                Ok(out)
            }
            WordPart::TildeExpansion(user) => {
                if in_quotes {
                    Ok(match user {
                        Some(u) => format!("~{}", u),
                        None => "~".to_string(),
                    })
                } else {
                    Ok(expand_tilde(state, user.as_deref()))
                }
            }
            WordPart::ParameterExpansion(pe) => {
                let value = self.expand_parameter(state, pe, in_quotes)?;
                Ok(match value {
                    ParamValue::Single(s) => s,
                    ParamValue::AtList(items) => items.join(" "),
                    ParamValue::StarList(items) => items.join(&star_separator(state)),
                })
            }
            WordPart::CommandSubstitution(cs) => Ok(self.run_substitution(state, &cs.body)),
            WordPart::ArithmeticExpansion(expr) => {
                Ok(eval_arith_in(Some(self.engine), state, expr)?.to_string())
            }
            WordPart::ProcessSubstitution(_) => Ok("/dev/null".to_string()),
            WordPart::BraceExpansion(items) => {
                // Single-string contexts (assignments, redirection
                // targets) do not brace-expand; render the braces back
                let mut rendered: Vec<String> = Vec::new();
                for item in items {
                    match item {
                        BraceItem::Word(word) => {
                            let mut text = String::new();
                            for p in &word.parts {
                                text.push_str(&self.part_to_text(state, p, in_quotes)?);
                            }
                            rendered.push(text);
                        }
                        BraceItem::Range { start, end, step } => {
                            rendered.push(match step {
                                Some(step) => format!("{}..{}..{}", start, end, step),
                                None => format!("{}..{}", start, end),
                            });
                        }
                    }
                }
                Ok(format!("{{{}}}", rendered.join(",")))
            }
        }
    }

    /// Evaluate a word's parts into split fields.
    fn expand_to_fields(
        &mut self,
        state: &mut ShellState,
        word: &WordNode,
    ) -> Result<Vec<Field>, InterpreterError> {
        let ifs = state.ifs();
        let mut acc = FieldAccumulator::default();
        self.accumulate_parts(state, &word.parts, false, &ifs, &mut acc)?;
        Ok(acc.finish())
    }

    fn accumulate_parts(
        &mut self,
        state: &mut ShellState,
        parts: &[WordPart],
        in_quotes: bool,
        ifs: &str,
        acc: &mut FieldAccumulator,
    ) -> Result<(), InterpreterError> {
        for part in parts {
            match part {
                WordPart::Literal(s) => {
                    if in_quotes {
                        acc.append_quoted(s);
                    } else {
                        acc.append_literal(s);
                    }
                }
                WordPart::SingleQuoted(s) => acc.append_quoted(s),
                WordPart::Escaped(s) => acc.append_quoted(s),
                WordPart::Glob(s) => acc.append_glob(s),
                WordPart::DoubleQuoted(inner) => {
                    // "$@" alone vanishes when there are no positionals
                    if inner.len() == 1 {
                        if let WordPart::ParameterExpansion(pe) = &inner[0] {
                            let value = self.expand_parameter(state, pe, true)?;
                            if matches!(&value, ParamValue::AtList(items) if items.is_empty()) {
                                continue;
                            }
                            acc.current.touched = true;
                            acc.current.quoted = true;
                            self.accumulate_param_value(state, value, true, ifs, acc);
                            continue;
                        }
                    }
                    // An empty "" still creates a field
                    acc.current.touched = true;
                    acc.current.quoted = true;
                    self.accumulate_parts(state, inner, true, ifs, acc)?;
                }
                WordPart::TildeExpansion(user) => {
                    if in_quotes {
                        let text = match user {
                            Some(u) => format!("~{}", u),
                            None => "~".to_string(),
                        };
                        acc.append_quoted(&text);
                    } else {
                        let home = expand_tilde(state, user.as_deref());
                        acc.append_literal(&home);
                    }
                }
                WordPart::ParameterExpansion(pe) => {
                    let value = self.expand_parameter(state, pe, in_quotes)?;
                    self.accumulate_param_value(state, value, in_quotes, ifs, acc);
                }
                WordPart::CommandSubstitution(cs) => {
                    let output = self.run_substitution(state, &cs.body);
                    if in_quotes {
                        acc.append_quoted(&output);
                    } else {
                        acc.append_split(&output, ifs);
                    }
                }
                WordPart::ArithmeticExpansion(expr) => {
                    let value = eval_arith_in(Some(self.engine), state, expr)?.to_string();
                    if in_quotes {
                        acc.append_quoted(&value);
                    } else {
                        acc.append_split(&value, ifs);
                    }
                }
                WordPart::ProcessSubstitution(_) => acc.append_literal("/dev/null"),
                WordPart::BraceExpansion(_) => {
                    // Brace parts were multiplied away before this phase
                }
            }
        }
        Ok(())
    }

    fn accumulate_param_value(
        &mut self,
        state: &ShellState,
        value: ParamValue,
        in_quotes: bool,
        ifs: &str,
        acc: &mut FieldAccumulator,
    ) {
        match value {
            ParamValue::Single(s) => {
                if in_quotes {
                    acc.append_quoted(&s);
                } else {
                    acc.append_split(&s, ifs);
                }
            }
            ParamValue::AtList(items) => {
                if in_quotes {
                    // "$@": one field per element, adjacent text attaches
                    // to the first and last elements
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            acc.break_field();
                        }
                        acc.append_quoted(item);
                    }
                } else {
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            acc.break_field();
                        }
                        acc.append_split(item, ifs);
                    }
                }
            }
            ParamValue::StarList(items) => {
                if in_quotes {
                    // "$*": joined with the first IFS character
                    acc.append_quoted(&items.join(&star_separator(state)));
                } else {
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            acc.break_field();
                        }
                        acc.append_split(item, ifs);
                    }
                }
            }
        }
    }

    /// Run a command substitution: subshell semantics, trailing newlines
    /// trimmed, stderr routed to the expansion side channel.
    pub fn run_substitution(&mut self, state: &mut ShellState, body: &crate::ast::types::ScriptNode) -> String {
        let result = self.engine.run_command_substitution(state, body);
        self.stderr.push_str(&result.stderr);
        self.last_subst_exit = Some(result.exit_code);
        state.last_exit_code = result.exit_code;
        result.stdout.trim_end_matches('\n').to_string()
    }
}

/// First character of IFS, used to join "$*".
fn star_separator(state: &ShellState) -> String {
    let ifs = state.ifs();
    match ifs.chars().next() {
        Some(c) => c.to_string(),
        None => String::new(),
    }
}
