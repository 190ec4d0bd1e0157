//! Word parsing.
//!
//! Turns the raw text of a word token into a structured list of
//! `WordPart`s: literals, quotes, escapes, parameter expansions, command
//! and arithmetic substitutions, tilde, brace and glob fragments. The
//! interpreter later evaluates the parts through the expansion pipeline.

use crate::ast::types::{
    BraceItem, BraceRangeValue, CommandSubstitutionPart, ParameterExpansionPart,
    ProcessDirection, ProcessSubstitutionPart, WordNode, WordPart,
};
use crate::parser::expansion_parser::parse_braced_expansion;
use crate::parser::types::{ParseException, MAX_PARSER_DEPTH};

/// Characters that may appear in a tilde-expansion user name.
fn is_tilde_user_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'
}

/// Parse the raw text of a word token into a WordNode.
pub fn parse_word(raw: &str) -> Result<WordNode, ParseException> {
    Ok(WordNode::new(parse_word_parts(raw, 0)?))
}

/// Parse raw word text into parts. `depth` bounds nested expansions.
pub fn parse_word_parts(raw: &str, depth: usize) -> Result<Vec<WordPart>, ParseException> {
    if depth > MAX_PARSER_DEPTH {
        return Err(ParseException::new("expansion nesting too deep", 0, 0));
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut parts: Vec<WordPart> = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    macro_rules! flush {
        () => {
            if !literal.is_empty() {
                parts.push(WordPart::Literal(std::mem::take(&mut literal)));
            }
        };
    }

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                if i + 1 < chars.len() {
                    if chars[i + 1] == '\n' {
                        // Line continuation disappears
                        i += 2;
                    } else {
                        flush!();
                        parts.push(WordPart::Escaped(chars[i + 1].to_string()));
                        i += 2;
                    }
                } else {
                    literal.push('\\');
                    i += 1;
                }
            }
            '\'' => {
                flush!();
                let end = find_close(&chars, i + 1, '\'')?;
                parts.push(WordPart::SingleQuoted(chars[i + 1..end].iter().collect()));
                i = end + 1;
            }
            '"' => {
                flush!();
                let end = find_double_quote_close(&chars, i + 1)?;
                let inner: String = chars[i + 1..end].iter().collect();
                parts.push(WordPart::DoubleQuoted(parse_double_quoted(&inner, depth + 1)?));
                i = end + 1;
            }
            '`' => {
                flush!();
                let end = find_backtick_close(&chars, i + 1)?;
                let inner = unescape_backtick(&chars[i + 1..end]);
                let body = crate::parser::parse(&inner)?;
                parts.push(WordPart::CommandSubstitution(CommandSubstitutionPart {
                    body,
                    legacy: true,
                }));
                i = end + 1;
            }
            '$' => {
                let (part, next) = parse_dollar(&chars, i, depth)?;
                match part {
                    Some(p) => {
                        flush!();
                        parts.push(p);
                    }
                    None => literal.push('$'),
                }
                i = next;
            }
            '~' => {
                let at_word_start = parts.is_empty() && literal.is_empty();
                let after_sep = literal.ends_with('=') || literal.ends_with(':');
                if at_word_start || after_sep {
                    let mut j = i + 1;
                    while j < chars.len() && is_tilde_user_char(chars[j]) {
                        j += 1;
                    }
                    let terminated = j >= chars.len() || chars[j] == '/' || chars[j] == ':';
                    if terminated {
                        flush!();
                        let user: String = chars[i + 1..j].iter().collect();
                        parts.push(WordPart::TildeExpansion(if user.is_empty() {
                            None
                        } else {
                            Some(user)
                        }));
                        i = j;
                        continue;
                    }
                }
                literal.push('~');
                i += 1;
            }
            '{' => {
                if let Some(end) = find_brace_expansion_close(&chars, i) {
                    flush!();
                    let inner: String = chars[i + 1..end].iter().collect();
                    parts.push(WordPart::BraceExpansion(parse_brace_items(&inner, depth + 1)?));
                    i = end + 1;
                } else {
                    literal.push('{');
                    i += 1;
                }
            }
            '*' | '?' => {
                flush!();
                parts.push(WordPart::Glob(c.to_string()));
                i += 1;
            }
            '[' => {
                // A [...] glob class needs a closing bracket
                if let Some(end) = find_bracket_class_close(&chars, i) {
                    flush!();
                    parts.push(WordPart::Glob(chars[i..=end].iter().collect()));
                    i = end + 1;
                } else {
                    literal.push('[');
                    i += 1;
                }
            }
            '<' | '>' if i + 1 < chars.len() && chars[i + 1] == '(' => {
                flush!();
                let end = find_matching(&chars, i + 1, '(', ')')?;
                let inner: String = chars[i + 2..end].iter().collect();
                let body = crate::parser::parse(&inner)?;
                parts.push(WordPart::ProcessSubstitution(ProcessSubstitutionPart {
                    body,
                    direction: if c == '<' {
                        ProcessDirection::Input
                    } else {
                        ProcessDirection::Output
                    },
                }));
                i = end + 1;
            }
            _ => {
                literal.push(c);
                i += 1;
            }
        }
    }

    if !literal.is_empty() {
        parts.push(WordPart::Literal(literal));
    }

    Ok(parts)
}

/// Parse the inside of a double-quoted string. Single quotes, tilde,
/// brace and glob dispatch are inert here; only \ $ ` keep their powers.
pub fn parse_double_quoted(inner: &str, depth: usize) -> Result<Vec<WordPart>, ParseException> {
    if depth > MAX_PARSER_DEPTH {
        return Err(ParseException::new("expansion nesting too deep", 0, 0));
    }

    let chars: Vec<char> = inner.chars().collect();
    let mut parts: Vec<WordPart> = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    macro_rules! flush {
        () => {
            if !literal.is_empty() {
                parts.push(WordPart::Literal(std::mem::take(&mut literal)));
            }
        };
    }

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                if i + 1 < chars.len() {
                    match chars[i + 1] {
                        '$' | '`' | '"' | '\\' => {
                            flush!();
                            parts.push(WordPart::Escaped(chars[i + 1].to_string()));
                            i += 2;
                        }
                        '\n' => i += 2,
                        _ => {
                            // Backslash stays in the value
                            literal.push('\\');
                            i += 1;
                        }
                    }
                } else {
                    literal.push('\\');
                    i += 1;
                }
            }
            '`' => {
                flush!();
                let end = find_backtick_close(&chars, i + 1)?;
                let inner_cmd = unescape_backtick(&chars[i + 1..end]);
                let body = crate::parser::parse(&inner_cmd)?;
                parts.push(WordPart::CommandSubstitution(CommandSubstitutionPart {
                    body,
                    legacy: true,
                }));
                i = end + 1;
            }
            '$' => {
                let (part, next) = parse_dollar(&chars, i, depth)?;
                match part {
                    Some(p) => {
                        flush!();
                        parts.push(p);
                    }
                    None => literal.push('$'),
                }
                i = next;
            }
            _ => {
                literal.push(c);
                i += 1;
            }
        }
    }

    if !literal.is_empty() {
        parts.push(WordPart::Literal(literal));
    }

    Ok(parts)
}

/// Dispatch on a `$` at `chars[i]`. Returns the parsed part (None when
/// the dollar is literal) and the index to resume from.
fn parse_dollar(
    chars: &[char],
    i: usize,
    depth: usize,
) -> Result<(Option<WordPart>, usize), ParseException> {
    if depth > MAX_PARSER_DEPTH {
        return Err(ParseException::new("expansion nesting too deep", 0, 0));
    }

    let next = match chars.get(i + 1) {
        Some(c) => *c,
        None => return Ok((None, i + 1)),
    };

    match next {
        '\'' => {
            // ANSI-C string $'...'
            let end = find_close(chars, i + 2, '\'')?;
            let inner: String = chars[i + 2..end].iter().collect();
            Ok((Some(WordPart::Literal(ansi_c_decode(&inner))), end + 1))
        }
        '"' => {
            // Locale string $"..." behaves like a plain double-quoted string
            let end = find_double_quote_close(chars, i + 2)?;
            let inner: String = chars[i + 2..end].iter().collect();
            Ok((
                Some(WordPart::DoubleQuoted(parse_double_quoted(&inner, depth + 1)?)),
                end + 1,
            ))
        }
        '(' => {
            if chars.get(i + 2) == Some(&'(') {
                // $(( expr )) — balanced so that $((x+(y))) spans fully
                if let Some(end) = find_dparen_close(chars, i + 3) {
                    let inner: String = chars[i + 3..end].iter().collect();
                    let expr = crate::parser::arithmetic_parser::parse_arithmetic(&inner)?;
                    return Ok((Some(WordPart::ArithmeticExpansion(expr)), end + 2));
                }
                // Fall through: $( ( subshell ) ... )
            }
            let end = find_matching(chars, i + 1, '(', ')')?;
            let inner: String = chars[i + 2..end].iter().collect();
            let body = crate::parser::parse(&inner)?;
            Ok((
                Some(WordPart::CommandSubstitution(CommandSubstitutionPart {
                    body,
                    legacy: false,
                })),
                end + 1,
            ))
        }
        '{' => {
            let end = find_matching(chars, i + 1, '{', '}')?;
            let inner: String = chars[i + 2..end].iter().collect();
            let part = parse_braced_expansion(&inner, depth + 1)?;
            Ok((Some(part), end + 1))
        }
        c if c.is_ascii_alphabetic() || c == '_' => {
            let mut j = i + 1;
            while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            let name: String = chars[i + 1..j].iter().collect();
            Ok((
                Some(WordPart::ParameterExpansion(ParameterExpansionPart {
                    parameter: name,
                    operation: None,
                })),
                j,
            ))
        }
        c @ ('@' | '*' | '#' | '?' | '$' | '!' | '-') => Ok((
            Some(WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: c.to_string(),
                operation: None,
            })),
            i + 2,
        )),
        c if c.is_ascii_digit() => Ok((
            Some(WordPart::ParameterExpansion(ParameterExpansionPart {
                parameter: c.to_string(),
                operation: None,
            })),
            i + 2,
        )),
        _ => Ok((None, i + 1)),
    }
}

/// Parse an unquoted here-doc body: parameter, command and arithmetic
/// expansions fire, backslash escapes only \ $ ` and newline, and quote
/// characters are ordinary text.
pub fn parse_heredoc_body(text: &str) -> Result<WordNode, ParseException> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts: Vec<WordPart> = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    macro_rules! flush {
        () => {
            if !literal.is_empty() {
                parts.push(WordPart::Literal(std::mem::take(&mut literal)));
            }
        };
    }

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() && matches!(chars[i + 1], '$' | '`' | '\\') => {
                flush!();
                parts.push(WordPart::Escaped(chars[i + 1].to_string()));
                i += 2;
            }
            '\\' if i + 1 < chars.len() && chars[i + 1] == '\n' => i += 2,
            '`' => {
                flush!();
                let end = find_backtick_close(&chars, i + 1)?;
                let inner = unescape_backtick(&chars[i + 1..end]);
                let body = crate::parser::parse(&inner)?;
                parts.push(WordPart::CommandSubstitution(CommandSubstitutionPart {
                    body,
                    legacy: true,
                }));
                i = end + 1;
            }
            '$' => {
                let (part, next) = parse_dollar(&chars, i, 0)?;
                match part {
                    Some(p) => {
                        flush!();
                        parts.push(p);
                    }
                    None => literal.push('$'),
                }
                i = next;
            }
            _ => {
                literal.push(c);
                i += 1;
            }
        }
    }

    if !literal.is_empty() {
        parts.push(WordPart::Literal(literal));
    }

    Ok(WordNode::new(parts))
}

// =============================================================================
// BRACE EXPANSION
// =============================================================================

/// Find the closing brace of a brace expansion starting at `chars[open]`,
/// requiring a top-level `,` or `..` for the braces to be special.
fn find_brace_expansion_close(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0;
    let mut has_comma_or_range = false;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '\'' => {
                i += 1;
                while i < chars.len() && chars[i] != '\'' {
                    i += 1;
                }
            }
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return if has_comma_or_range { Some(i) } else { None };
                }
            }
            ',' if depth == 1 => has_comma_or_range = true,
            '.' if depth == 1 && chars.get(i + 1) == Some(&'.') => has_comma_or_range = true,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parse the inside of a brace expansion into items: a comma list of
/// words, or a numeric / character range with optional step.
fn parse_brace_items(inner: &str, depth: usize) -> Result<Vec<BraceItem>, ParseException> {
    if let Some(range) = parse_brace_range(inner) {
        return Ok(vec![range]);
    }

    let chars: Vec<char> = inner.chars().collect();
    let mut items = Vec::new();
    let mut current = String::new();
    let mut brace_depth = 0;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                current.push(c);
                current.push(chars[i + 1]);
                i += 2;
                continue;
            }
            '{' => brace_depth += 1,
            '}' => brace_depth -= 1,
            ',' if brace_depth == 0 => {
                items.push(BraceItem::Word(parse_word_item(&current, depth)?));
                current.clear();
                i += 1;
                continue;
            }
            _ => {}
        }
        current.push(c);
        i += 1;
    }
    items.push(BraceItem::Word(parse_word_item(&current, depth)?));

    Ok(items)
}

fn parse_word_item(text: &str, depth: usize) -> Result<WordNode, ParseException> {
    Ok(WordNode::new(parse_word_parts(text, depth + 1)?))
}

/// Recognize {a..z}, {1..10} and {1..10..2} range forms.
fn parse_brace_range(inner: &str) -> Option<BraceItem> {
    let segments: Vec<&str> = inner.split("..").collect();
    if segments.len() != 2 && segments.len() != 3 {
        return None;
    }

    let step = if segments.len() == 3 {
        Some(segments[2].parse::<i64>().ok()?)
    } else {
        None
    };

    let parse_value = |s: &str| -> Option<BraceRangeValue> {
        if let Ok(n) = s.parse::<i64>() {
            return Some(BraceRangeValue::Number(n));
        }
        let mut it = s.chars();
        match (it.next(), it.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Some(BraceRangeValue::Char(c)),
            _ => None,
        }
    };

    let start = parse_value(segments[0])?;
    let end = parse_value(segments[1])?;
    match (start, end) {
        (BraceRangeValue::Number(_), BraceRangeValue::Number(_))
        | (BraceRangeValue::Char(_), BraceRangeValue::Char(_)) => {
            Some(BraceItem::Range { start, end, step })
        }
        _ => None,
    }
}

// =============================================================================
// SCANNING HELPERS
// =============================================================================

fn find_close(chars: &[char], from: usize, close: char) -> Result<usize, ParseException> {
    let mut i = from;
    while i < chars.len() {
        if chars[i] == close {
            return Ok(i);
        }
        i += 1;
    }
    Err(ParseException::new(format!("unterminated `{}'", close), 0, 0))
}

fn find_double_quote_close(chars: &[char], from: usize) -> Result<usize, ParseException> {
    let mut i = from;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '"' => return Ok(i),
            '$' if chars.get(i + 1) == Some(&'(') => {
                // Skip embedded substitutions so a " inside $(...) can't close us
                let end = find_matching(chars, i + 1, '(', ')')?;
                i = end + 1;
            }
            '`' => {
                let end = find_backtick_close(chars, i + 1)?;
                i = end + 1;
            }
            _ => i += 1,
        }
    }
    Err(ParseException::new("unterminated `\"'", 0, 0))
}

fn find_backtick_close(chars: &[char], from: usize) -> Result<usize, ParseException> {
    let mut i = from;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '`' => return Ok(i),
            _ => i += 1,
        }
    }
    Err(ParseException::new("unterminated ``'", 0, 0))
}

/// Find the matching close bracket, starting with `chars[open]` as the
/// opening one. Quotes and escapes are respected.
fn find_matching(chars: &[char], open: usize, oc: char, cc: char) -> Result<usize, ParseException> {
    let mut depth = 0;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '\'' => {
                i += 1;
                while i < chars.len() && chars[i] != '\'' {
                    i += 1;
                }
            }
            '"' => {
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            c if c == oc => depth += 1,
            c if c == cc => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(ParseException::new(format!("unterminated `{}'", oc), 0, 0))
}

/// Find the `))` that closes $(( from `from` (just past the two opens).
/// Returns the index of the first closing paren.
fn find_dparen_close(chars: &[char], from: usize) -> Option<usize> {
    let mut depth = 2usize;
    let mut i = from;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '\'' => {
                i += 1;
                while i < chars.len() && chars[i] != '\'' {
                    i += 1;
                }
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    // i is the second of the two closers
                    return Some(i - 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Find the end of a [...] glob class; `[` must not be immediately
/// followed by a closing bracket (bash keeps `[]` literal).
fn find_bracket_class_close(chars: &[char], open: usize) -> Option<usize> {
    let mut i = open + 1;
    if chars.get(i) == Some(&'!') || chars.get(i) == Some(&'^') {
        i += 1;
    }
    // A ] directly after the (possibly negated) opening is a literal member
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() {
        match chars[i] {
            ']' => return Some(i),
            ' ' | '\t' => return None,
            _ => i += 1,
        }
    }
    None
}

/// Remove the backslash escapes that are active inside backticks.
fn unescape_backtick(chars: &[char]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() && matches!(chars[i + 1], '`' | '$' | '\\') {
            out.push(chars[i + 1]);
            i += 2;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

// =============================================================================
// ANSI-C STRINGS
// =============================================================================

/// Decode the escapes of an ANSI-C $'...' string.
pub fn ansi_c_decode(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let esc = chars[i + 1];
        i += 2;
        match esc {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'e' | 'E' => out.push('\x1b'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '?' => out.push('?'),
            'x' => {
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    match chars.get(i).and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            i += 1;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    out.push_str("\\x");
                } else if let Some(c) = char::from_u32(value) {
                    out.push(c);
                }
            }
            'u' | 'U' => {
                let max_digits = if esc == 'u' { 4 } else { 8 };
                let mut value = 0u32;
                let mut digits = 0;
                while digits < max_digits {
                    match chars.get(i).and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            i += 1;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    out.push('\\');
                    out.push(esc);
                } else if let Some(c) = char::from_u32(value) {
                    out.push(c);
                }
            }
            '0'..='7' => {
                let mut value = esc.to_digit(8).unwrap();
                let mut digits = 1;
                while digits < 3 {
                    match chars.get(i).and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            i += 1;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if let Some(c) = char::from_u32(value) {
                    out.push(c);
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::ArithExpr;

    fn parts(raw: &str) -> Vec<WordPart> {
        parse_word_parts(raw, 0).unwrap()
    }

    #[test]
    fn test_plain_literal() {
        assert_eq!(parts("hello"), vec![WordPart::Literal("hello".to_string())]);
    }

    #[test]
    fn test_single_quoted() {
        assert_eq!(
            parts("'a $b c'"),
            vec![WordPart::SingleQuoted("a $b c".to_string())]
        );
    }

    #[test]
    fn test_double_quoted_with_expansion() {
        let p = parts("\"hi $USER\"");
        match &p[0] {
            WordPart::DoubleQuoted(inner) => {
                assert_eq!(inner[0], WordPart::Literal("hi ".to_string()));
                match &inner[1] {
                    WordPart::ParameterExpansion(pe) => assert_eq!(pe.parameter, "USER"),
                    other => panic!("expected parameter expansion, got {:?}", other),
                }
            }
            other => panic!("expected double quoted, got {:?}", other),
        }
    }

    #[test]
    fn test_escaped_char() {
        assert_eq!(
            parts("a\\ b"),
            vec![
                WordPart::Literal("a".to_string()),
                WordPart::Escaped(" ".to_string()),
                WordPart::Literal("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_escaped_dollar_in_double_quotes() {
        let p = parts("\"\\$x\"");
        match &p[0] {
            WordPart::DoubleQuoted(inner) => {
                assert_eq!(inner[0], WordPart::Escaped("$".to_string()));
                assert_eq!(inner[1], WordPart::Literal("x".to_string()));
            }
            other => panic!("expected double quoted, got {:?}", other),
        }
    }

    #[test]
    fn test_backslash_kept_in_double_quotes() {
        // \d is not a double-quote escape; the backslash stays
        let p = parts("\"a\\db\"");
        match &p[0] {
            WordPart::DoubleQuoted(inner) => {
                assert_eq!(inner[0], WordPart::Literal("a\\db".to_string()));
            }
            other => panic!("expected double quoted, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_parameter() {
        let p = parts("$HOME");
        match &p[0] {
            WordPart::ParameterExpansion(pe) => {
                assert_eq!(pe.parameter, "HOME");
                assert!(pe.operation.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_special_parameters() {
        for (raw, name) in [("$?", "?"), ("$#", "#"), ("$@", "@"), ("$!", "!"), ("$1", "1")] {
            let p = parts(raw);
            match &p[0] {
                WordPart::ParameterExpansion(pe) => assert_eq!(pe.parameter, name),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_multi_digit_positional_takes_one() {
        // $10 is ${1}0
        let p = parts("$10");
        assert_eq!(p.len(), 2);
        match &p[0] {
            WordPart::ParameterExpansion(pe) => assert_eq!(pe.parameter, "1"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(p[1], WordPart::Literal("0".to_string()));
    }

    #[test]
    fn test_lone_dollar_is_literal() {
        assert_eq!(parts("$"), vec![WordPart::Literal("$".to_string())]);
        assert_eq!(parts("a$ b"), vec![WordPart::Literal("a$ b".to_string())]);
    }

    #[test]
    fn test_command_substitution() {
        let p = parts("$(echo hi)");
        match &p[0] {
            WordPart::CommandSubstitution(cs) => {
                assert!(!cs.legacy);
                assert_eq!(cs.body.statements.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_legacy_command_substitution() {
        let p = parts("`echo hi`");
        match &p[0] {
            WordPart::CommandSubstitution(cs) => assert!(cs.legacy),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arithmetic_expansion() {
        let p = parts("$((1+2))");
        assert!(matches!(p[0], WordPart::ArithmeticExpansion(_)));
    }

    #[test]
    fn test_arithmetic_with_inner_parens() {
        let p = parts("$((x+(y)*2))");
        assert_eq!(p.len(), 1);
        assert!(matches!(p[0], WordPart::ArithmeticExpansion(_)));
    }

    #[test]
    fn test_ansi_c_string() {
        assert_eq!(parts("$'a\\tb\\n'"), vec![WordPart::Literal("a\tb\n".to_string())]);
    }

    #[test]
    fn test_ansi_c_decode_escapes() {
        assert_eq!(ansi_c_decode("\\x41\\x42"), "AB");
        assert_eq!(ansi_c_decode("\\101"), "A");
        assert_eq!(ansi_c_decode("\\u00e9"), "é");
        assert_eq!(ansi_c_decode("\\e["), "\x1b[");
        assert_eq!(ansi_c_decode("\\q"), "\\q");
    }

    #[test]
    fn test_tilde_at_word_start() {
        let p = parts("~/docs");
        assert_eq!(p[0], WordPart::TildeExpansion(None));
        assert_eq!(p[1], WordPart::Literal("/docs".to_string()));
    }

    #[test]
    fn test_tilde_with_user() {
        let p = parts("~alice/data");
        assert_eq!(p[0], WordPart::TildeExpansion(Some("alice".to_string())));
    }

    #[test]
    fn test_tilde_after_colon_or_equals() {
        let p = parts("PATH=~/bin");
        assert!(p.iter().any(|part| matches!(part, WordPart::TildeExpansion(None))));
        let p = parts("a:~/b");
        assert!(p.iter().any(|part| matches!(part, WordPart::TildeExpansion(None))));
    }

    #[test]
    fn test_tilde_mid_word_is_literal() {
        assert_eq!(parts("a~b"), vec![WordPart::Literal("a~b".to_string())]);
    }

    #[test]
    fn test_brace_expansion_list() {
        let p = parts("{a,b,c}");
        match &p[0] {
            WordPart::BraceExpansion(items) => assert_eq!(items.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_brace_expansion_range() {
        let p = parts("{1..5}");
        match &p[0] {
            WordPart::BraceExpansion(items) => {
                assert_eq!(
                    items[0],
                    BraceItem::Range {
                        start: BraceRangeValue::Number(1),
                        end: BraceRangeValue::Number(5),
                        step: None,
                    }
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_brace_expansion_range_with_step() {
        let p = parts("{1..10..2}");
        match &p[0] {
            WordPart::BraceExpansion(items) => {
                assert_eq!(
                    items[0],
                    BraceItem::Range {
                        start: BraceRangeValue::Number(1),
                        end: BraceRangeValue::Number(10),
                        step: Some(2),
                    }
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_braces_without_comma_stay_literal() {
        assert_eq!(parts("{abc}"), vec![WordPart::Literal("{abc}".to_string())]);
    }

    #[test]
    fn test_glob_parts() {
        assert_eq!(
            parts("*.txt"),
            vec![WordPart::Glob("*".to_string()), WordPart::Literal(".txt".to_string())]
        );
        let p = parts("[a-z]?");
        assert_eq!(p[0], WordPart::Glob("[a-z]".to_string()));
        assert_eq!(p[1], WordPart::Glob("?".to_string()));
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        assert_eq!(parts("a[b"), vec![WordPart::Literal("a[b".to_string())]);
    }

    #[test]
    fn test_process_substitution() {
        let p = parts("<(echo hi)");
        match &p[0] {
            WordPart::ProcessSubstitution(ps) => {
                assert_eq!(ps.direction, ProcessDirection::Input);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parameter_braces_default() {
        let p = parts("${X:-fallback}");
        match &p[0] {
            WordPart::ParameterExpansion(pe) => {
                assert_eq!(pe.parameter, "X");
                assert!(pe.operation.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nested_expansion_inside_double_quotes() {
        let p = parts("\"$(echo \"inner\")\"");
        match &p[0] {
            WordPart::DoubleQuoted(inner) => {
                assert!(matches!(inner[0], WordPart::CommandSubstitution(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arithmetic_expansion_value() {
        let p = parts("$((2**3))");
        match &p[0] {
            WordPart::ArithmeticExpansion(expr) => {
                assert!(matches!(expr, ArithExpr::Binary { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
