//! Braced parameter expansion parsing.
//!
//! Parses the inside of `${...}` into a `ParameterExpansionPart` with its
//! operation: defaults, assignment, error-if-unset, alternative, length,
//! indirection, substring, pattern removal/replacement, case modification.

use crate::ast::types::{
    CaseDirection, ParameterExpansionPart, ParameterOperation, PatternAnchor, PatternSide,
    WordNode, WordPart,
};
use crate::parser::arithmetic_parser::parse_arithmetic;
use crate::parser::types::ParseException;
use crate::parser::word_parser::parse_word_parts;

/// Parse the text between `${` and `}` into a parameter expansion part.
pub fn parse_braced_expansion(inner: &str, depth: usize) -> Result<WordPart, ParseException> {
    if inner.is_empty() {
        return Err(ParseException::new("bad substitution: ${}", 0, 0));
    }

    let chars: Vec<char> = inner.chars().collect();

    // ${#param} — length. ${#} alone is the positional count.
    if chars[0] == '#' && chars.len() > 1 {
        let (parameter, end) = scan_parameter(&chars, 1)?;
        if end == chars.len() {
            return Ok(expansion(parameter, Some(ParameterOperation::Length)));
        }
        return Err(ParseException::new(format!("bad substitution: ${{{}}}", inner), 0, 0));
    }

    // ${!param} — indirection. ${!} alone is the last background pid.
    if chars[0] == '!' && chars.len() > 1 {
        let (parameter, end) = scan_parameter(&chars, 1)?;
        if end == chars.len() {
            return Ok(expansion(parameter, Some(ParameterOperation::Indirection)));
        }
        // Indirection combined with an inner operation: apply the op to
        // the dereferenced parameter at expansion time is out of scope,
        // treat as bad substitution like the reference does for exotica.
        return Err(ParseException::new(format!("bad substitution: ${{{}}}", inner), 0, 0));
    }

    let (parameter, end) = scan_parameter(&chars, 0)?;
    if end == chars.len() {
        return Ok(expansion(parameter, None));
    }

    let rest: String = chars[end..].iter().collect();
    let operation = parse_operation(&rest, depth)?;
    Ok(expansion(parameter, Some(operation)))
}

fn expansion(parameter: String, operation: Option<ParameterOperation>) -> WordPart {
    WordPart::ParameterExpansion(ParameterExpansionPart { parameter, operation })
}

/// Scan a parameter: a name (with optional [subscript]), digits, or a
/// special character. Returns the parameter text and the end index.
fn scan_parameter(chars: &[char], start: usize) -> Result<(String, usize), ParseException> {
    let mut i = start;
    let c = match chars.get(i) {
        Some(c) => *c,
        None => return Err(ParseException::new("bad substitution", 0, 0)),
    };

    if c.is_ascii_alphabetic() || c == '_' {
        while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
            i += 1;
        }
    } else if c.is_ascii_digit() {
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    } else if matches!(c, '@' | '*' | '#' | '?' | '$' | '!' | '-') {
        i += 1;
    } else {
        return Err(ParseException::new(
            format!("bad substitution: `{}'", chars.iter().collect::<String>()),
            0,
            0,
        ));
    }

    let mut parameter: String = chars[start..i].iter().collect();

    // Optional array subscript becomes part of the parameter
    if chars.get(i) == Some(&'[') {
        let mut depth = 0;
        let sub_start = i;
        while i < chars.len() {
            match chars[i] {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        i += 1;
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        if depth != 0 {
            return Err(ParseException::new("bad substitution: missing `]'", 0, 0));
        }
        let subscript: String = chars[sub_start..i].iter().collect();
        parameter.push_str(&subscript);
    }

    Ok((parameter, i))
}

/// Parse the operator suffix that follows the parameter.
fn parse_operation(rest: &str, depth: usize) -> Result<ParameterOperation, ParseException> {
    let chars: Vec<char> = rest.chars().collect();

    let word = |text: &str| -> Result<WordNode, ParseException> {
        Ok(WordNode::new(parse_word_parts(text, depth + 1)?))
    };

    match chars[0] {
        ':' => match chars.get(1) {
            Some('-') => Ok(ParameterOperation::DefaultValue {
                word: word(&rest[2..])?,
                check_empty: true,
            }),
            Some('=') => Ok(ParameterOperation::AssignDefault {
                word: word(&rest[2..])?,
                check_empty: true,
            }),
            Some('?') => Ok(ParameterOperation::ErrorIfUnset {
                word: if rest.len() > 2 { Some(word(&rest[2..])?) } else { None },
                check_empty: true,
            }),
            Some('+') => Ok(ParameterOperation::UseAlternative {
                word: word(&rest[2..])?,
                check_empty: true,
            }),
            _ => parse_substring(&rest[1..]),
        },
        '-' => Ok(ParameterOperation::DefaultValue { word: word(&rest[1..])?, check_empty: false }),
        '=' => Ok(ParameterOperation::AssignDefault { word: word(&rest[1..])?, check_empty: false }),
        '?' => Ok(ParameterOperation::ErrorIfUnset {
            word: if rest.len() > 1 { Some(word(&rest[1..])?) } else { None },
            check_empty: false,
        }),
        '+' => Ok(ParameterOperation::UseAlternative {
            word: word(&rest[1..])?,
            check_empty: false,
        }),
        '#' => {
            let greedy = chars.get(1) == Some(&'#');
            let pattern = if greedy { &rest[2..] } else { &rest[1..] };
            Ok(ParameterOperation::PatternRemoval {
                pattern: word(pattern)?,
                side: PatternSide::Prefix,
                greedy,
            })
        }
        '%' => {
            let greedy = chars.get(1) == Some(&'%');
            let pattern = if greedy { &rest[2..] } else { &rest[1..] };
            Ok(ParameterOperation::PatternRemoval {
                pattern: word(pattern)?,
                side: PatternSide::Suffix,
                greedy,
            })
        }
        '/' => {
            let all = chars.get(1) == Some(&'/');
            let body_start = if all { 2 } else { 1 };
            let body: Vec<char> = chars[body_start..].to_vec();

            // Leading # or % anchors the pattern
            let (anchor, pat_start) = match body.first() {
                Some('#') => (Some(PatternAnchor::Start), 1),
                Some('%') => (Some(PatternAnchor::End), 1),
                _ => (None, 0),
            };

            let sep = find_unescaped_slash(&body, pat_start);
            let (pattern_text, replacement) = match sep {
                Some(idx) => {
                    let pat: String = body[pat_start..idx].iter().collect();
                    let repl: String = body[idx + 1..].iter().collect();
                    (pat, Some(word(&repl)?))
                }
                None => (body[pat_start..].iter().collect(), None),
            };

            Ok(ParameterOperation::PatternReplacement {
                pattern: word(&pattern_text)?,
                replacement,
                all,
                anchor,
            })
        }
        '^' => {
            let all = chars.get(1) == Some(&'^');
            let pattern_text = if all { &rest[2..] } else { &rest[1..] };
            Ok(ParameterOperation::CaseModification {
                direction: CaseDirection::Upper,
                all,
                pattern: if pattern_text.is_empty() { None } else { Some(word(pattern_text)?) },
            })
        }
        ',' => {
            let all = chars.get(1) == Some(&',');
            let pattern_text = if all { &rest[2..] } else { &rest[1..] };
            Ok(ParameterOperation::CaseModification {
                direction: CaseDirection::Lower,
                all,
                pattern: if pattern_text.is_empty() { None } else { Some(word(pattern_text)?) },
            })
        }
        _ => Err(ParseException::new(format!("bad substitution: `{}'", rest), 0, 0)),
    }
}

/// Parse `offset` or `offset:length` after `${name:`.
fn parse_substring(text: &str) -> Result<ParameterOperation, ParseException> {
    let chars: Vec<char> = text.chars().collect();
    let mut split: Option<usize> = None;
    let mut paren_depth = 0;
    let mut i = 0;
    let mut ternary_depth = 0;

    while i < chars.len() {
        match chars[i] {
            '(' => paren_depth += 1,
            ')' => paren_depth -= 1,
            '?' => ternary_depth += 1,
            ':' if paren_depth == 0 => {
                if ternary_depth > 0 {
                    ternary_depth -= 1;
                } else {
                    split = Some(i);
                    break;
                }
            }
            _ => {}
        }
        i += 1;
    }

    let (offset_text, length_text) = match split {
        Some(idx) => (
            chars[..idx].iter().collect::<String>(),
            Some(chars[idx + 1..].iter().collect::<String>()),
        ),
        None => (text.to_string(), None),
    };

    let offset = parse_arithmetic(offset_text.trim())?;
    let length = match length_text {
        Some(t) => Some(parse_arithmetic(t.trim())?),
        None => None,
    };

    Ok(ParameterOperation::Substring { offset, length })
}

/// Find the `/` separating pattern from replacement, skipping escapes,
/// quotes, and nested expansions.
fn find_unescaped_slash(chars: &[char], from: usize) -> Option<usize> {
    let mut i = from;
    let mut brace_depth = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '\'' => {
                i += 1;
                while i < chars.len() && chars[i] != '\'' {
                    i += 1;
                }
            }
            '{' => brace_depth += 1,
            '}' => brace_depth -= 1,
            '/' if brace_depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::ArithExpr;

    fn parse(inner: &str) -> ParameterExpansionPart {
        match parse_braced_expansion(inner, 0).unwrap() {
            WordPart::ParameterExpansion(pe) => pe,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_plain_name() {
        let pe = parse("HOME");
        assert_eq!(pe.parameter, "HOME");
        assert!(pe.operation.is_none());
    }

    #[test]
    fn test_multi_digit_positional() {
        let pe = parse("10");
        assert_eq!(pe.parameter, "10");
    }

    #[test]
    fn test_length() {
        let pe = parse("#VAR");
        assert_eq!(pe.parameter, "VAR");
        assert_eq!(pe.operation, Some(ParameterOperation::Length));
    }

    #[test]
    fn test_indirection() {
        let pe = parse("!ref");
        assert_eq!(pe.parameter, "ref");
        assert_eq!(pe.operation, Some(ParameterOperation::Indirection));
    }

    #[test]
    fn test_array_subscript() {
        let pe = parse("arr[2]");
        assert_eq!(pe.parameter, "arr[2]");
        let pe = parse("arr[@]");
        assert_eq!(pe.parameter, "arr[@]");
    }

    #[test]
    fn test_default_value_colon() {
        let pe = parse("X:-fallback");
        match pe.operation {
            Some(ParameterOperation::DefaultValue { check_empty, .. }) => assert!(check_empty),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_default_value_no_colon() {
        let pe = parse("X-fallback");
        match pe.operation {
            Some(ParameterOperation::DefaultValue { check_empty, .. }) => assert!(!check_empty),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_assign_default() {
        let pe = parse("X:=val");
        assert!(matches!(pe.operation, Some(ParameterOperation::AssignDefault { .. })));
    }

    #[test]
    fn test_error_if_unset_without_message() {
        let pe = parse("X:?");
        match pe.operation {
            Some(ParameterOperation::ErrorIfUnset { word, .. }) => assert!(word.is_none()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_use_alternative() {
        let pe = parse("X:+alt");
        assert!(matches!(pe.operation, Some(ParameterOperation::UseAlternative { .. })));
    }

    #[test]
    fn test_substring_offset_only() {
        let pe = parse("X:2");
        match pe.operation {
            Some(ParameterOperation::Substring { offset, length }) => {
                assert_eq!(offset, ArithExpr::Number(2));
                assert!(length.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_substring_offset_and_length() {
        let pe = parse("X:1:3");
        match pe.operation {
            Some(ParameterOperation::Substring { length, .. }) => {
                assert_eq!(length, Some(ArithExpr::Number(3)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_substring_negative_offset() {
        let pe = parse("X: -2");
        match pe.operation {
            Some(ParameterOperation::Substring { offset, .. }) => {
                assert!(matches!(offset, ArithExpr::Unary { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_pattern_removal_variants() {
        for (inner, side, greedy) in [
            ("X#pat", PatternSide::Prefix, false),
            ("X##pat", PatternSide::Prefix, true),
            ("X%pat", PatternSide::Suffix, false),
            ("X%%pat", PatternSide::Suffix, true),
        ] {
            let pe = parse(inner);
            match pe.operation {
                Some(ParameterOperation::PatternRemoval { side: s, greedy: g, .. }) => {
                    assert_eq!(s, side);
                    assert_eq!(g, greedy);
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_pattern_replacement() {
        let pe = parse("X/a/b");
        match pe.operation {
            Some(ParameterOperation::PatternReplacement { all, anchor, replacement, .. }) => {
                assert!(!all);
                assert!(anchor.is_none());
                assert!(replacement.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_pattern_replacement_all_anchored() {
        let pe = parse("X//#pre/");
        match pe.operation {
            Some(ParameterOperation::PatternReplacement { all, anchor, .. }) => {
                assert!(all);
                assert_eq!(anchor, Some(PatternAnchor::Start));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_pattern_replacement_without_replacement() {
        let pe = parse("X/gone");
        match pe.operation {
            Some(ParameterOperation::PatternReplacement { replacement, .. }) => {
                assert!(replacement.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_case_modification() {
        let pe = parse("X^^");
        match pe.operation {
            Some(ParameterOperation::CaseModification { direction, all, pattern }) => {
                assert_eq!(direction, CaseDirection::Upper);
                assert!(all);
                assert!(pattern.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        let pe = parse("X,");
        match pe.operation {
            Some(ParameterOperation::CaseModification { direction, all, .. }) => {
                assert_eq!(direction, CaseDirection::Lower);
                assert!(!all);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bad_substitution() {
        assert!(parse_braced_expansion("", 0).is_err());
        assert!(parse_braced_expansion("X@Q", 0).is_err());
    }

    #[test]
    fn test_special_parameter_in_braces() {
        let pe = parse("?");
        assert_eq!(pe.parameter, "?");
        let pe = parse("@");
        assert_eq!(pe.parameter, "@");
    }
}
