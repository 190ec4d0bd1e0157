//! Brace expansion.
//!
//! Purely syntactic: rewrites one word into many before any other
//! expansion phase runs. Nested braces are handled by re-expanding each
//! candidate word.

use crate::ast::types::{BraceItem, BraceRangeValue, WordNode, WordPart};

/// Expand every brace part of a word, producing the candidate words.
pub fn expand_braces(word: &WordNode) -> Vec<WordNode> {
    let brace_index = word
        .parts
        .iter()
        .position(|p| matches!(p, WordPart::BraceExpansion(_)));

    let index = match brace_index {
        Some(i) => i,
        None => return vec![word.clone()],
    };

    let items = match &word.parts[index] {
        WordPart::BraceExpansion(items) => items,
        _ => unreachable!(),
    };

    let prefix = &word.parts[..index];
    let suffix = &word.parts[index + 1..];
    let mut results = Vec::new();

    for item in items {
        match item {
            BraceItem::Word(item_word) => {
                let mut parts = prefix.to_vec();
                parts.extend(item_word.parts.clone());
                parts.extend(suffix.to_vec());
                results.extend(expand_braces(&WordNode::new(parts)));
            }
            BraceItem::Range { start, end, step } => {
                for text in expand_range(*start, *end, *step) {
                    let mut parts = prefix.to_vec();
                    parts.push(WordPart::Literal(text));
                    parts.extend(suffix.to_vec());
                    results.extend(expand_braces(&WordNode::new(parts)));
                }
            }
        }
    }

    results
}

/// Generate the items of {a..b} / {a..b..step}.
fn expand_range(start: BraceRangeValue, end: BraceRangeValue, step: Option<i64>) -> Vec<String> {
    match (start, end) {
        (BraceRangeValue::Number(a), BraceRangeValue::Number(b)) => {
            numeric_range(a, b, step).into_iter().map(|n| n.to_string()).collect()
        }
        (BraceRangeValue::Char(a), BraceRangeValue::Char(b)) => {
            numeric_range(a as i64, b as i64, step)
                .into_iter()
                .filter_map(|n| char::from_u32(n as u32))
                .map(|c| c.to_string())
                .collect()
        }
        // Mixed ranges never parse; keep the parser honest anyway
        _ => Vec::new(),
    }
}

fn numeric_range(a: i64, b: i64, step: Option<i64>) -> Vec<i64> {
    let step = step.map(|s| s.abs()).filter(|s| *s != 0).unwrap_or(1);
    let mut values = Vec::new();
    if a <= b {
        let mut n = a;
        while n <= b {
            values.push(n);
            n += step;
        }
    } else {
        let mut n = a;
        while n >= b {
            values.push(n);
            n -= step;
        }
    }
    values
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::word_parser::parse_word;

    fn expand_to_strings(raw: &str) -> Vec<String> {
        let word = parse_word(raw).unwrap();
        expand_braces(&word)
            .iter()
            .map(|w| {
                w.parts
                    .iter()
                    .map(|p| match p {
                        WordPart::Literal(s) => s.clone(),
                        WordPart::SingleQuoted(s) => s.clone(),
                        other => panic!("unexpected part {:?}", other),
                    })
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_simple_list() {
        assert_eq!(expand_to_strings("{a,b,c}"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_prefix_suffix() {
        assert_eq!(expand_to_strings("x{a,b}y"), vec!["xay", "xby"]);
    }

    #[test]
    fn test_numeric_range() {
        assert_eq!(expand_to_strings("{1..5}"), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(expand_to_strings("{5..1}"), vec!["5", "4", "3", "2", "1"]);
        assert_eq!(expand_to_strings("{-1..1}"), vec!["-1", "0", "1"]);
    }

    #[test]
    fn test_range_with_step() {
        assert_eq!(expand_to_strings("{1..10..2}"), vec!["1", "3", "5", "7", "9"]);
        assert_eq!(expand_to_strings("{10..1..3}"), vec!["10", "7", "4", "1"]);
    }

    #[test]
    fn test_char_range() {
        assert_eq!(expand_to_strings("{a..e}"), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_nested_braces() {
        assert_eq!(expand_to_strings("{a,b{1,2}}"), vec!["a", "b1", "b2"]);
    }

    #[test]
    fn test_multiple_brace_groups() {
        assert_eq!(expand_to_strings("{a,b}{1,2}"), vec!["a1", "a2", "b1", "b2"]);
    }

    #[test]
    fn test_no_braces_passthrough() {
        let word = parse_word("plain").unwrap();
        assert_eq!(expand_braces(&word), vec![word]);
    }

    #[test]
    fn test_range_count_property() {
        for (a, b) in [(1i64, 9i64), (3, 3), (9, 1), (-4, 4)] {
            let items = numeric_range(a, b, None);
            assert_eq!(items.len() as i64, (b - a).abs() + 1);
        }
    }
}
