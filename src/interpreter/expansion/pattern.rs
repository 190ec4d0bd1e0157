//! Shell pattern matching.
//!
//! One engine serves every pattern context: `case`, `[[ == ]]`,
//! parameter pattern operations, and pathname expansion. Shell globs are
//! compiled to anchored regexes; a backslash escapes the following
//! character (that is how quoted pattern text arrives here).

use regex_lite::Regex;

use crate::ast::types::{CaseDirection, PatternAnchor};

/// Translate a shell pattern into regex source (no anchors).
pub fn pattern_to_regex_src(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            // [\s\S] spans newlines without relying on inline flags
            '*' => out.push_str("[\\s\\S]*"),
            '?' => out.push_str("[\\s\\S]"),
            '\\' => {
                if i + 1 < chars.len() {
                    push_escaped(&mut out, chars[i + 1]);
                    i += 1;
                } else {
                    out.push_str("\\\\");
                }
            }
            '[' => {
                // Find the closing bracket of the class
                let mut j = i + 1;
                if matches!(chars.get(j), Some('!') | Some('^')) {
                    j += 1;
                }
                if chars.get(j) == Some(&']') {
                    j += 1;
                }
                while j < chars.len() && chars[j] != ']' {
                    j += 1;
                }
                if j >= chars.len() {
                    // Unclosed class is a literal [
                    out.push_str("\\[");
                } else {
                    out.push('[');
                    let mut k = i + 1;
                    if matches!(chars.get(k), Some('!') | Some('^')) {
                        out.push('^');
                        k += 1;
                    }
                    while k < j {
                        match chars[k] {
                            '\\' => out.push_str("\\\\"),
                            '[' => out.push_str("\\["),
                            c => out.push(c),
                        }
                        k += 1;
                    }
                    out.push(']');
                    i = j;
                }
            }
            c => push_escaped(&mut out, c),
        }
        i += 1;
    }

    out
}

fn push_escaped(out: &mut String, c: char) {
    if "\\.+*?()|[]{}^$".contains(c) {
        out.push('\\');
    }
    out.push(c);
}

/// Compile a shell pattern into an anchored whole-string matcher.
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    Regex::new(&format!("^{}$", pattern_to_regex_src(pattern))).ok()
}

/// Whole-string match of a shell pattern.
pub fn matches_pattern(pattern: &str, text: &str) -> bool {
    match compile_pattern(pattern) {
        Some(re) => re.is_match(text),
        None => pattern == text,
    }
}

/// Byte offsets of the char boundaries of `text`, including the end.
fn char_boundaries(text: &str) -> Vec<usize> {
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    bounds.push(text.len());
    bounds
}

/// ${var#pat} / ${var##pat}: remove the shortest/longest matching prefix.
pub fn remove_prefix(text: &str, pattern: &str, greedy: bool) -> String {
    let re = match compile_pattern(pattern) {
        Some(re) => re,
        None => return text.to_string(),
    };
    let bounds = char_boundaries(text);
    let candidates: Box<dyn Iterator<Item = &usize>> = if greedy {
        Box::new(bounds.iter().rev())
    } else {
        Box::new(bounds.iter())
    };
    for &end in candidates {
        if re.is_match(&text[..end]) {
            return text[end..].to_string();
        }
    }
    text.to_string()
}

/// ${var%pat} / ${var%%pat}: remove the shortest/longest matching suffix.
pub fn remove_suffix(text: &str, pattern: &str, greedy: bool) -> String {
    let re = match compile_pattern(pattern) {
        Some(re) => re,
        None => return text.to_string(),
    };
    let bounds = char_boundaries(text);
    let candidates: Box<dyn Iterator<Item = &usize>> = if greedy {
        Box::new(bounds.iter())
    } else {
        Box::new(bounds.iter().rev())
    };
    for &start in candidates {
        if re.is_match(&text[start..]) {
            return text[..start].to_string();
        }
    }
    text.to_string()
}

/// ${var/pat/repl} family.
pub fn replace_pattern(
    text: &str,
    pattern: &str,
    replacement: &str,
    all: bool,
    anchor: Option<PatternAnchor>,
) -> String {
    if pattern.is_empty() {
        return text.to_string();
    }
    let src = pattern_to_regex_src(pattern);
    let src = match anchor {
        Some(PatternAnchor::Start) => format!("^{}", src),
        Some(PatternAnchor::End) => format!("{}$", src),
        None => src,
    };
    let re = match Regex::new(&src) {
        Ok(re) => re,
        Err(_) => return text.to_string(),
    };

    let mut out = String::new();
    let mut last = 0;
    for m in re.find_iter(text) {
        // An empty match would loop forever; step past it
        if m.start() == m.end() && m.start() == last && !out.is_empty() {
            break;
        }
        out.push_str(&text[last..m.start()]);
        out.push_str(replacement);
        last = m.end();
        if !all {
            break;
        }
        if m.start() == m.end() {
            break;
        }
    }
    out.push_str(&text[last..]);
    out
}

/// ${var^} ${var^^} ${var,} ${var,,} with an optional char pattern.
pub fn case_modify(
    text: &str,
    direction: CaseDirection,
    all: bool,
    pattern: Option<&str>,
) -> String {
    let matcher = pattern.and_then(compile_pattern);
    let char_matches = |c: char| -> bool {
        match &matcher {
            Some(re) => re.is_match(&c.to_string()),
            None => true,
        }
    };

    let mut out = String::new();
    for (idx, c) in text.chars().enumerate() {
        let eligible = (all || idx == 0) && char_matches(c);
        if eligible {
            match direction {
                CaseDirection::Upper => out.extend(c.to_uppercase()),
                CaseDirection::Lower => out.extend(c.to_lowercase()),
            }
        } else {
            out.push(c);
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

    #[test]
    fn test_star_and_question() {
        assert!(matches_pattern("*.txt", "file.txt"));
        assert!(!matches_pattern("*.txt", "file.md"));
        assert!(matches_pattern("f?le", "file"));
        assert!(!matches_pattern("f?le", "fle"));
    }

    #[test]
    fn test_star_matches_empty() {
        assert!(matches_pattern("a*b", "ab"));
        assert!(matches_pattern("*", ""));
    }

    #[test]
    fn test_char_class() {
        assert!(matches_pattern("[a-c]x", "bx"));
        assert!(!matches_pattern("[a-c]x", "dx"));
        assert!(matches_pattern("[!a-c]x", "dx"));
        assert!(!matches_pattern("[!a-c]x", "ax"));
    }

    #[test]
    fn test_escaped_glob_char_is_literal() {
        assert!(matches_pattern("a\\*b", "a*b"));
        assert!(!matches_pattern("a\\*b", "aXb"));
    }

    #[test]
    fn test_regex_metachars_are_literal() {
        assert!(matches_pattern("a.b", "a.b"));
        assert!(!matches_pattern("a.b", "aXb"));
        assert!(matches_pattern("x(1)", "x(1)"));
    }

    #[test]
    fn test_remove_prefix() {
        assert_eq!(remove_prefix("src/main.rs", "*/", false), "main.rs");
        assert_eq!(remove_prefix("a/b/c", "*/", false), "b/c");
        assert_eq!(remove_prefix("a/b/c", "*/", true), "c");
        assert_eq!(remove_prefix("hello", "x", false), "hello");
    }

    #[test]
    fn test_remove_suffix() {
        assert_eq!(remove_suffix("file.tar.gz", ".*", false), "file.tar");
        assert_eq!(remove_suffix("file.tar.gz", ".*", true), "file");
        assert_eq!(remove_suffix("hello", "x", true), "hello");
    }

    #[test]
    fn test_replace_pattern() {
        assert_eq!(replace_pattern("aaa", "a", "b", false, None), "baa");
        assert_eq!(replace_pattern("aaa", "a", "b", true, None), "bbb");
        assert_eq!(replace_pattern("hello world", "o", "0", true, None), "hell0 w0rld");
    }

    #[test]
    fn test_replace_anchored() {
        assert_eq!(
            replace_pattern("aba", "a", "X", false, Some(PatternAnchor::Start)),
            "Xba"
        );
        assert_eq!(
            replace_pattern("aba", "a", "X", false, Some(PatternAnchor::End)),
            "abX"
        );
        assert_eq!(
            replace_pattern("bbb", "a", "X", false, Some(PatternAnchor::Start)),
            "bbb"
        );
    }

    #[test]
    fn test_replace_glob_in_pattern() {
        assert_eq!(replace_pattern("foo.txt", "*.txt", "X", false, None), "X");
    }

    #[test]
    fn test_case_modify() {
        assert_eq!(case_modify("hello", CaseDirection::Upper, false, None), "Hello");
        assert_eq!(case_modify("hello", CaseDirection::Upper, true, None), "HELLO");
        assert_eq!(case_modify("HELLO", CaseDirection::Lower, false, None), "hELLO");
        assert_eq!(case_modify("HELLO", CaseDirection::Lower, true, None), "hello");
    }

    #[test]
    fn test_case_modify_with_pattern() {
        assert_eq!(
            case_modify("hello", CaseDirection::Upper, true, Some("[aeiou]")),
            "hEllO"
        );
    }
}
