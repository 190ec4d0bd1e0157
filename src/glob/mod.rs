//! Pathname expansion.
//!
//! Matches glob patterns segment by segment against the virtual
//! filesystem. Results are sorted; a pattern with no matches is left to
//! the caller (classic bash: the word stays as written).

use crate::interpreter::expansion::pattern::compile_pattern;
use crate::interpreter::sync_fs::SyncFs;

/// Expand a glob pattern relative to `cwd`. Relative patterns produce
/// relative paths, absolute patterns absolute ones.
pub fn expand_pathnames(fs: &dyn SyncFs, cwd: &str, pattern: &str) -> Vec<String> {
    let absolute = pattern.starts_with('/');
    let segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Vec::new();
    }

    let base = if absolute { "/".to_string() } else { cwd.to_string() };
    // (filesystem path, display path)
    let mut candidates: Vec<(String, String)> = vec![(
        base,
        if absolute { "/".to_string() } else { String::new() },
    )];

    for (i, segment) in segments.iter().enumerate() {
        let is_last = i == segments.len() - 1;
        let mut next: Vec<(String, String)> = Vec::new();

        if has_glob_chars(segment) {
            let matcher = match compile_pattern(segment) {
                Some(re) => re,
                None => return Vec::new(),
            };
            let match_hidden = segment.starts_with('.');

            for (dir, display) in &candidates {
                let entries = match fs.read_dir(dir) {
                    Ok(entries) => entries,
                    Err(_) => continue,
                };
                for entry in entries {
                    if entry.starts_with('.') && !match_hidden {
                        continue;
                    }
                    if !matcher.is_match(&entry) {
                        continue;
                    }
                    let full = join(dir, &entry);
                    if !is_last && !fs.is_dir(&full) {
                        continue;
                    }
                    next.push((full, join_display(display, &entry)));
                }
            }
        } else {
            let literal = unescape(segment);
            for (dir, display) in &candidates {
                let full = join(dir, &literal);
                if fs.exists(&full) && (is_last || fs.is_dir(&full)) {
                    next.push((full, join_display(display, &literal)));
                }
            }
        }

        candidates = next;
        if candidates.is_empty() {
            return Vec::new();
        }
    }

    let mut results: Vec<String> = candidates.into_iter().map(|(_, d)| d).collect();
    results.sort();
    results
}

fn has_glob_chars(segment: &str) -> bool {
    let chars: Vec<char> = segment.chars().collect();
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

fn unescape(segment: &str) -> String {
    let mut out = String::new();
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

fn join_display(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if prefix == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", prefix, name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileSystem, InMemoryFs, MkdirOptions};
    use crate::interpreter::sync_fs::SyncFsAdapter;
    use std::sync::Arc;

    async fn fixture() -> Arc<InMemoryFs> {
        let fs = Arc::new(InMemoryFs::new());
        fs.mkdir("/home/user/docs", &MkdirOptions { recursive: true }).await.unwrap();
        fs.write_file("/home/user/a.txt", b"").await.unwrap();
        fs.write_file("/home/user/b.txt", b"").await.unwrap();
        fs.write_file("/home/user/c.md", b"").await.unwrap();
        fs.write_file("/home/user/.hidden", b"").await.unwrap();
        fs.write_file("/home/user/docs/d.txt", b"").await.unwrap();
        fs
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_relative_glob() {
        let fs = fixture().await;
        let adapter = SyncFsAdapter::new(fs, tokio::runtime::Handle::current());
        let matches = expand_pathnames(&adapter, "/home/user", "*.txt");
        assert_eq!(matches, vec!["a.txt", "b.txt"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_absolute_glob() {
        let fs = fixture().await;
        let adapter = SyncFsAdapter::new(fs, tokio::runtime::Handle::current());
        let matches = expand_pathnames(&adapter, "/", "/home/user/*.md");
        assert_eq!(matches, vec!["/home/user/c.md"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_glob_across_directories() {
        let fs = fixture().await;
        let adapter = SyncFsAdapter::new(fs, tokio::runtime::Handle::current());
        let matches = expand_pathnames(&adapter, "/home/user", "*/*.txt");
        assert_eq!(matches, vec!["docs/d.txt"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_hidden_files_need_explicit_dot() {
        let fs = fixture().await;
        let adapter = SyncFsAdapter::new(fs, tokio::runtime::Handle::current());
        let matches = expand_pathnames(&adapter, "/home/user", "*");
        assert!(!matches.contains(&".hidden".to_string()));
        let matches = expand_pathnames(&adapter, "/home/user", ".h*");
        assert_eq!(matches, vec![".hidden"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_no_match_returns_empty() {
        let fs = fixture().await;
        let adapter = SyncFsAdapter::new(fs, tokio::runtime::Handle::current());
        assert!(expand_pathnames(&adapter, "/home/user", "*.rs").is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_question_mark_and_class() {
        let fs = fixture().await;
        let adapter = SyncFsAdapter::new(fs, tokio::runtime::Handle::current());
        let matches = expand_pathnames(&adapter, "/home/user", "?.txt");
        assert_eq!(matches, vec!["a.txt", "b.txt"]);
        let matches = expand_pathnames(&adapter, "/home/user", "[ab].txt");
        assert_eq!(matches, vec!["a.txt", "b.txt"]);
    }
}
