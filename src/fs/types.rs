//! File system types.
//!
//! The trait the interpreter programs against, the error set, and the
//! path utilities shared by every implementation. All paths are
//! absolute, POSIX-style, with `.` and `..` resolved.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;

/// File system errors, errno-flavored.
#[derive(Error, Debug, Clone)]
pub enum FsError {
    #[error("ENOENT: no such file or directory, {operation} '{path}'")]
    NotFound { path: String, operation: String },

    #[error("EEXIST: file already exists, {operation} '{path}'")]
    AlreadyExists { path: String, operation: String },

    #[error("EISDIR: illegal operation on a directory, {operation} '{path}'")]
    IsDirectory { path: String, operation: String },

    #[error("ENOTDIR: not a directory, {operation} '{path}'")]
    NotDirectory { path: String, operation: String },

    #[error("ENOTEMPTY: directory not empty, {operation} '{path}'")]
    NotEmpty { path: String, operation: String },

    #[error("EINVAL: invalid argument, {operation} '{path}'")]
    InvalidArgument { path: String, operation: String },

    #[error("ELOOP: too many levels of symbolic links, {operation} '{path}'")]
    SymlinkLoop { path: String, operation: String },

    #[error("{message}")]
    Other { message: String },
}

impl FsError {
    pub fn not_found(operation: &str, path: &str) -> Self {
        Self::NotFound { path: path.to_string(), operation: operation.to_string() }
    }

    /// Short errno-style message for command stderr ("No such file or directory").
    pub fn strerror(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "No such file or directory",
            Self::AlreadyExists { .. } => "File exists",
            Self::IsDirectory { .. } => "Is a directory",
            Self::NotDirectory { .. } => "Not a directory",
            Self::NotEmpty { .. } => "Directory not empty",
            Self::InvalidArgument { .. } => "Invalid argument",
            Self::SymlinkLoop { .. } => "Too many levels of symbolic links",
            Self::Other { .. } => "I/O error",
        }
    }
}

/// Provider for lazily materialized file content. Invoked once on first
/// read; the result is cached in the entry.
pub type ContentProvider = Arc<dyn Fn() -> Vec<u8> + Send + Sync>;

/// Initial file content: eager text/bytes or a lazy provider.
#[derive(Clone)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
    Lazy(ContentProvider),
}

impl fmt::Debug for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Binary(b) => f.debug_tuple("Binary").field(&b.len()).finish(),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        FileContent::Text(s)
    }
}

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        FileContent::Text(s.to_string())
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(v: Vec<u8>) -> Self {
        FileContent::Binary(v)
    }
}

/// Initial file specification with optional metadata.
#[derive(Debug, Clone)]
pub struct FileInit {
    pub content: FileContent,
    pub mode: Option<u32>,
}

impl From<FileContent> for FileInit {
    fn from(content: FileContent) -> Self {
        FileInit { content, mode: None }
    }
}

impl From<String> for FileInit {
    fn from(s: String) -> Self {
        FileInit { content: FileContent::Text(s), mode: None }
    }
}

impl From<&str> for FileInit {
    fn from(s: &str) -> Self {
        FileInit { content: FileContent::Text(s.to_string()), mode: None }
    }
}

impl From<Vec<u8>> for FileInit {
    fn from(v: Vec<u8>) -> Self {
        FileInit { content: FileContent::Binary(v), mode: None }
    }
}

/// Initial files map accepted by the sandbox constructor.
pub type InitialFiles = HashMap<String, FileInit>;

/// File status information.
#[derive(Debug, Clone)]
pub struct FsStat {
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
    pub mode: u32,
    /// Zero for lazy files until materialized
    pub size: u64,
    pub mtime: SystemTime,
}

/// Directory entry with type information.
#[derive(Debug, Clone)]
pub struct DirentEntry {
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MkdirOptions {
    pub recursive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RmOptions {
    pub recursive: bool,
    pub force: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CpOptions {
    pub recursive: bool,
}

/// Abstract filesystem interface. Every operation is total: errors are
/// returned, never panicked.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a file as a UTF-8 string.
    async fn read_file(&self, path: &str) -> Result<String, FsError>;

    /// Read a file as raw bytes.
    async fn read_file_buffer(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Write content, creating or truncating.
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    /// Append content, creating if missing.
    async fn append_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    async fn exists(&self, path: &str) -> bool;

    /// Stat, following symlinks.
    async fn stat(&self, path: &str) -> Result<FsStat, FsError>;

    /// Stat without following the final symlink.
    async fn lstat(&self, path: &str) -> Result<FsStat, FsError>;

    async fn mkdir(&self, path: &str, options: &MkdirOptions) -> Result<(), FsError>;

    /// Entry names, sorted.
    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError>;

    async fn readdir_with_file_types(&self, path: &str) -> Result<Vec<DirentEntry>, FsError>;

    async fn rm(&self, path: &str, options: &RmOptions) -> Result<(), FsError>;

    async fn cp(&self, src: &str, dest: &str, options: &CpOptions) -> Result<(), FsError>;

    async fn mv(&self, src: &str, dest: &str) -> Result<(), FsError>;

    async fn chmod(&self, path: &str, mode: u32) -> Result<(), FsError>;

    async fn symlink(&self, target: &str, link_path: &str) -> Result<(), FsError>;

    /// Hard link.
    async fn link(&self, existing_path: &str, new_path: &str) -> Result<(), FsError>;

    async fn readlink(&self, path: &str) -> Result<String, FsError>;

    /// Resolve every symlink to the canonical physical path.
    async fn realpath(&self, path: &str) -> Result<String, FsError>;

    async fn utimes(&self, path: &str, mtime: SystemTime) -> Result<(), FsError>;

    /// Resolve a possibly-relative path against a base directory.
    fn resolve_path(&self, base: &str, path: &str) -> String;

    /// All absolute paths currently in the filesystem, sorted.
    fn get_all_paths(&self) -> Vec<String>;

    /// Deep-copy the filesystem. Subshells, pipeline stages, and
    /// command substitutions run against a fork; their mutations are
    /// discarded with it.
    async fn fork(&self) -> Arc<dyn FileSystem>;
}

// ============================================================================
// Path utilities
// ============================================================================

/// Normalize an absolute POSIX path: collapse //, resolve . and ..
pub fn normalize_path(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            s => stack.push(s),
        }
    }
    if stack.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", stack.join("/"))
    }
}

/// Resolve `path` against `base` (used by FileSystem::resolve_path).
pub fn resolve(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        normalize_path(path)
    } else {
        normalize_path(&format!("{}/{}", base, path))
    }
}

/// The directory component of a path.
pub fn dirname(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// The final component of a path.
pub fn basename(path: &str) -> String {
    let normalized = normalize_path(path);
    if normalized == "/" {
        return "/".to_string();
    }
    normalized.rsplit('/').next().unwrap_or("").to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b/c"), "/a/b/c");
        assert_eq!(normalize_path("/a//b/"), "/a/b");
        assert_eq!(normalize_path("/a/./b"), "/a/b");
        assert_eq!(normalize_path("/a/b/../c"), "/a/c");
        assert_eq!(normalize_path("/../.."), "/");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("/home/user", "file.txt"), "/home/user/file.txt");
        assert_eq!(resolve("/home/user", "/abs"), "/abs");
        assert_eq!(resolve("/home/user", "../other"), "/home/other");
        assert_eq!(resolve("/", "x"), "/x");
    }

    #[test]
    fn test_dirname_basename() {
        assert_eq!(dirname("/a/b/c"), "/a/b");
        assert_eq!(dirname("/a"), "/");
        assert_eq!(dirname("/"), "/");
        assert_eq!(basename("/a/b/c"), "c");
        assert_eq!(basename("/"), "/");
    }

    #[test]
    fn test_fs_error_display() {
        let err = FsError::not_found("open", "/missing");
        assert!(err.to_string().contains("ENOENT"));
        assert!(err.to_string().contains("/missing"));
        assert_eq!(err.strerror(), "No such file or directory");
    }

    #[test]
    fn test_file_init_from() {
        let init: FileInit = "hello".into();
        assert!(matches!(init.content, FileContent::Text(_)));
        let init: FileInit = vec![1u8, 2].into();
        assert!(matches!(init.content, FileContent::Binary(_)));
    }
}
