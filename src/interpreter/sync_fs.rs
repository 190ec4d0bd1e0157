//! Sync filesystem bridge.
//!
//! The execution engine is synchronous; the filesystem trait is async.
//! This adapter runs the async operations to completion with
//! `block_in_place` + `Handle::block_on`, the same bridge the embedder
//! entry point uses.

use std::sync::Arc;

use crate::fs::{FileSystem, FsError, FsStat};

/// The synchronous filesystem surface the engine programs against.
pub trait SyncFs: Send + Sync {
    fn read_file(&self, path: &str) -> Result<String, FsError>;
    fn write_file(&self, path: &str, contents: &str) -> Result<(), FsError>;
    fn append_file(&self, path: &str, contents: &str) -> Result<(), FsError>;
    fn exists(&self, path: &str) -> bool;
    fn is_dir(&self, path: &str) -> bool;
    fn is_file(&self, path: &str) -> bool;
    fn stat(&self, path: &str) -> Result<FsStat, FsError>;
    fn lstat(&self, path: &str) -> Result<FsStat, FsError>;
    fn read_dir(&self, path: &str) -> Result<Vec<String>, FsError>;
    fn resolve_path(&self, base: &str, path: &str) -> String;
    fn get_all_paths(&self) -> Vec<String>;
}

/// Adapter wrapping an async `FileSystem` with a sync interface.
pub struct SyncFsAdapter {
    inner: Arc<dyn FileSystem>,
    handle: tokio::runtime::Handle,
}

impl SyncFsAdapter {
    pub fn new(fs: Arc<dyn FileSystem>, handle: tokio::runtime::Handle) -> Self {
        Self { inner: fs, handle }
    }

    fn block_on<F, T>(&self, f: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        tokio::task::block_in_place(|| self.handle.block_on(f))
    }
}

impl SyncFs for SyncFsAdapter {
    fn read_file(&self, path: &str) -> Result<String, FsError> {
        self.block_on(self.inner.read_file(path))
    }

    fn write_file(&self, path: &str, contents: &str) -> Result<(), FsError> {
        self.block_on(self.inner.write_file(path, contents.as_bytes()))
    }

    fn append_file(&self, path: &str, contents: &str) -> Result<(), FsError> {
        self.block_on(self.inner.append_file(path, contents.as_bytes()))
    }

    fn exists(&self, path: &str) -> bool {
        self.block_on(self.inner.exists(path))
    }

    fn is_dir(&self, path: &str) -> bool {
        self.block_on(self.inner.stat(path)).map(|s| s.is_directory).unwrap_or(false)
    }

    fn is_file(&self, path: &str) -> bool {
        self.block_on(self.inner.stat(path)).map(|s| s.is_file).unwrap_or(false)
    }

    fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        self.block_on(self.inner.stat(path))
    }

    fn lstat(&self, path: &str) -> Result<FsStat, FsError> {
        self.block_on(self.inner.lstat(path))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<String>, FsError> {
        self.block_on(self.inner.readdir(path))
    }

    fn resolve_path(&self, base: &str, path: &str) -> String {
        self.inner.resolve_path(base, path)
    }

    fn get_all_paths(&self) -> Vec<String> {
        self.inner.get_all_paths()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{InMemoryFs, MkdirOptions};

    #[tokio::test(flavor = "multi_thread")]
    async fn test_adapter_read_write() {
        let fs = Arc::new(InMemoryFs::new());
        let adapter = SyncFsAdapter::new(fs.clone(), tokio::runtime::Handle::current());

        adapter.write_file("/test.txt", "hello").unwrap();
        assert_eq!(adapter.read_file("/test.txt").unwrap(), "hello");
        assert!(adapter.exists("/test.txt"));
        assert!(adapter.is_file("/test.txt"));
        assert!(!adapter.is_dir("/test.txt"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_adapter_dirs() {
        let fs = Arc::new(InMemoryFs::new());
        fs.mkdir("/d", &MkdirOptions::default()).await.unwrap();
        fs.write_file("/d/a", b"x").await.unwrap();

        let adapter = SyncFsAdapter::new(fs, tokio::runtime::Handle::current());
        assert!(adapter.is_dir("/d"));
        assert_eq!(adapter.read_dir("/d").unwrap(), vec!["a"]);
        assert_eq!(adapter.resolve_path("/d", "a"), "/d/a");
    }
}
