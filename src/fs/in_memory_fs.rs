//! In-memory file system.
//!
//! A path → entry map with POSIX-style semantics: per-component symlink
//! resolution with a loop cap, recursive directory operations, and lazy
//! content providers materialized on first read.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::SystemTime;

use crate::fs::types::{
    self, normalize_path, ContentProvider, CpOptions, DirentEntry, FileContent, FileInit,
    FileSystem, FsError, FsStat, InitialFiles, MkdirOptions, RmOptions,
};

const MAX_SYMLINK_HOPS: usize = 40;
const DEFAULT_FILE_MODE: u32 = 0o644;
const DEFAULT_DIR_MODE: u32 = 0o755;

/// File payload: materialized bytes or a pending provider.
#[derive(Clone)]
enum FileData {
    Loaded(Vec<u8>),
    Lazy(ContentProvider),
}

#[derive(Clone)]
enum Entry {
    File { data: FileData, mode: u32, mtime: SystemTime },
    Directory { mode: u32, mtime: SystemTime },
    Symlink { target: String, mode: u32, mtime: SystemTime },
}

impl Entry {
    fn file(bytes: Vec<u8>) -> Self {
        Entry::File { data: FileData::Loaded(bytes), mode: DEFAULT_FILE_MODE, mtime: SystemTime::now() }
    }

    fn directory() -> Self {
        Entry::Directory { mode: DEFAULT_DIR_MODE, mtime: SystemTime::now() }
    }

    fn stat(&self) -> FsStat {
        match self {
            Entry::File { data, mode, mtime } => FsStat {
                is_file: true,
                is_directory: false,
                is_symlink: false,
                mode: *mode,
                size: match data {
                    FileData::Loaded(b) => b.len() as u64,
                    FileData::Lazy(_) => 0,
                },
                mtime: *mtime,
            },
            Entry::Directory { mode, mtime } => FsStat {
                is_file: false,
                is_directory: true,
                is_symlink: false,
                mode: *mode,
                size: 0,
                mtime: *mtime,
            },
            Entry::Symlink { mode, mtime, .. } => FsStat {
                is_file: false,
                is_directory: false,
                is_symlink: true,
                mode: *mode,
                size: 0,
                mtime: *mtime,
            },
        }
    }
}

/// The in-memory filesystem.
pub struct InMemoryFs {
    entries: RwLock<HashMap<String, Entry>>,
}

impl Default for InMemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryFs {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert("/".to_string(), Entry::directory());
        Self { entries: RwLock::new(entries) }
    }

    /// Seed a file (or lazy provider), creating parent directories.
    pub fn add_initial_file(&self, path: &str, init: FileInit) {
        let path = normalize_path(path);
        let mut map = self.entries.write().unwrap();
        create_parents(&mut map, &path);
        let data = match init.content {
            FileContent::Text(s) => FileData::Loaded(s.into_bytes()),
            FileContent::Binary(b) => FileData::Loaded(b),
            FileContent::Lazy(p) => FileData::Lazy(p),
        };
        map.insert(
            path,
            Entry::File {
                data,
                mode: init.mode.unwrap_or(DEFAULT_FILE_MODE),
                mtime: SystemTime::now(),
            },
        );
    }

    /// Seed a whole map of initial files.
    pub fn add_initial_files(&self, files: InitialFiles) {
        for (path, init) in files {
            self.add_initial_file(&path, init);
        }
    }

    /// Resolve symlinks component by component; `follow_last` controls
    /// whether the final component is dereferenced.
    fn canonicalize(
        map: &HashMap<String, Entry>,
        path: &str,
        follow_last: bool,
        operation: &str,
    ) -> Result<String, FsError> {
        let normalized = normalize_path(path);
        let mut queue: VecDeque<String> =
            normalized.split('/').filter(|s| !s.is_empty()).map(String::from).collect();
        let mut result = String::from("/");
        let mut hops = 0;

        while let Some(segment) = queue.pop_front() {
            let candidate = if result == "/" {
                format!("/{}", segment)
            } else {
                format!("{}/{}", result, segment)
            };
            let is_last = queue.is_empty();

            match map.get(&candidate) {
                Some(Entry::Symlink { target, .. }) if !is_last || follow_last => {
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(FsError::SymlinkLoop {
                            path: normalized,
                            operation: operation.to_string(),
                        });
                    }
                    let target_abs = if target.starts_with('/') {
                        normalize_path(target)
                    } else {
                        types::resolve(&result, target)
                    };
                    let mut new_queue: VecDeque<String> = target_abs
                        .split('/')
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect();
                    new_queue.extend(queue.drain(..));
                    queue = new_queue;
                    result = String::from("/");
                }
                _ => result = candidate,
            }
        }

        Ok(result)
    }

    fn read_bytes(&self, path: &str, operation: &str) -> Result<Vec<u8>, FsError> {
        let mut map = self.entries.write().unwrap();
        let resolved = Self::canonicalize(&map, path, true, operation)?;
        match map.get_mut(&resolved) {
            Some(Entry::File { data, .. }) => match data {
                FileData::Loaded(bytes) => Ok(bytes.clone()),
                FileData::Lazy(provider) => {
                    let bytes = provider();
                    *data = FileData::Loaded(bytes.clone());
                    Ok(bytes)
                }
            },
            Some(Entry::Directory { .. }) => Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: operation.to_string(),
            }),
            _ => Err(FsError::not_found(operation, path)),
        }
    }

    fn write_bytes(&self, path: &str, content: Vec<u8>, operation: &str) -> Result<(), FsError> {
        let mut map = self.entries.write().unwrap();
        let resolved = Self::canonicalize(&map, path, true, operation)?;
        if matches!(map.get(&resolved), Some(Entry::Directory { .. })) {
            return Err(FsError::IsDirectory {
                path: path.to_string(),
                operation: operation.to_string(),
            });
        }
        check_parent(&map, &resolved, operation)?;
        map.insert(resolved, Entry::file(content));
        Ok(())
    }
}

/// Verify the parent of `path` exists and is a directory.
fn check_parent(map: &HashMap<String, Entry>, path: &str, operation: &str) -> Result<(), FsError> {
    let parent = types::dirname(path);
    match map.get(&parent) {
        Some(Entry::Directory { .. }) => Ok(()),
        Some(_) => Err(FsError::NotDirectory { path: parent, operation: operation.to_string() }),
        None => Err(FsError::not_found(operation, &parent)),
    }
}

fn create_parents(map: &mut HashMap<String, Entry>, path: &str) {
    let parent = types::dirname(path);
    if parent != "/" && !map.contains_key(&parent) {
        create_parents(map, &parent);
    }
    map.entry(parent).or_insert_with(Entry::directory);
}

/// Child names of `dir` (direct children only).
fn children_of(map: &HashMap<String, Entry>, dir: &str) -> Vec<String> {
    let prefix = if dir == "/" { "/".to_string() } else { format!("{}/", dir) };
    let mut names: Vec<String> = map
        .keys()
        .filter(|k| k.starts_with(&prefix) && *k != dir)
        .filter_map(|k| {
            let rest = &k[prefix.len()..];
            if rest.is_empty() || rest.contains('/') {
                None
            } else {
                Some(rest.to_string())
            }
        })
        .collect();
    names.sort();
    names
}

/// All keys at or under `path`.
fn subtree_keys(map: &HashMap<String, Entry>, path: &str) -> Vec<String> {
    let prefix = format!("{}/", path);
    map.keys()
        .filter(|k| *k == path || k.starts_with(&prefix))
        .cloned()
        .collect()
}

#[async_trait]
impl FileSystem for InMemoryFs {
    async fn read_file(&self, path: &str) -> Result<String, FsError> {
        let bytes = self.read_bytes(path, "open")?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn read_file_buffer(&self, path: &str) -> Result<Vec<u8>, FsError> {
        self.read_bytes(path, "open")
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        self.write_bytes(path, content.to_vec(), "open")
    }

    async fn append_file(&self, path: &str, content: &[u8]) -> Result<(), FsError> {
        let existing = match self.read_bytes(path, "open") {
            Ok(bytes) => bytes,
            Err(FsError::NotFound { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        let mut combined = existing;
        combined.extend_from_slice(content);
        self.write_bytes(path, combined, "open")
    }

    async fn exists(&self, path: &str) -> bool {
        let map = self.entries.read().unwrap();
        match Self::canonicalize(&map, path, true, "stat") {
            Ok(resolved) => map.contains_key(&resolved),
            Err(_) => false,
        }
    }

    async fn stat(&self, path: &str) -> Result<FsStat, FsError> {
        let map = self.entries.read().unwrap();
        let resolved = Self::canonicalize(&map, path, true, "stat")?;
        map.get(&resolved)
            .map(|e| e.stat())
            .ok_or_else(|| FsError::not_found("stat", path))
    }

    async fn lstat(&self, path: &str) -> Result<FsStat, FsError> {
        let map = self.entries.read().unwrap();
        let resolved = Self::canonicalize(&map, path, false, "lstat")?;
        map.get(&resolved)
            .map(|e| e.stat())
            .ok_or_else(|| FsError::not_found("lstat", path))
    }

    async fn mkdir(&self, path: &str, options: &MkdirOptions) -> Result<(), FsError> {
        let mut map = self.entries.write().unwrap();
        let resolved = Self::canonicalize(&map, path, true, "mkdir")?;

        if let Some(entry) = map.get(&resolved) {
            if options.recursive && matches!(entry, Entry::Directory { .. }) {
                return Ok(());
            }
            return Err(FsError::AlreadyExists {
                path: path.to_string(),
                operation: "mkdir".to_string(),
            });
        }

        if options.recursive {
            create_parents(&mut map, &resolved);
        } else {
            check_parent(&map, &resolved, "mkdir")?;
        }
        map.insert(resolved, Entry::directory());
        Ok(())
    }

    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let map = self.entries.read().unwrap();
        let resolved = Self::canonicalize(&map, path, true, "scandir")?;
        match map.get(&resolved) {
            Some(Entry::Directory { .. }) => Ok(children_of(&map, &resolved)),
            Some(_) => Err(FsError::NotDirectory {
                path: path.to_string(),
                operation: "scandir".to_string(),
            }),
            None => Err(FsError::not_found("scandir", path)),
        }
    }

    async fn readdir_with_file_types(&self, path: &str) -> Result<Vec<DirentEntry>, FsError> {
        let names = self.readdir(path).await?;
        let map = self.entries.read().unwrap();
        let resolved = Self::canonicalize(&map, path, true, "scandir")?;
        Ok(names
            .into_iter()
            .map(|name| {
                let full = if resolved == "/" {
                    format!("/{}", name)
                } else {
                    format!("{}/{}", resolved, name)
                };
                let (is_file, is_directory, is_symlink) = match map.get(&full) {
                    Some(Entry::File { .. }) => (true, false, false),
                    Some(Entry::Directory { .. }) => (false, true, false),
                    Some(Entry::Symlink { .. }) => (false, false, true),
                    None => (false, false, false),
                };
                DirentEntry { name, is_file, is_directory, is_symlink }
            })
            .collect())
    }

    async fn rm(&self, path: &str, options: &RmOptions) -> Result<(), FsError> {
        let mut map = self.entries.write().unwrap();
        let resolved = Self::canonicalize(&map, path, false, "unlink")?;

        let entry = match map.get(&resolved) {
            Some(e) => e,
            None => {
                if options.force {
                    return Ok(());
                }
                return Err(FsError::not_found("unlink", path));
            }
        };

        if matches!(entry, Entry::Directory { .. }) {
            if !options.recursive {
                return Err(FsError::IsDirectory {
                    path: path.to_string(),
                    operation: "unlink".to_string(),
                });
            }
            for key in subtree_keys(&map, &resolved) {
                map.remove(&key);
            }
            return Ok(());
        }

        map.remove(&resolved);
        Ok(())
    }

    async fn cp(&self, src: &str, dest: &str, options: &CpOptions) -> Result<(), FsError> {
        let mut map = self.entries.write().unwrap();
        let src_resolved = Self::canonicalize(&map, src, true, "copyfile")?;
        let mut dest_resolved = Self::canonicalize(&map, dest, true, "copyfile")?;

        let src_entry = map
            .get(&src_resolved)
            .cloned()
            .ok_or_else(|| FsError::not_found("copyfile", src))?;

        // Copying into an existing directory targets dir/basename
        if matches!(map.get(&dest_resolved), Some(Entry::Directory { .. })) {
            dest_resolved = format!(
                "{}/{}",
                dest_resolved.trim_end_matches('/'),
                types::basename(&src_resolved)
            );
        }

        match src_entry {
            Entry::Directory { .. } => {
                if !options.recursive {
                    return Err(FsError::IsDirectory {
                        path: src.to_string(),
                        operation: "copyfile".to_string(),
                    });
                }
                check_parent(&map, &dest_resolved, "copyfile")?;
                let src_prefix = format!("{}/", src_resolved);
                let keys = subtree_keys(&map, &src_resolved);
                for key in keys {
                    let suffix = if key == src_resolved {
                        String::new()
                    } else {
                        format!("/{}", &key[src_prefix.len()..])
                    };
                    let new_key = format!("{}{}", dest_resolved, suffix);
                    let entry = map.get(&key).cloned().unwrap();
                    map.insert(new_key, entry);
                }
            }
            file_or_link => {
                check_parent(&map, &dest_resolved, "copyfile")?;
                map.insert(dest_resolved, file_or_link);
            }
        }
        Ok(())
    }

    async fn mv(&self, src: &str, dest: &str) -> Result<(), FsError> {
        let mut map = self.entries.write().unwrap();
        let src_resolved = Self::canonicalize(&map, src, false, "rename")?;
        let mut dest_resolved = Self::canonicalize(&map, dest, true, "rename")?;

        if !map.contains_key(&src_resolved) {
            return Err(FsError::not_found("rename", src));
        }
        if matches!(map.get(&dest_resolved), Some(Entry::Directory { .. })) {
            dest_resolved = format!(
                "{}/{}",
                dest_resolved.trim_end_matches('/'),
                types::basename(&src_resolved)
            );
        }
        check_parent(&map, &dest_resolved, "rename")?;

        let src_prefix = format!("{}/", src_resolved);
        for key in subtree_keys(&map, &src_resolved) {
            let suffix = if key == src_resolved {
                String::new()
            } else {
                format!("/{}", &key[src_prefix.len()..])
            };
            let new_key = format!("{}{}", dest_resolved, suffix);
            if let Some(entry) = map.remove(&key) {
                map.insert(new_key, entry);
            }
        }
        Ok(())
    }

    async fn chmod(&self, path: &str, new_mode: u32) -> Result<(), FsError> {
        let mut map = self.entries.write().unwrap();
        let resolved = Self::canonicalize(&map, path, true, "chmod")?;
        match map.get_mut(&resolved) {
            Some(Entry::File { mode, .. })
            | Some(Entry::Directory { mode, .. })
            | Some(Entry::Symlink { mode, .. }) => {
                *mode = new_mode;
                Ok(())
            }
            None => Err(FsError::not_found("chmod", path)),
        }
    }

    async fn symlink(&self, target: &str, link_path: &str) -> Result<(), FsError> {
        let mut map = self.entries.write().unwrap();
        let resolved = normalize_path(link_path);
        if map.contains_key(&resolved) {
            return Err(FsError::AlreadyExists {
                path: link_path.to_string(),
                operation: "symlink".to_string(),
            });
        }
        check_parent(&map, &resolved, "symlink")?;
        map.insert(
            resolved,
            Entry::Symlink {
                target: target.to_string(),
                mode: 0o777,
                mtime: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn link(&self, existing_path: &str, new_path: &str) -> Result<(), FsError> {
        let mut map = self.entries.write().unwrap();
        let src = Self::canonicalize(&map, existing_path, true, "link")?;
        let dest = normalize_path(new_path);
        let entry = match map.get(&src) {
            Some(e @ Entry::File { .. }) => e.clone(),
            Some(_) => {
                return Err(FsError::InvalidArgument {
                    path: existing_path.to_string(),
                    operation: "link".to_string(),
                });
            }
            None => return Err(FsError::not_found("link", existing_path)),
        };
        if map.contains_key(&dest) {
            return Err(FsError::AlreadyExists {
                path: new_path.to_string(),
                operation: "link".to_string(),
            });
        }
        check_parent(&map, &dest, "link")?;
        map.insert(dest, entry);
        Ok(())
    }

    async fn readlink(&self, path: &str) -> Result<String, FsError> {
        let map = self.entries.read().unwrap();
        let resolved = Self::canonicalize(&map, path, false, "readlink")?;
        match map.get(&resolved) {
            Some(Entry::Symlink { target, .. }) => Ok(target.clone()),
            Some(_) => Err(FsError::InvalidArgument {
                path: path.to_string(),
                operation: "readlink".to_string(),
            }),
            None => Err(FsError::not_found("readlink", path)),
        }
    }

    async fn realpath(&self, path: &str) -> Result<String, FsError> {
        let map = self.entries.read().unwrap();
        let resolved = Self::canonicalize(&map, path, true, "realpath")?;
        if map.contains_key(&resolved) {
            Ok(resolved)
        } else {
            Err(FsError::not_found("realpath", path))
        }
    }

    async fn utimes(&self, path: &str, new_mtime: SystemTime) -> Result<(), FsError> {
        let mut map = self.entries.write().unwrap();
        let resolved = Self::canonicalize(&map, path, true, "utimes")?;
        match map.get_mut(&resolved) {
            Some(Entry::File { mtime, .. })
            | Some(Entry::Directory { mtime, .. })
            | Some(Entry::Symlink { mtime, .. }) => {
                *mtime = new_mtime;
                Ok(())
            }
            None => Err(FsError::not_found("utimes", path)),
        }
    }

    fn resolve_path(&self, base: &str, path: &str) -> String {
        types::resolve(base, path)
    }

    fn get_all_paths(&self) -> Vec<String> {
        let map = self.entries.read().unwrap();
        let mut paths: Vec<String> = map.keys().cloned().collect();
        paths.sort();
        paths
    }

    async fn fork(&self) -> std::sync::Arc<dyn FileSystem> {
        let map = self.entries.read().unwrap().clone();
        std::sync::Arc::new(InMemoryFs { entries: RwLock::new(map) })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_write_and_read() {
        let fs = InMemoryFs::new();
        fs.write_file("/file.txt", b"hello").await.unwrap();
        assert_eq!(fs.read_file("/file.txt").await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_read_missing_is_enoent() {
        let fs = InMemoryFs::new();
        match fs.read_file("/missing").await {
            Err(FsError::NotFound { .. }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_directory_is_eisdir() {
        let fs = InMemoryFs::new();
        fs.mkdir("/dir", &MkdirOptions::default()).await.unwrap();
        assert!(matches!(fs.read_file("/dir").await, Err(FsError::IsDirectory { .. })));
    }

    #[tokio::test]
    async fn test_write_missing_parent_is_enoent() {
        let fs = InMemoryFs::new();
        assert!(matches!(
            fs.write_file("/no/such/file", b"x").await,
            Err(FsError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_append() {
        let fs = InMemoryFs::new();
        fs.append_file("/log", b"a").await.unwrap();
        fs.append_file("/log", b"b").await.unwrap();
        assert_eq!(fs.read_file("/log").await.unwrap(), "ab");
    }

    #[tokio::test]
    async fn test_mkdir_recursive() {
        let fs = InMemoryFs::new();
        fs.mkdir("/a/b/c", &MkdirOptions { recursive: true }).await.unwrap();
        assert!(fs.exists("/a/b/c").await);
        assert!(fs.stat("/a/b").await.unwrap().is_directory);
    }

    #[tokio::test]
    async fn test_mkdir_non_recursive_requires_parent() {
        let fs = InMemoryFs::new();
        assert!(fs.mkdir("/a/b", &MkdirOptions::default()).await.is_err());
        fs.mkdir("/a", &MkdirOptions::default()).await.unwrap();
        fs.mkdir("/a/b", &MkdirOptions::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_mkdir_existing_errors_unless_recursive() {
        let fs = InMemoryFs::new();
        fs.mkdir("/d", &MkdirOptions::default()).await.unwrap();
        assert!(matches!(
            fs.mkdir("/d", &MkdirOptions::default()).await,
            Err(FsError::AlreadyExists { .. })
        ));
        fs.mkdir("/d", &MkdirOptions { recursive: true }).await.unwrap();
    }

    #[tokio::test]
    async fn test_readdir_sorted() {
        let fs = InMemoryFs::new();
        fs.mkdir("/dir", &MkdirOptions::default()).await.unwrap();
        fs.write_file("/dir/b.txt", b"").await.unwrap();
        fs.write_file("/dir/a.txt", b"").await.unwrap();
        fs.mkdir("/dir/sub", &MkdirOptions::default()).await.unwrap();
        assert_eq!(fs.readdir("/dir").await.unwrap(), vec!["a.txt", "b.txt", "sub"]);
    }

    #[tokio::test]
    async fn test_rm_file_and_dir() {
        let fs = InMemoryFs::new();
        fs.write_file("/f", b"x").await.unwrap();
        fs.rm("/f", &RmOptions::default()).await.unwrap();
        assert!(!fs.exists("/f").await);

        fs.mkdir("/d", &MkdirOptions::default()).await.unwrap();
        fs.write_file("/d/inner", b"x").await.unwrap();
        assert!(matches!(
            fs.rm("/d", &RmOptions::default()).await,
            Err(FsError::IsDirectory { .. })
        ));
        fs.rm("/d", &RmOptions { recursive: true, force: false }).await.unwrap();
        assert!(!fs.exists("/d/inner").await);
    }

    #[tokio::test]
    async fn test_rm_force_ignores_missing() {
        let fs = InMemoryFs::new();
        assert!(fs.rm("/nope", &RmOptions { recursive: false, force: true }).await.is_ok());
        assert!(fs.rm("/nope", &RmOptions::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_cp_file_and_into_dir() {
        let fs = InMemoryFs::new();
        fs.write_file("/src.txt", b"data").await.unwrap();
        fs.cp("/src.txt", "/dst.txt", &CpOptions::default()).await.unwrap();
        assert_eq!(fs.read_file("/dst.txt").await.unwrap(), "data");

        fs.mkdir("/dir", &MkdirOptions::default()).await.unwrap();
        fs.cp("/src.txt", "/dir", &CpOptions::default()).await.unwrap();
        assert_eq!(fs.read_file("/dir/src.txt").await.unwrap(), "data");
    }

    #[tokio::test]
    async fn test_cp_recursive() {
        let fs = InMemoryFs::new();
        fs.mkdir("/a/b", &MkdirOptions { recursive: true }).await.unwrap();
        fs.write_file("/a/b/f", b"x").await.unwrap();
        assert!(fs.cp("/a", "/c", &CpOptions::default()).await.is_err());
        fs.cp("/a", "/c", &CpOptions { recursive: true }).await.unwrap();
        assert_eq!(fs.read_file("/c/b/f").await.unwrap(), "x");
        assert_eq!(fs.read_file("/a/b/f").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_mv_renames_subtree() {
        let fs = InMemoryFs::new();
        fs.mkdir("/old/sub", &MkdirOptions { recursive: true }).await.unwrap();
        fs.write_file("/old/sub/f", b"x").await.unwrap();
        fs.mv("/old", "/new").await.unwrap();
        assert!(!fs.exists("/old").await);
        assert_eq!(fs.read_file("/new/sub/f").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_symlink_read_through() {
        let fs = InMemoryFs::new();
        fs.write_file("/real.txt", b"content").await.unwrap();
        fs.symlink("/real.txt", "/link.txt").await.unwrap();
        assert_eq!(fs.read_file("/link.txt").await.unwrap(), "content");
        assert!(fs.stat("/link.txt").await.unwrap().is_file);
        assert!(fs.lstat("/link.txt").await.unwrap().is_symlink);
        assert_eq!(fs.readlink("/link.txt").await.unwrap(), "/real.txt");
    }

    #[tokio::test]
    async fn test_symlink_through_directory() {
        let fs = InMemoryFs::new();
        fs.mkdir("/real", &MkdirOptions::default()).await.unwrap();
        fs.write_file("/real/f", b"deep").await.unwrap();
        fs.symlink("/real", "/alias").await.unwrap();
        assert_eq!(fs.read_file("/alias/f").await.unwrap(), "deep");
    }

    #[tokio::test]
    async fn test_relative_symlink() {
        let fs = InMemoryFs::new();
        fs.mkdir("/d", &MkdirOptions::default()).await.unwrap();
        fs.write_file("/d/target", b"t").await.unwrap();
        fs.symlink("target", "/d/link").await.unwrap();
        assert_eq!(fs.read_file("/d/link").await.unwrap(), "t");
    }

    #[tokio::test]
    async fn test_symlink_loop_is_eloop() {
        let fs = InMemoryFs::new();
        fs.symlink("/b", "/a").await.unwrap();
        fs.symlink("/a", "/b").await.unwrap();
        assert!(matches!(fs.read_file("/a").await, Err(FsError::SymlinkLoop { .. })));
    }

    #[tokio::test]
    async fn test_realpath() {
        let fs = InMemoryFs::new();
        fs.mkdir("/real", &MkdirOptions::default()).await.unwrap();
        fs.symlink("/real", "/alias").await.unwrap();
        assert_eq!(fs.realpath("/alias").await.unwrap(), "/real");
        assert!(fs.realpath("/missing").await.is_err());
    }

    #[tokio::test]
    async fn test_lazy_content_materialized_once() {
        let fs = InMemoryFs::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let provider: ContentProvider = Arc::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            b"lazy bytes".to_vec()
        });
        fs.add_initial_file("/lazy.txt", FileContent::Lazy(provider).into());

        // Size is unknown before the first read
        assert_eq!(fs.stat("/lazy.txt").await.unwrap().size, 0);
        assert_eq!(fs.read_file("/lazy.txt").await.unwrap(), "lazy bytes");
        assert_eq!(fs.read_file("/lazy.txt").await.unwrap(), "lazy bytes");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fs.stat("/lazy.txt").await.unwrap().size, 10);
    }

    #[tokio::test]
    async fn test_add_initial_files_creates_parents() {
        let fs = InMemoryFs::new();
        let mut files = InitialFiles::new();
        files.insert("/deep/nested/file.txt".to_string(), "content".into());
        fs.add_initial_files(files);
        assert!(fs.stat("/deep/nested").await.unwrap().is_directory);
        assert_eq!(fs.read_file("/deep/nested/file.txt").await.unwrap(), "content");
    }

    #[tokio::test]
    async fn test_chmod() {
        let fs = InMemoryFs::new();
        fs.write_file("/f", b"").await.unwrap();
        fs.chmod("/f", 0o755).await.unwrap();
        assert_eq!(fs.stat("/f").await.unwrap().mode, 0o755);
    }

    #[tokio::test]
    async fn test_hard_link_copies_content() {
        let fs = InMemoryFs::new();
        fs.write_file("/orig", b"x").await.unwrap();
        fs.link("/orig", "/hard").await.unwrap();
        assert_eq!(fs.read_file("/hard").await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_get_all_paths() {
        let fs = InMemoryFs::new();
        fs.mkdir("/b", &MkdirOptions::default()).await.unwrap();
        fs.write_file("/a.txt", b"").await.unwrap();
        let paths = fs.get_all_paths();
        assert_eq!(paths, vec!["/", "/a.txt", "/b"]);
    }

    #[tokio::test]
    async fn test_fork_isolates_mutations() {
        let fs = InMemoryFs::new();
        fs.write_file("/shared", b"x").await.unwrap();

        let fork = fs.fork().await;
        assert_eq!(fork.read_file("/shared").await.unwrap(), "x");

        fork.write_file("/fork-only", b"y").await.unwrap();
        fork.write_file("/shared", b"changed").await.unwrap();

        assert!(!fs.exists("/fork-only").await);
        assert_eq!(fs.read_file("/shared").await.unwrap(), "x");
    }
}
