//! Virtual file system.

pub mod in_memory_fs;
pub mod types;

pub use in_memory_fs::InMemoryFs;
pub use types::{
    basename, dirname, normalize_path, CpOptions, DirentEntry, FileContent, FileInit,
    FileSystem, FsError, FsStat, InitialFiles, MkdirOptions, RmOptions,
};
