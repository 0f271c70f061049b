//! Application working-tree operations.
//!
//! # Responsibilities
//! - Read and update the environment file (env_file.rs)
//! - Materialize the environment file from its template
//! - Create runtime-writable directories
//! - Normalize ownership and modes (permissions.rs)
//!
//! # Design Decisions
//! - Plain functions over explicit paths; callers own tolerance decisions
//! - Nothing here logs above debug; the sequencer reports outcomes

pub mod env_file;
pub mod permissions;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use permissions::{normalize_tree, NormalizeReport, PermissionSpec};

/// Copy `template` to `target` byte-for-byte.
pub fn copy_template(template: &Path, target: &Path) -> io::Result<u64> {
    fs::copy(template, target)
}

/// Create every directory in `dirs`, returning the ones that failed.
pub fn ensure_dirs(dirs: &[PathBuf]) -> Vec<(PathBuf, io::Error)> {
    dirs.iter()
        .filter_map(|dir| fs::create_dir_all(dir).err().map(|e| (dir.clone(), e)))
        .collect()
}

/// Whether anything, including a dangling symlink, exists at `path`.
pub fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
