//! Recursive ownership and mode normalization.

use std::fs::{self, Permissions};
use std::io;
use std::os::unix::fs::{lchown, PermissionsExt};
use std::path::{Path, PathBuf};

/// Target state for every entry in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSpec {
    pub mode: u32,
    pub owner_uid: Option<u32>,
    pub owner_gid: Option<u32>,
}

impl PermissionSpec {
    fn changes_owner(&self) -> bool {
        self.owner_uid.is_some() || self.owner_gid.is_some()
    }
}

/// What a normalization pass touched.
#[derive(Debug, Default)]
pub struct NormalizeReport {
    /// Entries visited.
    pub entries: usize,
    /// Entries that could not be read or updated.
    pub failures: Vec<(PathBuf, io::Error)>,
}

impl NormalizeReport {
    fn fail(&mut self, path: &Path, error: io::Error) {
        tracing::debug!(path = %path.display(), error = %error, "Permission update failed");
        self.failures.push((path.to_path_buf(), error));
    }
}

/// Apply `spec` to `root` and everything beneath it.
///
/// Symbolic links are never followed; only their ownership is changed.
/// Failures are collected and the walk continues.
pub fn normalize_tree(root: &Path, spec: &PermissionSpec) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    visit(root, spec, &mut report);
    report
}

fn visit(path: &Path, spec: &PermissionSpec, report: &mut NormalizeReport) {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) => return report.fail(path, e),
    };
    report.entries += 1;

    if spec.changes_owner() {
        if let Err(e) = lchown(path, spec.owner_uid, spec.owner_gid) {
            report.fail(path, e);
        }
    }

    if meta.file_type().is_symlink() {
        return;
    }

    // Directories get their mode first so a restrictive tree becomes readable.
    if let Err(e) = fs::set_permissions(path, Permissions::from_mode(spec.mode)) {
        report.fail(path, e);
    }

    if meta.is_dir() {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => return report.fail(path, e),
        };
        for entry in entries {
            match entry {
                Ok(entry) => visit(&entry.path(), spec, report),
                Err(e) => report.fail(path, e),
            }
        }
    }
}
