//! Which paths a walk visits.
//!
//! Directories are pruned by three rules: system directories, development
//! artifact directories, and (optionally) hidden names. The rules apply
//! below the base path only; naming a skipped directory as the base walks
//! it anyway.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Virtual, volatile or cache trees that never hold user files.
pub const SYSTEM_SKIP_DIRS: &[&str] = &[
    "/proc",
    "/sys",
    "/run",
    "/dev",
    "/tmp",
    "/var/tmp",
    "/var/cache",
    "/var/run",
    "/var/lock",
    "/lost+found",
    "/.snapshots",
];

/// Directory names of version control, caches and virtualenvs.
pub const DEV_SKIP_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    ".venv",
    "venv",
    ".env",
    ".idea",
    ".vscode",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipPolicy {
    /// Skip files and directories whose name starts with `.`
    pub skip_hidden: bool,
}

impl SkipPolicy {
    pub fn new(skip_hidden: bool) -> Self {
        Self { skip_hidden }
    }

    /// Whether the walk rooted at `base` should prune directory `dir`.
    pub fn should_skip_dir(&self, dir: &Path, base: &Path) -> bool {
        if self.skip_hidden && is_hidden(dir) {
            return true;
        }

        let name = dir.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if DEV_SKIP_DIRS.contains(&name) {
            return true;
        }

        SYSTEM_SKIP_DIRS
            .iter()
            .any(|sys| dir.starts_with(sys) && !base.starts_with(sys))
    }

    pub fn should_skip_file(&self, file: &Path) -> bool {
        self.skip_hidden && is_hidden(file)
    }

    fn skips_entry(&self, entry: &DirEntry, base: &Path) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        if entry.file_type().is_dir() {
            self.should_skip_dir(entry.path(), base)
        } else {
            self.should_skip_file(entry.path())
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Every non-directory path under `base` that `policy` lets through.
///
/// Symlinks are reported, not followed. Traversal failures (an unreadable
/// directory, a vanished entry) come back as `Err` items and do not end
/// the walk.
pub fn walk<'a>(
    base: &'a Path,
    policy: &'a SkipPolicy,
) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> + 'a {
    WalkDir::new(base)
        .follow_links(false)
        .into_iter()
        .filter_entry(move |entry| !policy.skips_entry(entry, base))
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_dir() => None,
            Ok(entry) => Some(Ok(entry.into_path())),
            Err(err) => Some(Err(err)),
        })
}

/// File count and readable byte total of a set of base paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanTotals {
    pub files: u64,
    pub bytes: u64,
}

/// Count what a walk over `paths` would visit, for progress display.
pub fn scan_paths(paths: &[PathBuf], policy: &SkipPolicy) -> ScanTotals {
    let mut totals = ScanTotals::default();
    for base in paths {
        if base.is_file() {
            totals.files += 1;
            totals.bytes += fs::metadata(base).map(|m| m.len()).unwrap_or(0);
            continue;
        }
        for path in walk(base, policy).flatten() {
            totals.files += 1;
            if let Ok(meta) = fs::metadata(&path) {
                totals.bytes += meta.len();
            }
        }
    }
    totals
}
