//! Workspace boundary enforcement for attachment paths.
//!
//! Attachment paths must stay strictly inside the envelope's workspace root.
//! The raw path is screened for traversal sequences and absolute prefixes
//! first, then resolved lexically against the root, and finally (when the
//! target already exists on disk) canonicalized so a symbolic link cannot
//! smuggle the resolved path outside the workspace.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Why a path failed the boundary check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryViolation {
    /// The raw path contains a traversal sequence or an absolute prefix.
    Traversal { reason: &'static str },
    /// The resolved path does not sit under the workspace root.
    OutsideWorkspace { resolved: PathBuf },
    /// Following a symbolic link left the workspace root.
    SymlinkEscape { resolved: PathBuf },
}

impl fmt::Display for BoundaryViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Traversal { reason } => write!(f, "path traversal attempt: {reason}"),
            Self::OutsideWorkspace { resolved } => {
                write!(f, "path escapes workspace: {}", resolved.display())
            }
            Self::SymlinkEscape { resolved } => {
                write!(f, "symlink escapes workspace: {}", resolved.display())
            }
        }
    }
}

/// Screen a raw attachment path before any resolution happens.
///
/// Backslashes are treated as separators so Windows-style paths get the same
/// scrutiny. Returns the reason the path is rejected, or `None` when it is a
/// plain relative path.
pub fn traversal_reason(raw: &str) -> Option<&'static str> {
    let normalized = raw.replace('\\', "/");
    if normalized.split('/').any(|part| part == "..") {
        return Some("parent directory traversal");
    }
    if normalized.starts_with('/') {
        return Some("absolute path");
    }
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Some("absolute drive path");
    }
    None
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Join `raw` onto `base` lexically, resolving dot components as it goes.
pub fn lexical_resolve(base: &Path, raw: &str) -> PathBuf {
    let mut out = normalize(base);
    for part in raw.replace('\\', "/").split('/') {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Check one attachment path against the workspace root.
///
/// On success returns the resolved path under the root. The filesystem is
/// consulted only when the resolved path already exists, to catch symlinks
/// pointing outside the workspace.
pub fn check_path(workspace_root: &Path, raw: &str) -> Result<PathBuf, BoundaryViolation> {
    if let Some(reason) = traversal_reason(raw) {
        return Err(BoundaryViolation::Traversal { reason });
    }

    let root = normalize(workspace_root);
    let candidate = lexical_resolve(workspace_root, raw);
    if !candidate.starts_with(&root) {
        return Err(BoundaryViolation::OutsideWorkspace { resolved: candidate });
    }

    if candidate.exists() {
        let canonical_root = workspace_root
            .canonicalize()
            .unwrap_or_else(|_| root.clone());
        if let Ok(canonical) = candidate.canonicalize() {
            if !canonical.starts_with(&canonical_root) {
                return Err(BoundaryViolation::SymlinkEscape { resolved: canonical });
            }
        }
    }

    Ok(candidate)
}
