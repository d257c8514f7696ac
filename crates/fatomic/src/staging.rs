use crate::error::{FatomicError, Result};
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory the staging file goes in: the target's own directory, so the
/// final rename never crosses a filesystem.
pub(crate) fn parent_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Longest file name most filesystems accept, in bytes.
const MAX_NAME_LEN: usize = 255;

/// Staging path for `target`: `.{basename}.{uuid}{suffix}` next to it.
/// The basename part is shortened so the whole name fits in `MAX_NAME_LEN`.
pub(crate) fn staging_path(target: &Path, suffix: &str) -> Result<PathBuf> {
    let base = target
        .file_name()
        .ok_or_else(|| FatomicError::InvalidTarget(target.to_path_buf()))?
        .to_string_lossy();
    let id = Uuid::new_v4().simple().to_string();
    let budget = MAX_NAME_LEN.saturating_sub(2 + id.len() + suffix.len());
    let name = format!(".{}.{}{}", truncate_on_char(&base, budget), id, suffix);
    Ok(parent_dir(target).join(name))
}

fn truncate_on_char(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Create a fresh staging file for `target`.
///
/// `create_new` guarantees no other session holds the same file. When
/// `preserve_permissions` is set and the target exists, the staging file gets
/// the target's permissions.
pub(crate) fn create(
    target: &Path,
    suffix: &str,
    preserve_permissions: bool,
) -> Result<(PathBuf, File)> {
    let path = staging_path(target, suffix)?;
    let stage_err = |source: io::Error| FatomicError::Stage {
        path: target.to_path_buf(),
        source,
    };

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(stage_err)?;

    if preserve_permissions {
        match fs::metadata(target) {
            Ok(meta) if meta.is_file() => {
                if let Err(err) = file.set_permissions(meta.permissions()) {
                    drop(file);
                    remove(&path);
                    return Err(stage_err(err));
                }
            }
            _ => {}
        }
    }

    Ok((path, file))
}

/// Best-effort removal of a staging file.
pub(crate) fn remove(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            tracing::warn!(
                staging = %path.display(),
                error = %err,
                "failed to remove staging file"
            );
        }
    }
}
