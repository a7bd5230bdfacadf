//! Recursive directory sizing.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Subtrees that report bogus sizes or block reads; never descended into.
const VIRTUAL_PREFIXES: &[&str] = &["/proc", "/sys", "/dev"];

fn is_virtual(path: &Path) -> bool {
    VIRTUAL_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Total byte size of every regular file under `path`, without following
/// symlinks. Unreadable subtrees are skipped and reported as warnings, so the
/// returned total may be an underestimate. A missing root is an error; the
/// caller records the unavailable sentinel for it.
pub fn dir_size(path: &Path) -> Result<(u64, Vec<String>)> {
    if is_virtual(path) {
        return Ok((0, Vec::new()));
    }

    if !path.exists() {
        return Err(Error::PathAccess {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
        });
    }

    let mut total = 0u64;
    let mut warnings = Vec::new();

    let walker = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_virtual(e.path()));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    if let Ok(metadata) = entry.metadata() {
                        total = total.saturating_add(metadata.len());
                    }
                }
            }
            Err(e) => {
                let denied = e
                    .io_error()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::PermissionDenied)
                    .unwrap_or(false);
                if denied {
                    let at = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "unknown path".to_string());
                    warnings.push(format!("permission denied: {at} (size may be underestimated)"));
                }
            }
        }
    }

    Ok((total, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn sums_nested_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.log"), vec![0u8; 100]).unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/b.log"), vec![0u8; 80]).unwrap();

        let (total, warnings) = dir_size(tmp.path()).unwrap();
        assert_eq!(total, 180);
        assert!(warnings.is_empty());
    }

    #[test]
    fn empty_directory_is_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let (total, _) = dir_size(tmp.path()).unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn missing_directory_is_path_access_error() {
        let err = dir_size(Path::new("/no/such/dir/anywhere")).unwrap_err();
        assert!(matches!(err, Error::PathAccess { .. }));
    }

    #[test]
    fn virtual_filesystems_read_as_zero() {
        let (total, _) = dir_size(Path::new("/proc")).unwrap();
        assert_eq!(total, 0);
    }
}
