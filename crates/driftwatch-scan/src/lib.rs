//! Local repository discovery and git state.
//!
//! Walks a directory tree for git checkouts with the `ignore` crate, reads
//! each checkout's `HEAD` and remote via `git2`, and builds the inventory
//! snapshot written by `driftwatch inventory`.

pub mod inventory;
pub mod local;
pub mod walker;

use std::path::Path;

use driftwatch_core::{DriftError, RepositoryRef};

/// Discover repositories under `root` and read their local state.
///
/// `root` is canonicalized first, so every returned path is absolute even when
/// `root` is relative. Checkouts whose state cannot be read are logged and
/// skipped. The result is ordered by case-insensitive directory name.
///
/// # Errors
///
/// Returns [`DriftError::FileNotFound`] if `root` is not a directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use driftwatch_scan::scan_repositories;
///
/// let repos = scan_repositories(Path::new("/home/me/src"), 3).unwrap();
/// for r in &repos {
///     println!("{} -> {:?}", r.name, r.remote_url);
/// }
/// ```
pub fn scan_repositories(root: &Path, max_depth: usize) -> Result<Vec<RepositoryRef>, DriftError> {
    let root = root.canonicalize().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DriftError::FileNotFound(root.to_path_buf()),
        _ => DriftError::Io(e),
    })?;
    let paths = walker::discover_repositories(&root, max_depth)?;
    let mut repos = Vec::with_capacity(paths.len());
    for path in &paths {
        match local::read_repository(path) {
            Ok(repo) => repos.push(repo),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping repository"),
        }
    }
    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_checkout(path: &Path) {
        std::fs::create_dir_all(path).unwrap();
        git2::Repository::init(path).unwrap();
    }

    #[test]
    fn relative_root_yields_absolute_paths() {
        let dir = tempfile::Builder::new()
            .prefix("scan-root")
            .tempdir_in(".")
            .unwrap();
        init_checkout(&dir.path().join("alpha"));
        init_checkout(&dir.path().join("beta"));

        let relative = Path::new(dir.path().file_name().unwrap());
        assert!(relative.is_relative());

        let repos = scan_repositories(relative, 3).unwrap();
        let root = dir.path().canonicalize().unwrap();
        let paths: Vec<_> = repos.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec![root.join("alpha"), root.join("beta")]);
        assert!(paths.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn missing_root_is_reported() {
        let result = scan_repositories(Path::new("/definitely/not/here"), 3);
        assert!(matches!(result, Err(DriftError::FileNotFound(_))));
    }
}
