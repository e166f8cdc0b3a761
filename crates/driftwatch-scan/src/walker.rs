use std::path::{Path, PathBuf};

use driftwatch_core::DriftError;

/// Find git checkouts under `root`, at most `max_depth` directories deep.
///
/// Hidden directories are skipped, and the walk does not descend into a
/// checkout once found. Each candidate is validated by opening it with
/// `git2`. Results are sorted by case-insensitive directory name.
///
/// # Errors
///
/// Returns [`DriftError::FileNotFound`] if `root` is not a directory.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use driftwatch_scan::walker::discover_repositories;
///
/// let repos = discover_repositories(Path::new("."), 3).unwrap();
/// for path in &repos {
///     println!("{}", path.display());
/// }
/// ```
pub fn discover_repositories(root: &Path, max_depth: usize) -> Result<Vec<PathBuf>, DriftError> {
    if !root.is_dir() {
        return Err(DriftError::FileNotFound(root.to_path_buf()));
    }

    let walker = ignore::WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(true)
        .follow_links(false)
        .max_depth(Some(max_depth))
        .filter_entry(|entry| entry.depth() == 0 || !parent_is_checkout(entry.path()))
        .build();

    let mut repos = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(error = %e, "unreadable directory entry");
                continue;
            }
        };

        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if !is_dir || !is_checkout(entry.path()) {
            continue;
        }

        let path = entry.into_path();
        match git2::Repository::open(&path) {
            Ok(_) => repos.push(path),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "not a valid git repository");
            }
        }
    }

    repos.sort_by_key(|p| sort_key(p));
    Ok(repos)
}

fn is_checkout(dir: &Path) -> bool {
    dir.join(".git").exists()
}

fn parent_is_checkout(path: &Path) -> bool {
    path.parent().is_some_and(is_checkout)
}

fn sort_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn init_repo(path: &Path) {
        fs::create_dir_all(path).unwrap();
        git2::Repository::init(path).unwrap();
    }

    #[test]
    fn finds_repositories_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        init_repo(&root.join("Zeta"));
        init_repo(&root.join("alpha"));
        init_repo(&root.join("group/beta"));
        fs::create_dir_all(root.join("not-a-repo/src")).unwrap();

        let repos = discover_repositories(root, 3).unwrap();
        let names: Vec<String> = repos.iter().map(|p| sort_key(p)).collect();
        assert_eq!(names, vec!["alpha", "beta", "zeta"]);
    }

    #[test]
    fn respects_max_depth() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        init_repo(&root.join("a/b/c/deep"));
        init_repo(&root.join("shallow"));

        let repos = discover_repositories(root, 2).unwrap();
        assert_eq!(repos.len(), 1);
        assert!(repos[0].ends_with("shallow"));

        let repos = discover_repositories(root, 4).unwrap();
        assert_eq!(repos.len(), 2);
    }

    #[test]
    fn does_not_descend_into_checkouts() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        init_repo(&root.join("outer"));
        init_repo(&root.join("outer/vendor/inner"));

        let repos = discover_repositories(root, 5).unwrap();
        assert_eq!(repos.len(), 1);
        assert!(repos[0].ends_with("outer"));
    }

    #[test]
    fn skips_hidden_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        init_repo(&root.join(".cache/tool"));
        init_repo(&root.join("visible"));

        let repos = discover_repositories(root, 3).unwrap();
        assert_eq!(repos.len(), 1);
        assert!(repos[0].ends_with("visible"));
    }

    #[test]
    fn skips_fake_git_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("broken/.git")).unwrap();
        init_repo(&root.join("real"));

        let repos = discover_repositories(root, 3).unwrap();
        assert_eq!(repos.len(), 1);
        assert!(repos[0].ends_with("real"));
    }

    #[test]
    fn root_itself_can_be_a_checkout() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());

        let repos = discover_repositories(dir.path(), 3).unwrap();
        assert_eq!(repos.len(), 1);
    }

    #[test]
    fn missing_root_is_an_error() {
        let result = discover_repositories(Path::new("/definitely/not/here"), 3);
        assert!(matches!(result, Err(DriftError::FileNotFound(_))));
    }
}
