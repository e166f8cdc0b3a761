//! Read-only access to a checkout's local git state via git2.

use std::path::Path;

use chrono::{DateTime, FixedOffset};
use driftwatch_core::{DriftError, RepositoryRef};
use git2::Repository;

/// Read a checkout's name, remote URL, and `HEAD` commit.
///
/// The remote is `origin` when present, otherwise the first configured
/// remote. A checkout without commits yields `local_head: None`.
///
/// # Errors
///
/// Returns [`DriftError::Git`] if the repository cannot be opened or its
/// remotes cannot be listed.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use driftwatch_scan::local::read_repository;
///
/// let repo = read_repository(Path::new(".")).unwrap();
/// println!("{} @ {:?}", repo.name, repo.local_head);
/// ```
pub fn read_repository(path: &Path) -> Result<RepositoryRef, DriftError> {
    let repo = open(path)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let local_head = repo
        .head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok())
        .map(|commit| commit.id().to_string());

    Ok(RepositoryRef {
        name,
        path: path.to_path_buf(),
        remote_url: remote_url(&repo)?,
        local_head,
    })
}

/// Commit time of `HEAD`, in the committer's own offset.
///
/// Returns `Ok(None)` for a checkout without commits.
///
/// # Errors
///
/// Returns [`DriftError::Git`] if the repository cannot be opened.
pub fn head_commit_time(path: &Path) -> Result<Option<DateTime<FixedOffset>>, DriftError> {
    let repo = open(path)?;
    let Some(commit) = repo.head().ok().and_then(|h| h.peel_to_commit().ok()) else {
        return Ok(None);
    };

    let time = commit.time();
    let Some(offset) = FixedOffset::east_opt(time.offset_minutes() * 60) else {
        return Ok(None);
    };
    Ok(DateTime::from_timestamp(time.seconds(), 0).map(|utc| utc.with_timezone(&offset)))
}

fn open(path: &Path) -> Result<Repository, DriftError> {
    Repository::open(path).map_err(|e| {
        DriftError::Git(format!(
            "failed to open repository {}: {e}",
            path.display()
        ))
    })
}

fn remote_url(repo: &Repository) -> Result<Option<String>, DriftError> {
    let remotes = repo
        .remotes()
        .map_err(|e| DriftError::Git(format!("failed to list remotes: {e}")))?;

    let names: Vec<&str> = remotes.iter().flatten().collect();
    let chosen = if names.contains(&"origin") {
        Some("origin")
    } else {
        names.first().copied()
    };
    let Some(name) = chosen else {
        return Ok(None);
    };

    let remote = repo
        .find_remote(name)
        .map_err(|e| DriftError::Git(format!("failed to read remote '{name}': {e}")))?;
    Ok(remote.url().map(str::to_string))
}
