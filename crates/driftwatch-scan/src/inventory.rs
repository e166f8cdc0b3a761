//! Inventory snapshot of local checkouts (`repos.json`).

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Local};
use driftwatch_core::{normalize_remote_url, DriftError, RepositoryRef};
use serde::Serialize;

use crate::local;

/// A checkout listed in the inventory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    /// Directory name of the checkout.
    pub name: String,
    /// Remote URL, normalized to `https://github.com/owner/repo` when possible.
    pub url: String,
    /// Free-form description; always empty when produced by the scanner.
    pub description: String,
    /// `HEAD` commit time (RFC 3339).
    pub last_updated: String,
}

/// Snapshot bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMetadata {
    /// Number of entries in the snapshot.
    pub total_count: usize,
    /// When the scan ran (RFC 3339).
    pub last_scanned: String,
}

/// The full `repos.json` document.
///
/// # Examples
///
/// ```
/// use chrono::Local;
/// use driftwatch_scan::inventory::build_inventory;
///
/// let inventory = build_inventory(&[], Local::now());
/// assert_eq!(inventory.metadata.total_count, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    /// Listed checkouts.
    pub repositories: Vec<InventoryEntry>,
    /// Snapshot bookkeeping.
    pub metadata: InventoryMetadata,
}

/// Build an inventory from scanned checkouts.
///
/// Checkouts without a remote or without commits are left out.
pub fn build_inventory(repos: &[RepositoryRef], scanned_at: DateTime<Local>) -> Inventory {
    let mut repositories = Vec::new();
    for repo in repos {
        let Some(remote) = repo.remote_url.as_deref() else {
            tracing::debug!(repo = %repo.name, "skipping (no remote URL)");
            continue;
        };
        let last_updated = match local::head_commit_time(&repo.path) {
            Ok(Some(time)) => time.to_rfc3339(),
            Ok(None) => {
                tracing::debug!(repo = %repo.name, "skipping (no commits)");
                continue;
            }
            Err(e) => {
                tracing::warn!(repo = %repo.name, error = %e, "skipping");
                continue;
            }
        };
        repositories.push(InventoryEntry {
            name: repo.name.clone(),
            url: normalize_remote_url(remote),
            description: String::new(),
            last_updated,
        });
    }

    Inventory {
        metadata: InventoryMetadata {
            total_count: repositories.len(),
            last_scanned: scanned_at.to_rfc3339(),
        },
        repositories,
    }
}

impl Inventory {
    /// Write the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Serialization`] or [`DriftError::Io`] on failure.
    pub fn write(&self, path: &Path) -> Result<(), DriftError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<30} {:<50} {}", "Name", "URL", "Last Updated")?;
        writeln!(f, "{:-<94}", "")?;
        for entry in self.repositories.iter().take(10) {
            let date = entry.last_updated.get(..10).unwrap_or(&entry.last_updated);
            writeln!(f, "{:<30} {:<50} {date}", entry.name, entry.url)?;
        }
        if self.repositories.len() > 10 {
            writeln!(
                f,
                "{:<30} and {} more",
                "...",
                self.repositories.len() - 10
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use git2::Repository;

    fn make_checkout(root: &Path, name: &str, remote: Option<&str>, commit: bool) -> RepositoryRef {
        let path = root.join(name);
        let repo = Repository::init(&path).unwrap();
        if let Some(url) = remote {
            repo.remote("origin", url).unwrap();
        }
        if commit {
            let sig = git2::Signature::new("T", "t@example.com", &git2::Time::new(1_700_000_000, 0))
                .unwrap();
            let tree_id = repo.index().unwrap().write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        local::read_repository(&path).unwrap()
    }

    fn scanned_at() -> DateTime<Local> {
        Local.timestamp_opt(1_700_100_000, 0).unwrap()
    }

    #[test]
    fn lists_checkouts_with_normalized_urls() {
        let dir = tempfile::tempdir().unwrap();
        let repos = vec![
            make_checkout(dir.path(), "widgets", Some("git@github.com:acme/widgets.git"), true),
            make_checkout(dir.path(), "no-remote", None, true),
            make_checkout(dir.path(), "empty", Some("https://github.com/acme/empty"), false),
        ];

        let inventory = build_inventory(&repos, scanned_at());
        assert_eq!(inventory.metadata.total_count, 1);
        let entry = &inventory.repositories[0];
        assert_eq!(entry.name, "widgets");
        assert_eq!(entry.url, "https://github.com/acme/widgets");
        assert!(entry.description.is_empty());
        assert!(entry.last_updated.starts_with("2023-11-14T22:13:20"));
    }

    #[test]
    fn writes_camel_case_json() {
        let dir = tempfile::tempdir().unwrap();
        let repos = vec![make_checkout(
            dir.path(),
            "widgets",
            Some("https://github.com/acme/widgets"),
            true,
        )];
        let inventory = build_inventory(&repos, scanned_at());

        let out = dir.path().join("repos.json");
        inventory.write(&out).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(json["metadata"]["totalCount"], 1);
        assert!(json["metadata"]["lastScanned"].is_string());
        assert!(json["repositories"][0]["lastUpdated"].is_string());
    }

    #[test]
    fn display_truncates_long_lists() {
        let entry = InventoryEntry {
            name: "r".into(),
            url: "https://github.com/a/r".into(),
            description: String::new(),
            last_updated: "2024-01-02T03:04:05+00:00".into(),
        };
        let inventory = Inventory {
            repositories: vec![entry; 12],
            metadata: InventoryMetadata {
                total_count: 12,
                last_scanned: "2024-01-03T00:00:00+00:00".into(),
            },
        };
        let text = inventory.to_string();
        assert!(text.contains("2024-01-02"));
        assert!(!text.contains("03:04:05"));
        assert!(text.contains("and 2 more"));
    }
}
