use driftwatch_core::{DivergenceReport, DriftError, HostIdentity};

use crate::github::HostingApi;

/// Compare `local_head` against the head of the upstream default branch.
///
/// Matching heads short-circuit without a compare call. A compare reporting
/// no upstream commits (the local checkout is ahead or has diverged) is
/// treated as up to date. Duplicate file paths are collapsed, keeping the
/// first occurrence.
///
/// # Errors
///
/// Propagates any hosting failure; no partial report is produced.
pub async fn detect<H: HostingApi + ?Sized>(
    api: &H,
    identity: &HostIdentity,
    local_head: &str,
) -> Result<DivergenceReport, DriftError> {
    let branch = api.default_branch(identity).await?;
    let remote_head = api.branch_head(identity, &branch).await?;

    if remote_head.eq_ignore_ascii_case(local_head) {
        return Ok(DivergenceReport::up_to_date(local_head, remote_head));
    }

    let comparison = api.compare(identity, local_head, &remote_head).await?;
    if comparison.ahead_by == 0 {
        tracing::debug!(
            repo = %identity,
            local = local_head,
            remote = %remote_head,
            "local head is not behind upstream"
        );
        return Ok(DivergenceReport::up_to_date(local_head, remote_head));
    }

    let mut changed_files: Vec<String> = Vec::with_capacity(comparison.changed_files.len());
    for file in comparison.changed_files {
        if !changed_files.contains(&file) {
            changed_files.push(file);
        }
    }

    Ok(DivergenceReport {
        local_head: local_head.to_string(),
        remote_head,
        ahead_by: comparison.ahead_by,
        commit_messages: comparison.commit_messages,
        changed_files,
    })
}
