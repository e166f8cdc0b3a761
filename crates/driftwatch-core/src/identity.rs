use crate::error::DriftError;
use crate::types::HostIdentity;

/// Domain that marks a remote URL as hosted on GitHub.
pub const HOST_MARKER: &str = "github.com";

/// Extract the owner/repository pair from a configured remote URL.
///
/// Accepts SSH (`git@github.com:owner/repo.git`), HTTPS, `ssh://` (with an
/// optional port) and `git://` forms. A trailing `.git` is optional. Only the
/// first two path segments after the host are used.
///
/// # Errors
///
/// Returns [`DriftError::NotAHostedRepo`] if the URL does not point at GitHub
/// or lacks an owner or repository segment.
///
/// # Examples
///
/// ```
/// use driftwatch_core::resolve;
///
/// let id = resolve("git@github.com:acme/widgets.git").unwrap();
/// assert_eq!(id.owner(), "acme");
/// assert_eq!(id.repo(), "widgets");
///
/// assert!(resolve("https://gitlab.example.com/acme/widgets").is_err());
/// ```
pub fn resolve(remote_url: &str) -> Result<HostIdentity, DriftError> {
    let not_hosted = || DriftError::NotAHostedRepo {
        url: remote_url.to_string(),
    };

    let path = after_host_marker(remote_url.trim()).ok_or_else(not_hosted)?;
    let path = path.split(['?', '#']).next().unwrap_or(path);

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(not_hosted)?;
    let repo = segments.next().ok_or_else(not_hosted)?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);

    HostIdentity::new(owner, repo).ok_or_else(not_hosted)
}

/// Canonical `https://github.com/owner/repo` form of a remote URL.
///
/// Non-GitHub URLs are returned with any trailing `/` and `.git` removed.
///
/// # Examples
///
/// ```
/// use driftwatch_core::normalize_remote_url;
///
/// assert_eq!(
///     normalize_remote_url("git@github.com:acme/widgets.git"),
///     "https://github.com/acme/widgets"
/// );
/// assert_eq!(
///     normalize_remote_url("https://gitlab.example.com/acme/widgets.git"),
///     "https://gitlab.example.com/acme/widgets"
/// );
/// ```
pub fn normalize_remote_url(remote_url: &str) -> String {
    match resolve(remote_url) {
        Ok(id) => format!("https://{HOST_MARKER}/{}/{}", id.owner(), id.repo()),
        Err(_) => {
            let trimmed = remote_url.trim().trim_end_matches('/');
            trimmed.strip_suffix(".git").unwrap_or(trimmed).to_string()
        }
    }
}

/// Return the part of `url` after `github.com:` or `github.com/`.
///
/// The marker must start the string or follow `@` or `/`, so hosts such as
/// `notgithub.com` are not matched. A numeric port is only skipped for
/// `scheme://` URLs; in SCP-style remotes the text after `:` is the owner.
fn after_host_marker(url: &str) -> Option<&str> {
    let bytes = url.as_bytes();
    let mut from = 0;
    while let Some(found) = url[from..].find(HOST_MARKER) {
        let start = from + found;
        let end = start + HOST_MARKER.len();
        let at_boundary = start == 0 || matches!(bytes[start - 1], b'@' | b'/');
        if at_boundary {
            match bytes.get(end) {
                Some(b'/') => return Some(&url[end + 1..]),
                Some(b':') if url[..start].contains("://") => {
                    return Some(skip_port(&url[end + 1..]));
                }
                Some(b':') => return Some(&url[end + 1..]),
                _ => {}
            }
        }
        from = end;
    }
    None
}

fn skip_port(rest: &str) -> &str {
    match rest.split_once('/') {
        Some((port, path)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => path,
        _ => rest,
    }
}
