use async_trait::async_trait;
use driftwatch_core::{DriftError, HostIdentity};
use serde::Deserialize;

/// Commits and files separating a base commit from a head commit.
///
/// # Examples
///
/// ```
/// use driftwatch_analyze::github::Comparison;
///
/// let cmp = Comparison {
///     ahead_by: 1,
///     commit_messages: vec!["fix: typo".into()],
///     changed_files: vec!["README.md".into()],
/// };
/// assert_eq!(cmp.ahead_by, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Commits reachable from head but not from base.
    pub ahead_by: u64,
    /// Commit messages, most recent first.
    pub commit_messages: Vec<String>,
    /// Changed file paths.
    pub changed_files: Vec<String>,
}

/// Read-only hosting provider operations used by the divergence detector.
#[async_trait]
pub trait HostingApi: Send + Sync {
    /// Name of the repository's default branch.
    async fn default_branch(&self, id: &HostIdentity) -> Result<String, DriftError>;

    /// Head commit of `branch`.
    async fn branch_head(&self, id: &HostIdentity, branch: &str) -> Result<String, DriftError>;

    /// Compare `base` to `head`.
    async fn compare(
        &self,
        id: &HostIdentity,
        base: &str,
        head: &str,
    ) -> Result<Comparison, DriftError>;
}

/// GitHub REST client for repository, branch, and compare lookups.
///
/// # Examples
///
/// ```no_run
/// use driftwatch_analyze::github::GitHubClient;
///
/// # async fn run() -> Result<(), driftwatch_core::DriftError> {
/// let client = GitHubClient::new("ghp_xxxx", None)?;
/// # Ok(())
/// # }
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
}

impl GitHubClient {
    /// Create a client authenticated with a personal access token.
    ///
    /// `api_base` overrides `https://api.github.com` (GitHub Enterprise).
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Config`] if the base URL is invalid or the
    /// client cannot be built.
    pub fn new(token: &str, api_base: Option<&str>) -> Result<Self, DriftError> {
        let mut builder = octocrab::Octocrab::builder().personal_token(token.to_string());
        if let Some(base) = api_base {
            builder = builder
                .base_uri(base)
                .map_err(|e| DriftError::Config(format!("invalid GitHub API base '{base}': {e}")))?;
        }
        let octocrab = builder
            .build()
            .map_err(|e| DriftError::Config(format!("failed to create GitHub client: {e}")))?;
        Ok(Self { octocrab })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, route: String) -> Result<T, DriftError> {
        self.octocrab
            .get(&route, None::<&()>)
            .await
            .map_err(|e| hosting_error(&route, e))
    }
}

#[derive(Deserialize)]
struct RepoBody {
    default_branch: Option<String>,
}

#[derive(Deserialize)]
struct BranchBody {
    commit: CommitRef,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct CompareBody {
    ahead_by: u64,
    #[serde(default)]
    commits: Vec<CompareCommit>,
    #[serde(default)]
    files: Vec<CompareFile>,
}

#[derive(Deserialize)]
struct CompareCommit {
    commit: CommitDetail,
}

#[derive(Deserialize)]
struct CommitDetail {
    message: String,
}

#[derive(Deserialize)]
struct CompareFile {
    filename: String,
}

impl From<CompareBody> for Comparison {
    fn from(body: CompareBody) -> Self {
        // GitHub lists compare commits oldest first.
        let commit_messages = body
            .commits
            .into_iter()
            .rev()
            .map(|c| c.commit.message)
            .collect();
        Self {
            ahead_by: body.ahead_by,
            commit_messages,
            changed_files: body.files.into_iter().map(|f| f.filename).collect(),
        }
    }
}

#[async_trait]
impl HostingApi for GitHubClient {
    async fn default_branch(&self, id: &HostIdentity) -> Result<String, DriftError> {
        let body: RepoBody = self
            .get(format!("/repos/{}/{}", id.owner(), id.repo()))
            .await?;
        body.default_branch.ok_or_else(|| DriftError::Hosting {
            status: None,
            message: format!("{id} has no default branch"),
        })
    }

    async fn branch_head(&self, id: &HostIdentity, branch: &str) -> Result<String, DriftError> {
        let body: BranchBody = self
            .get(format!(
                "/repos/{}/{}/branches/{branch}",
                id.owner(),
                id.repo()
            ))
            .await?;
        Ok(body.commit.sha)
    }

    async fn compare(
        &self,
        id: &HostIdentity,
        base: &str,
        head: &str,
    ) -> Result<Comparison, DriftError> {
        let body: CompareBody = self
            .get(format!(
                "/repos/{}/{}/compare/{base}...{head}",
                id.owner(),
                id.repo()
            ))
            .await?;
        Ok(body.into())
    }
}

fn hosting_error(route: &str, err: octocrab::Error) -> DriftError {
    match err {
        octocrab::Error::GitHub { source, .. } => DriftError::Hosting {
            status: Some(source.status_code.as_u16()),
            message: source.message.clone(),
        },
        other => DriftError::Hosting {
            status: None,
            message: format!("request to {route} failed: {other}"),
        },
    }
}
