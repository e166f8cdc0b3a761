use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A local repository under analysis, as discovered by the scanner.
///
/// # Examples
///
/// ```
/// use driftwatch_core::RepositoryRef;
/// use std::path::PathBuf;
///
/// let repo = RepositoryRef {
///     name: "widgets".into(),
///     path: PathBuf::from("/home/me/src/widgets"),
///     remote_url: Some("git@github.com:acme/widgets.git".into()),
///     local_head: Some("4b825dc642cb6eb9a060e54bf8d69288fbee4904".into()),
/// };
/// assert_eq!(repo.name, "widgets");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRef {
    /// Directory name of the checkout.
    pub name: String,
    /// Location of the working tree.
    pub path: PathBuf,
    /// Configured remote URL (`origin`, or the first remote), if any.
    pub remote_url: Option<String>,
    /// Hex digest of the local `HEAD` commit, if it resolves.
    pub local_head: Option<String>,
}

/// Owner and repository name on the hosting provider.
///
/// Both parts are guaranteed non-empty.
///
/// # Examples
///
/// ```
/// use driftwatch_core::HostIdentity;
///
/// let id = HostIdentity::new("acme", "widgets").unwrap();
/// assert_eq!(id.to_string(), "acme/widgets");
/// assert!(HostIdentity::new("", "widgets").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HostIdentity {
    owner: String,
    repo: String,
}

impl HostIdentity {
    /// Build an identity, returning `None` if either part is empty.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Option<Self> {
        let owner = owner.into();
        let repo = repo.into();
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(Self { owner, repo })
    }

    /// Repository owner (user or organization).
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Result of comparing the local head against the upstream default branch.
///
/// When `ahead_by == 0` the commit and file lists are empty.
///
/// # Examples
///
/// ```
/// use driftwatch_core::DivergenceReport;
///
/// let report = DivergenceReport::up_to_date("abc", "abc");
/// assert_eq!(report.ahead_by, 0);
/// assert!(!report.is_behind());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivergenceReport {
    /// Local `HEAD` commit.
    pub local_head: String,
    /// Head commit of the upstream default branch.
    pub remote_head: String,
    /// Number of commits the remote leads the local head by.
    pub ahead_by: u64,
    /// Commit messages, most recent first.
    pub commit_messages: Vec<String>,
    /// Changed file paths, in the order the provider reported them.
    pub changed_files: Vec<String>,
}

impl DivergenceReport {
    /// A report with no commits to pull.
    pub fn up_to_date(local_head: impl Into<String>, remote_head: impl Into<String>) -> Self {
        Self {
            local_head: local_head.into(),
            remote_head: remote_head.into(),
            ahead_by: 0,
            commit_messages: Vec::new(),
            changed_files: Vec::new(),
        }
    }

    /// `true` when upstream has commits the local checkout lacks.
    pub fn is_behind(&self) -> bool {
        self.ahead_by > 0
    }
}

/// Risk tier of an incoming change set.
///
/// # Examples
///
/// ```
/// use driftwatch_core::RiskLevel;
///
/// assert_eq!(RiskLevel::coerce("HIGH"), RiskLevel::High);
/// assert_eq!(RiskLevel::coerce("catastrophic"), RiskLevel::Medium);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Docs, tests, minor fixes, performance-only changes.
    Low,
    /// Non-breaking features, refactors, dependency bumps.
    #[default]
    Medium,
    /// Breaking changes, major version bumps, architectural changes.
    High,
}

impl RiskLevel {
    /// Parse a value from an untrusted source, mapping anything unrecognized
    /// to [`RiskLevel::Medium`].
    pub fn coerce(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Structured judgment about an incoming change set.
///
/// Produced by the risk classifier, either from the advisory service or
/// from the deterministic fallback.
///
/// # Examples
///
/// ```
/// use driftwatch_core::{ClassificationJudgment, RiskLevel};
///
/// let judgment = ClassificationJudgment {
///     summary: "fix bug".into(),
///     is_breaking: false,
///     has_dep_changes: false,
///     risk_level: RiskLevel::Low,
///     reasoning: String::new(),
/// };
/// let json = serde_json::to_value(&judgment).unwrap();
/// assert_eq!(json["riskLevel"], "low");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationJudgment {
    /// Human-readable changelog of the incoming commits.
    pub summary: String,
    /// Whether the changes are likely to break downstream users.
    pub is_breaking: bool,
    /// Whether dependency manifests are touched.
    pub has_dep_changes: bool,
    /// Risk tier.
    pub risk_level: RiskLevel,
    /// Free-text rationale, possibly empty.
    pub reasoning: String,
}

/// Terminal status of one repository's analysis.
///
/// # Examples
///
/// ```
/// use driftwatch_core::UpdateStatus;
///
/// assert_eq!(UpdateStatus::SafeToUpdate.to_string(), "safe_to_update");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    /// No upstream commits to pull.
    UpToDate,
    /// Behind upstream, and the changes look low-risk.
    SafeToUpdate,
    /// Behind upstream with breaking or high-risk changes.
    NeedsReview,
    /// Analysis could not be completed.
    Error,
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStatus::UpToDate => write!(f, "up_to_date"),
            UpdateStatus::SafeToUpdate => write!(f, "safe_to_update"),
            UpdateStatus::NeedsReview => write!(f, "needs_review"),
            UpdateStatus::Error => write!(f, "error"),
        }
    }
}

/// Status-specific payload of an [`AnalysisOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Outcome {
    /// Local head matches, or is not behind, upstream.
    UpToDate {
        /// Local `HEAD` commit.
        local_head: String,
        /// Upstream default-branch head.
        remote_head: String,
    },
    /// Behind upstream; judged safe to pull.
    SafeToUpdate {
        /// Divergence data.
        divergence: DivergenceReport,
        /// Risk judgment.
        judgment: ClassificationJudgment,
    },
    /// Behind upstream; judged breaking or high risk.
    NeedsReview {
        /// Divergence data.
        divergence: DivergenceReport,
        /// Risk judgment.
        judgment: ClassificationJudgment,
    },
    /// Identity resolution or divergence detection failed.
    Error {
        /// Captured failure description.
        message: String,
    },
}

/// Final per-repository result of one pipeline run.
///
/// # Examples
///
/// ```
/// use driftwatch_core::{AnalysisOutcome, Outcome, UpdateStatus};
/// use std::path::PathBuf;
///
/// let outcome = AnalysisOutcome {
///     name: "widgets".into(),
///     path: PathBuf::from("/src/widgets"),
///     outcome: Outcome::Error { message: "no remote configured".into() },
/// };
/// assert_eq!(outcome.status(), UpdateStatus::Error);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutcome {
    /// Repository name.
    pub name: String,
    /// Location of the working tree.
    pub path: PathBuf,
    /// Status and status-specific data.
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl AnalysisOutcome {
    /// Build an `error` outcome for `repo`.
    pub fn error(repo: &RepositoryRef, message: impl Into<String>) -> Self {
        Self {
            name: repo.name.clone(),
            path: repo.path.clone(),
            outcome: Outcome::Error {
                message: message.into(),
            },
        }
    }

    /// The terminal status of this outcome.
    pub fn status(&self) -> UpdateStatus {
        match self.outcome {
            Outcome::UpToDate { .. } => UpdateStatus::UpToDate,
            Outcome::SafeToUpdate { .. } => UpdateStatus::SafeToUpdate,
            Outcome::NeedsReview { .. } => UpdateStatus::NeedsReview,
            Outcome::Error { .. } => UpdateStatus::Error,
        }
    }

    /// Divergence data, for repositories that are behind upstream.
    pub fn divergence(&self) -> Option<&DivergenceReport> {
        match &self.outcome {
            Outcome::SafeToUpdate { divergence, .. } | Outcome::NeedsReview { divergence, .. } => {
                Some(divergence)
            }
            _ => None,
        }
    }

    /// Risk judgment, for repositories that are behind upstream.
    pub fn judgment(&self) -> Option<&ClassificationJudgment> {
        match &self.outcome {
            Outcome::SafeToUpdate { judgment, .. } | Outcome::NeedsReview { judgment, .. } => {
                Some(judgment)
            }
            _ => None,
        }
    }

    /// Error message, for failed analyses.
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Error { message } => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use driftwatch_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
