use std::sync::Arc;

use driftwatch_core::{ClassificationJudgment, DriftError, RiskLevel};

use crate::llm::AdvisoryService;
use crate::prompt::{build_classification_prompt, parse_judgment};

/// File name fragments that mark a dependency manifest or lockfile.
pub const DEPENDENCY_MANIFESTS: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "requirements.txt",
    "pyproject.toml",
    "Pipfile",
    "poetry.lock",
    "Gemfile",
    "go.mod",
    "go.sum",
    "Cargo.toml",
    "Cargo.lock",
    "composer.json",
    "pom.xml",
    "build.gradle",
];

/// Produces a [`ClassificationJudgment`] for an incoming change set.
///
/// Uses the advisory service when one is configured and falls back to a
/// deterministic judgment whenever the service is absent, fails, or returns
/// something unusable. Classification itself never fails.
///
/// # Examples
///
/// ```
/// use driftwatch_analyze::classify::RiskClassifier;
/// use driftwatch_core::RiskLevel;
///
/// # async fn demo() {
/// let classifier = RiskClassifier::without_advisory();
/// let judgment = classifier
///     .classify("widgets", 3, &[], &["README.md".to_string()])
///     .await;
/// assert_eq!(judgment.summary, "3 commits available");
/// assert_eq!(judgment.risk_level, RiskLevel::Medium);
/// # }
/// ```
pub struct RiskClassifier {
    advisory: Option<Arc<dyn AdvisoryService>>,
}

impl RiskClassifier {
    /// Classify through `advisory`, falling back on failure.
    pub fn new(advisory: Arc<dyn AdvisoryService>) -> Self {
        Self {
            advisory: Some(advisory),
        }
    }

    /// Classify with the deterministic fallback only.
    pub fn without_advisory() -> Self {
        Self { advisory: None }
    }

    /// Judge the change set separating a checkout from upstream.
    pub async fn classify(
        &self,
        repo_name: &str,
        ahead_by: u64,
        commit_messages: &[String],
        changed_files: &[String],
    ) -> ClassificationJudgment {
        let Some(service) = &self.advisory else {
            return fallback_judgment(ahead_by, changed_files, "advisory service not configured");
        };

        let prompt = build_classification_prompt(repo_name, ahead_by, commit_messages, changed_files);
        match request_judgment(service.as_ref(), &prompt).await {
            Ok(judgment) => judgment,
            Err(e) => {
                tracing::warn!(
                    repo = repo_name,
                    model = service.model(),
                    error = %e,
                    "advisory analysis failed, using fallback"
                );
                fallback_judgment(
                    ahead_by,
                    changed_files,
                    &format!("advisory analysis failed: {e}"),
                )
            }
        }
    }
}

async fn request_judgment(
    service: &dyn AdvisoryService,
    prompt: &str,
) -> Result<ClassificationJudgment, DriftError> {
    let response = service.generate(prompt).await?;
    parse_judgment(&response)
}

/// Deterministic judgment used when the advisory path is unavailable.
///
/// Never breaking, always medium risk; `has_dep_changes` is set when any
/// path contains one of [`DEPENDENCY_MANIFESTS`].
///
/// # Examples
///
/// ```
/// use driftwatch_analyze::classify::fallback_judgment;
///
/// let judgment = fallback_judgment(2, &["web/package.json".to_string()], "timeout");
/// assert_eq!(judgment.summary, "2 commits available");
/// assert!(judgment.has_dep_changes);
/// assert!(!judgment.is_breaking);
/// ```
pub fn fallback_judgment(
    ahead_by: u64,
    changed_files: &[String],
    reasoning: &str,
) -> ClassificationJudgment {
    ClassificationJudgment {
        summary: format!("{ahead_by} commits available"),
        is_breaking: false,
        has_dep_changes: touches_dependencies(changed_files),
        risk_level: RiskLevel::Medium,
        reasoning: reasoning.to_string(),
    }
}

/// `true` if any path contains a known dependency manifest name.
pub fn touches_dependencies(changed_files: &[String]) -> bool {
    changed_files
        .iter()
        .any(|f| DEPENDENCY_MANIFESTS.iter().any(|m| f.contains(m)))
}
