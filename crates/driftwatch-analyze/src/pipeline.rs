use std::sync::Arc;

use driftwatch_core::{resolve, AnalysisOutcome, Outcome, PipelineConfig, RepositoryRef};
use futures::StreamExt;

use crate::classify::RiskClassifier;
use crate::decision;
use crate::divergence;
use crate::github::HostingApi;

/// Drives identity resolution, divergence detection, classification and the
/// decision procedure for a set of repositories.
///
/// Every repository yields exactly one [`AnalysisOutcome`]; failures are
/// captured as `error` outcomes and never abort the run.
pub struct UpdatePipeline {
    hosting: Arc<dyn HostingApi>,
    classifier: RiskClassifier,
    concurrency: usize,
}

impl UpdatePipeline {
    /// Create a pipeline over a hosting client and a classifier.
    pub fn new(
        hosting: Arc<dyn HostingApi>,
        classifier: RiskClassifier,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            hosting,
            classifier,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Analyze a single repository.
    pub async fn analyze_repository(&self, repo: &RepositoryRef) -> AnalysisOutcome {
        let Some(remote_url) = repo.remote_url.as_deref() else {
            return AnalysisOutcome::error(repo, "no remote configured");
        };
        let id = match resolve(remote_url) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(repo = %repo.name, error = %e, "skipping");
                return AnalysisOutcome::error(repo, "not a GitHub repository");
            }
        };
        let Some(local_head) = repo.local_head.as_deref() else {
            return AnalysisOutcome::error(repo, "repository has no HEAD commit");
        };

        let report = match divergence::detect(self.hosting.as_ref(), &id, local_head).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(repo = %repo.name, remote = %id, error = %e, "divergence detection failed");
                return AnalysisOutcome::error(repo, e.to_string());
            }
        };

        let outcome = if report.is_behind() {
            let judgment = self
                .classifier
                .classify(
                    id.repo(),
                    report.ahead_by,
                    &report.commit_messages,
                    &report.changed_files,
                )
                .await;
            decision::settle(report, judgment)
        } else {
            Outcome::UpToDate {
                local_head: report.local_head,
                remote_head: report.remote_head,
            }
        };

        let result = AnalysisOutcome {
            name: repo.name.clone(),
            path: repo.path.clone(),
            outcome,
        };
        tracing::debug!(repo = %repo.name, remote = %id, status = %result.status(), "analyzed");
        result
    }

    /// Analyze `repos` with bounded concurrency.
    ///
    /// Outcomes are returned in input order. `on_done` is called once per
    /// outcome as it becomes available, also in input order.
    pub async fn run<F>(&self, repos: &[RepositoryRef], on_done: F) -> Vec<AnalysisOutcome>
    where
        F: FnMut(&AnalysisOutcome),
    {
        tracing::info!(
            repos = repos.len(),
            concurrency = self.concurrency,
            "starting analysis"
        );
        futures::stream::iter(repos)
            .map(|repo| self.analyze_repository(repo))
            .buffered(self.concurrency)
            .inspect(on_done)
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use driftwatch_core::{RiskLevel, UpdateStatus};

    use super::*;
    use crate::testing::{FakeAdvisory, FakeHosting, FakeRepo};

    fn repo(name: &str, remote: Option<&str>, head: Option<&str>) -> RepositoryRef {
        RepositoryRef {
            name: name.into(),
            path: PathBuf::from("/src").join(name),
            remote_url: remote.map(str::to_string),
            local_head: head.map(str::to_string),
        }
    }

    fn pipeline(hosting: Arc<FakeHosting>, advisory: Option<Arc<FakeAdvisory>>) -> UpdatePipeline {
        let classifier = match advisory {
            Some(a) => RiskClassifier::new(a),
            None => RiskClassifier::without_advisory(),
        };
        UpdatePipeline::new(hosting, classifier, &PipelineConfig::default())
    }

    #[tokio::test]
    async fn up_to_date_skips_compare_and_advisory() {
        let hosting = Arc::new(FakeHosting::default().with("acme/widgets", FakeRepo::at("abc123")));
        let advisory = Arc::new(FakeAdvisory::replying("{}"));
        let p = pipeline(hosting.clone(), Some(advisory.clone()));

        let outcome = p
            .analyze_repository(&repo("widgets", Some("git@github.com:acme/widgets.git"), Some("abc123")))
            .await;
        assert_eq!(outcome.status(), UpdateStatus::UpToDate);
        assert_eq!(hosting.compare_calls.load(Ordering::SeqCst), 0);
        assert_eq!(advisory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn breaking_judgment_needs_review() {
        let hosting = Arc::new(FakeHosting::default().with(
            "acme/widgets",
            FakeRepo::behind("def456", &["BREAKING: drop v1 API"; 5], &["src/api.rs"]),
        ));
        let advisory = Arc::new(FakeAdvisory::replying(
            r#"{"summary":"- drop v1","isBreaking":true,"hasDepChanges":false,"riskLevel":"high","reasoning":"api removal"}"#,
        ));
        let p = pipeline(hosting, Some(advisory));

        let outcome = p
            .analyze_repository(&repo("widgets", Some("https://github.com/acme/widgets"), Some("abc123")))
            .await;
        assert_eq!(outcome.status(), UpdateStatus::NeedsReview);
        assert_eq!(outcome.divergence().unwrap().ahead_by, 5);
        assert_eq!(outcome.judgment().unwrap().risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn unavailable_advisory_is_safe_via_fallback() {
        let hosting = Arc::new(FakeHosting::default().with(
            "acme/widgets",
            FakeRepo::behind("def456", &["a", "b", "c"], &["README.md", "src/util.go"]),
        ));
        let advisory = Arc::new(FakeAdvisory::failing("service unavailable"));
        let p = pipeline(hosting, Some(advisory));

        let outcome = p
            .analyze_repository(&repo("widgets", Some("https://github.com/acme/widgets"), Some("abc123")))
            .await;
        assert_eq!(outcome.status(), UpdateStatus::SafeToUpdate);
        let judgment = outcome.judgment().unwrap();
        assert_eq!(judgment.summary, "3 commits available");
        assert!(!judgment.is_breaking);
        assert!(!judgment.has_dep_changes);
        assert_eq!(judgment.risk_level, RiskLevel::Medium);
    }

    #[tokio::test]
    async fn foreign_host_is_an_error_without_network() {
        let hosting = Arc::new(FakeHosting::default());
        let p = pipeline(hosting.clone(), None);

        let outcome = p
            .analyze_repository(&repo("lib", Some("https://gitlab.example.com/team/lib.git"), Some("abc")))
            .await;
        assert_eq!(outcome.error_message(), Some("not a GitHub repository"));
        assert_eq!(hosting.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_remote_and_head_are_errors() {
        let p = pipeline(Arc::new(FakeHosting::default()), None);

        let outcome = p.analyze_repository(&repo("a", None, Some("abc"))).await;
        assert_eq!(outcome.error_message(), Some("no remote configured"));

        let outcome = p
            .analyze_repository(&repo("b", Some("https://github.com/acme/b"), None))
            .await;
        assert_eq!(outcome.error_message(), Some("repository has no HEAD commit"));
    }

    #[tokio::test]
    async fn hosting_failure_is_isolated() {
        let hosting = Arc::new(FakeHosting::default().with("acme/ok", FakeRepo::at("abc")));
        let p = pipeline(hosting, None);

        let repos = vec![
            repo("missing", Some("https://github.com/acme/missing"), Some("abc")),
            repo("ok", Some("https://github.com/acme/ok"), Some("abc")),
        ];
        let outcomes = p.run(&repos, |_| {}).await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status(), UpdateStatus::Error);
        assert!(outcomes[0].error_message().unwrap().contains("404"));
        assert_eq!(outcomes[1].status(), UpdateStatus::UpToDate);
    }

    #[tokio::test]
    async fn run_preserves_input_order() {
        let mut slow = FakeRepo::at("abc");
        slow.delay = Duration::from_millis(50);
        let hosting = Arc::new(
            FakeHosting::default()
                .with("acme/slow", slow)
                .with("acme/fast", FakeRepo::at("abc")),
        );
        let p = pipeline(hosting, None);

        let repos = vec![
            repo("slow", Some("https://github.com/acme/slow"), Some("abc")),
            repo("fast", Some("https://github.com/acme/fast"), Some("abc")),
            repo("none", None, None),
        ];
        let mut seen = Vec::new();
        let outcomes = p.run(&repos, |o| seen.push(o.name.clone())).await;

        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["slow", "fast", "none"]);
        assert_eq!(seen, vec!["slow", "fast", "none"]);
    }

    #[tokio::test]
    async fn zero_concurrency_is_clamped() {
        let p = UpdatePipeline::new(
            Arc::new(FakeHosting::default()),
            RiskClassifier::without_advisory(),
            &PipelineConfig { concurrency: 0 },
        );
        let outcomes = p.run(&[repo("a", None, None)], |_| {}).await;
        assert_eq!(outcomes.len(), 1);
    }
}
