use driftwatch_core::{ClassificationJudgment, DivergenceReport, Outcome, RiskLevel, UpdateStatus};

/// Map divergence and judgment to a terminal status.
///
/// No upstream commits means up to date regardless of the judgment. A
/// breaking or high-risk judgment always requires review.
///
/// # Examples
///
/// ```
/// use driftwatch_analyze::decision::decide;
/// use driftwatch_analyze::classify::fallback_judgment;
/// use driftwatch_core::{DivergenceReport, UpdateStatus};
///
/// let report = DivergenceReport::up_to_date("abc", "abc");
/// let judgment = fallback_judgment(0, &[], "");
/// assert_eq!(decide(&report, &judgment), UpdateStatus::UpToDate);
/// ```
pub fn decide(divergence: &DivergenceReport, judgment: &ClassificationJudgment) -> UpdateStatus {
    if !divergence.is_behind() {
        UpdateStatus::UpToDate
    } else if judgment.is_breaking || judgment.risk_level == RiskLevel::High {
        UpdateStatus::NeedsReview
    } else {
        UpdateStatus::SafeToUpdate
    }
}

/// Apply [`decide`] and package the result as an [`Outcome`].
pub fn settle(divergence: DivergenceReport, judgment: ClassificationJudgment) -> Outcome {
    match decide(&divergence, &judgment) {
        UpdateStatus::NeedsReview => Outcome::NeedsReview {
            divergence,
            judgment,
        },
        UpdateStatus::SafeToUpdate => Outcome::SafeToUpdate {
            divergence,
            judgment,
        },
        // decide never yields Error
        UpdateStatus::UpToDate | UpdateStatus::Error => Outcome::UpToDate {
            local_head: divergence.local_head,
            remote_head: divergence.remote_head,
        },
    }
}
