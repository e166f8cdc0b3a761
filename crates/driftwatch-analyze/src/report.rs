use std::fmt;

use driftwatch_core::{AnalysisOutcome, UpdateStatus};
use serde::Serialize;

/// Outcomes of one pipeline run, grouped for presentation.
///
/// # Examples
///
/// ```
/// use driftwatch_analyze::report::RunReport;
///
/// let report = RunReport::new(vec![]);
/// assert_eq!(report.summary.up_to_date, 0);
/// assert!(report.to_string().contains("No repositories analyzed."));
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Per-repository outcomes, in scan order.
    pub outcomes: Vec<AnalysisOutcome>,
    /// Counts per status.
    pub summary: RunSummary,
}

/// Number of outcomes in each status bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Repositories with nothing to pull.
    pub up_to_date: usize,
    /// Repositories judged safe to pull.
    pub safe_to_update: usize,
    /// Repositories needing manual review.
    pub needs_review: usize,
    /// Repositories whose analysis failed.
    pub error: usize,
}

impl RunReport {
    /// Build a report and tally its buckets.
    pub fn new(outcomes: Vec<AnalysisOutcome>) -> Self {
        let mut summary = RunSummary::default();
        for o in &outcomes {
            match o.status() {
                UpdateStatus::UpToDate => summary.up_to_date += 1,
                UpdateStatus::SafeToUpdate => summary.safe_to_update += 1,
                UpdateStatus::NeedsReview => summary.needs_review += 1,
                UpdateStatus::Error => summary.error += 1,
            }
        }
        Self { outcomes, summary }
    }

    /// Outcomes with the given status, in scan order.
    pub fn with_status(&self, status: UpdateStatus) -> impl Iterator<Item = &AnalysisOutcome> {
        self.outcomes.iter().filter(move |o| o.status() == status)
    }

    /// Render the report as markdown.
    ///
    /// # Examples
    ///
    /// ```
    /// use driftwatch_analyze::report::RunReport;
    ///
    /// let md = RunReport::new(vec![]).to_markdown();
    /// assert!(md.starts_with("# Update Analysis"));
    /// ```
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Update Analysis\n\n");
        out.push_str(&format!(
            "**Up-to-date:** {} | **Safe to update:** {} | **Needs review:** {} | **Errors:** {}\n\n",
            self.summary.up_to_date,
            self.summary.safe_to_update,
            self.summary.needs_review,
            self.summary.error,
        ));

        if self.summary.safe_to_update > 0 {
            out.push_str("## \u{26a1} Safe to Update\n\n");
            out.push_str("| Repository | Commits Behind | Summary |\n|---|---|---|\n");
            for o in self.with_status(UpdateStatus::SafeToUpdate) {
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    o.name,
                    behind(o),
                    cell(&summary(o)),
                ));
            }
            out.push('\n');
        }

        if self.summary.needs_review > 0 {
            out.push_str("## \u{26a0}\u{fe0f} Needs Review\n\n");
            out.push_str("| Repository | Risk | Commits Behind | Summary |\n|---|---|---|---|\n");
            for o in self.with_status(UpdateStatus::NeedsReview) {
                out.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    o.name,
                    risk(o),
                    behind(o),
                    cell(&summary(o)),
                ));
            }
            out.push('\n');
        }

        if self.summary.up_to_date > 0 {
            out.push_str("## \u{2705} Up to Date\n\n");
            for o in self.with_status(UpdateStatus::UpToDate) {
                out.push_str(&format!("- {} (`{}`)\n", o.name, o.path.display()));
            }
            out.push('\n');
        }

        if self.summary.error > 0 {
            out.push_str("## \u{274c} Errors\n\n");
            for o in self.with_status(UpdateStatus::Error) {
                out.push_str(&format!(
                    "- **{}**: {}\n",
                    o.name,
                    o.error_message().unwrap_or_default()
                ));
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Analysis Results")?;
        writeln!(f, "================\n")?;

        if self.outcomes.is_empty() {
            return writeln!(f, "No repositories analyzed.");
        }

        if self.summary.up_to_date > 0 {
            writeln!(f, "\u{2713} Up-to-Date Repositories")?;
            writeln!(f, "  {:<30} Path", "Repository")?;
            for o in self.with_status(UpdateStatus::UpToDate) {
                writeln!(f, "  {:<30} {}", o.name, o.path.display())?;
            }
            writeln!(f)?;
        }

        if self.summary.safe_to_update > 0 {
            writeln!(f, "\u{26a1} Safe to Update")?;
            writeln!(f, "  {:<30} {:^14} Summary", "Repository", "Commits Behind")?;
            for o in self.with_status(UpdateStatus::SafeToUpdate) {
                writeln!(
                    f,
                    "  {:<30} {:^14} {}",
                    o.name,
                    behind(o),
                    truncate(&summary(o), 60)
                )?;
            }
            writeln!(f)?;
        }

        if self.summary.needs_review > 0 {
            writeln!(f, "\u{26a0} Needs Review")?;
            writeln!(
                f,
                "  {:<30} {:^6} {:^14} Summary",
                "Repository", "Risk", "Commits Behind"
            )?;
            for o in self.with_status(UpdateStatus::NeedsReview) {
                writeln!(
                    f,
                    "  {:<30} {:^6} {:^14} {}",
                    o.name,
                    risk(o).to_uppercase(),
                    behind(o),
                    truncate(&summary(o), 50)
                )?;
            }
            writeln!(f)?;
        }

        if self.summary.error > 0 {
            writeln!(f, "\u{2717} Errors")?;
            for o in self.with_status(UpdateStatus::Error) {
                writeln!(
                    f,
                    "  {:<30} {}",
                    o.name,
                    o.error_message().unwrap_or_default()
                )?;
            }
            writeln!(f)?;
        }

        writeln!(
            f,
            "Summary: Up-to-date: {} | Safe to update: {} | Needs review: {} | Errors: {}",
            self.summary.up_to_date,
            self.summary.safe_to_update,
            self.summary.needs_review,
            self.summary.error,
        )
    }
}

fn behind(o: &AnalysisOutcome) -> u64 {
    o.divergence().map_or(0, |d| d.ahead_by)
}

fn risk(o: &AnalysisOutcome) -> String {
    o.judgment()
        .map(|j| j.risk_level.to_string())
        .unwrap_or_default()
}

/// Judgment summary collapsed onto one line.
fn summary(o: &AnalysisOutcome) -> String {
    o.judgment()
        .map(|j| j.summary.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

fn cell(s: &str) -> String {
    s.replace('|', "\\|")
}
