use std::path::Path;

use chrono::{DateTime, Local};
use driftwatch_core::{AnalysisOutcome, DriftError, UpdateStatus};

const BANNER: &str = "echo '================================'";

/// Build a bash script that pulls every `safe_to_update` repository.
///
/// Returns `None` when no repository is safe to update.
///
/// # Examples
///
/// ```
/// use chrono::Local;
/// use driftwatch_analyze::script::generate_update_script;
///
/// assert!(generate_update_script(&[], Local::now()).is_none());
/// ```
pub fn generate_update_script(
    outcomes: &[AnalysisOutcome],
    generated_at: DateTime<Local>,
) -> Option<String> {
    let safe: Vec<&AnalysisOutcome> = outcomes
        .iter()
        .filter(|o| o.status() == UpdateStatus::SafeToUpdate)
        .collect();
    if safe.is_empty() {
        return None;
    }

    let mut lines: Vec<String> = vec![
        "#!/bin/bash".into(),
        "# driftwatch - safe update script".into(),
        format!("# Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        "#".into(),
        "# Pulls the repositories classified as safe to update.".into(),
        "# Review this script before executing!".into(),
        String::new(),
        "set -e".into(),
        String::new(),
        BANNER.into(),
        "echo 'driftwatch'".into(),
        "echo 'Safe Repository Updates'".into(),
        BANNER.into(),
        String::new(),
    ];

    for (i, o) in safe.iter().enumerate() {
        lines.push(format!("# {}. {}", i + 1, o.name.replace('\n', " ")));
        lines.push("echo ''".into());
        lines.push(format!(
            "echo {}",
            shell_quote(&format!("Updating {}...", o.name))
        ));
        lines.push(format!(
            "(cd {} && git pull)",
            shell_quote(&o.path.display().to_string())
        ));
        lines.push(String::new());
    }

    lines.extend([
        "echo ''".into(),
        BANNER.into(),
        "echo 'All updates completed!'".into(),
        BANNER.into(),
    ]);

    let mut script = lines.join("\n");
    script.push('\n');
    Some(script)
}

/// Write `content` to `path`, executable on Unix.
///
/// # Errors
///
/// Returns [`DriftError::Io`] if the file cannot be written.
pub fn write_script(path: &Path, content: &str) -> Result<(), DriftError> {
    std::fs::write(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Quote `s` as a single-quoted shell word.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
