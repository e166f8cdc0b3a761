use driftwatch_core::{ClassificationJudgment, DriftError, RiskLevel};
use serde_json::{Map, Value};

/// Commit messages included in the prompt.
pub const MAX_COMMIT_MESSAGES: usize = 10;
/// Characters kept from each commit message.
pub const MAX_MESSAGE_CHARS: usize = 100;
/// Changed file paths included in the prompt.
pub const MAX_CHANGED_FILES: usize = 20;

/// Summary used when the advisory response omits one.
pub const DEFAULT_SUMMARY: &str = "Updates available";

const RESPONSE_SHAPE: &str = r#"Return a JSON object:
{
  "summary": "Bullet-point changelog of new features and fixes",
  "isBreaking": boolean,
  "hasDepChanges": boolean,
  "riskLevel": "low" | "medium" | "high",
  "reasoning": "Explanation of risk assessment"
}

Criteria for isBreaking=true:
- Commit messages contain: "BREAKING", "major", "remove", "deprecate"
- Changes to public API signatures
- Removal of exported functions/classes

Criteria for hasDepChanges=true:
- Modifications to: package.json, requirements.txt, pyproject.toml, Gemfile, go.mod, Cargo.toml
- Addition or removal of dependencies

Criteria for riskLevel:
- "low": Documentation, tests, minor bug fixes, performance improvements
- "medium": New features, refactoring, dependency updates (non-breaking)
- "high": Breaking changes, major version bumps, architectural changes

Return ONLY the JSON object, no markdown formatting."#;

/// Build the classification prompt for an incoming change set.
///
/// At most [`MAX_COMMIT_MESSAGES`] messages (each cut to
/// [`MAX_MESSAGE_CHARS`] characters) and [`MAX_CHANGED_FILES`] paths are
/// included; the counts reflect the full change set.
///
/// # Examples
///
/// ```
/// use driftwatch_analyze::prompt::build_classification_prompt;
///
/// let prompt = build_classification_prompt(
///     "widgets",
///     2,
///     &["fix: typo".to_string(), "docs: usage".to_string()],
///     &["README.md".to_string()],
/// );
/// assert!(prompt.contains("Repository: widgets"));
/// assert!(prompt.contains("- fix: typo"));
/// ```
pub fn build_classification_prompt(
    repo_name: &str,
    ahead_by: u64,
    commit_messages: &[String],
    changed_files: &[String],
) -> String {
    let messages: Vec<String> = commit_messages
        .iter()
        .take(MAX_COMMIT_MESSAGES)
        .map(|msg| {
            let cut: String = msg.chars().take(MAX_MESSAGE_CHARS).collect();
            format!("- {}", cut.trim_end().replace('\n', " "))
        })
        .collect();
    let files: Vec<String> = changed_files
        .iter()
        .take(MAX_CHANGED_FILES)
        .map(|f| format!("- {f}"))
        .collect();

    format!(
        "You are a senior software engineer reviewing a code update. Analyze the following \
         commit history and determine if the update is safe to apply automatically.\n\n\
         Repository: {repo_name}\n\
         Commits: {ahead_by}\n\
         Changed files: {}\n\n\
         Commit messages:\n{}\n\n\
         Changed files summary:\n{}\n\n\
         {RESPONSE_SHAPE}",
        changed_files.len(),
        messages.join("\n"),
        files.join("\n"),
    )
}

/// Parse an advisory response into a [`ClassificationJudgment`].
///
/// Code fences are stripped first. Missing or ill-typed fields take their
/// defaults; an unrecognized `riskLevel` becomes `medium`.
///
/// # Errors
///
/// Returns [`DriftError::Advisory`] if the text is not a JSON object.
///
/// # Examples
///
/// ```
/// use driftwatch_analyze::prompt::parse_judgment;
/// use driftwatch_core::RiskLevel;
///
/// let judgment = parse_judgment(r#"{"summary":"fix bug","isBreaking":false,"riskLevel":"low"}"#).unwrap();
/// assert_eq!(judgment.risk_level, RiskLevel::Low);
/// assert!(!judgment.has_dep_changes);
/// ```
pub fn parse_judgment(response: &str) -> Result<ClassificationJudgment, DriftError> {
    let cleaned = strip_code_fences(response);
    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| DriftError::Advisory(format!("response is not valid JSON: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(DriftError::Advisory(
            "response is not a JSON object".into(),
        ));
    };

    let summary = fields
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUMMARY)
        .to_string();
    let risk_level = fields
        .get("riskLevel")
        .and_then(Value::as_str)
        .map(RiskLevel::coerce)
        .unwrap_or_default();
    let reasoning = fields
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(ClassificationJudgment {
        summary,
        is_breaking: flag(&fields, "isBreaking"),
        has_dep_changes: flag(&fields, "hasDepChanges"),
        risk_level,
        reasoning,
    })
}

fn flag(fields: &Map<String, Value>, key: &str) -> bool {
    match fields.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Strip a surrounding ```` ```json ```` or ```` ``` ```` fence.
///
/// A missing closing fence (truncated output) is tolerated.
pub fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();
    let Some(rest) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
