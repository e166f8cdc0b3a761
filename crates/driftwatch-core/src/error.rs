use std::path::PathBuf;

/// Errors that can occur while inventorying and analyzing repositories.
///
/// Implements [`miette::Diagnostic`] so the binary can propagate it with `?`.
///
/// # Examples
///
/// ```
/// use driftwatch_core::DriftError;
///
/// let err = DriftError::Hosting { status: Some(404), message: "Not Found".into() };
/// assert_eq!(err.to_string(), "GitHub API error 404: Not Found");
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum DriftError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Local git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// The remote URL does not point at a supported hosting provider.
    #[error("not a GitHub repository: {url}")]
    NotAHostedRepo {
        /// The remote URL that failed to resolve.
        url: String,
    },

    /// Hosting provider API failure (auth, rate limit, not found, network).
    #[error("GitHub API error{}: {message}", status_suffix(.status))]
    Hosting {
        /// HTTP status code reported by the provider, if any.
        status: Option<u16>,
        /// Provider message or transport error description.
        message: String,
    },

    /// Advisory inference API or response error.
    #[error("advisory error: {0}")]
    Advisory(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" {code}"),
        None => String::new(),
    }
}
