use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DriftError;

/// Top-level configuration loaded from `config.toml`.
///
/// Supports layered resolution: CLI flags > env vars > config file > defaults.
///
/// # Examples
///
/// ```
/// use driftwatch_core::DriftConfig;
///
/// let config = DriftConfig::default();
/// assert_eq!(config.scan.max_depth, 3);
/// assert_eq!(config.pipeline.concurrency, 4);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriftConfig {
    /// Repository discovery settings.
    #[serde(default)]
    pub scan: ScanConfig,
    /// Hosting provider credentials.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Advisory inference service settings.
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    /// Orchestration settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Safe-update script settings.
    #[serde(default)]
    pub script: ScriptConfig,
}

impl DriftConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::FileNotFound`] if the file does not exist,
    /// [`DriftError::Io`] if it cannot be read, or [`DriftError::Toml`] if the
    /// content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, DriftError> {
        if !path.exists() {
            return Err(DriftError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use driftwatch_core::DriftConfig;
    ///
    /// let toml = r#"
    /// [scan]
    /// root = "/srv/checkouts"
    /// max_depth = 5
    /// "#;
    /// let config = DriftConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.scan.max_depth, 5);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, DriftError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Default location of the configuration file:
    /// `<config dir>/driftwatch/config.toml`.
    ///
    /// Returns `None` if the platform has no configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("driftwatch").join("config.toml"))
    }

    /// Scan root with a leading `~` expanded against the home directory.
    pub fn scan_root(&self) -> Option<PathBuf> {
        self.scan.root.as_deref().map(expand_home)
    }

    /// GitHub token from `GITHUB_TOKEN`, then `GH_TOKEN`, then the config file.
    pub fn github_token(&self) -> Option<String> {
        credential(&["GITHUB_TOKEN", "GH_TOKEN"], self.github.token.as_deref())
    }

    /// Advisory API key from the provider's env var, then the config file.
    pub fn advisory_api_key(&self) -> Option<String> {
        credential(
            &[self.advisory.provider.env_var()],
            self.advisory.api_key.as_deref(),
        )
    }
}

/// First non-blank value among the named env vars and the configured value.
fn credential(env_vars: &[&str], configured: Option<&str>) -> Option<String> {
    env_vars
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .chain(configured.map(str::to_string))
        .find(|value| !value.trim().is_empty())
}

/// Expand a leading `~` or `~/` against the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Repository discovery configuration.
///
/// # Examples
///
/// ```
/// use driftwatch_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert!(config.root.is_none());
/// assert_eq!(config.max_depth, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory searched for git checkouts.
    pub root: Option<String>,
    /// Maximum directory depth searched below `root` (default: 3).
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    3
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: None,
            max_depth: default_max_depth(),
        }
    }
}

/// Hosting provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token used as a bearer credential.
    pub token: Option<String>,
    /// API base URL, for GitHub Enterprise or testing.
    pub api_base: Option<String>,
}

/// Advisory inference provider.
///
/// # Examples
///
/// ```
/// use driftwatch_core::AdvisoryProvider;
///
/// assert_eq!(AdvisoryProvider::Gemini.env_var(), "GEMINI_API_KEY");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryProvider {
    /// Google Gemini `generateContent` API.
    #[default]
    Gemini,
    /// Any OpenAI-compatible `/v1/chat/completions` endpoint.
    OpenAi,
}

impl AdvisoryProvider {
    /// Environment variable consulted for the API key.
    pub fn env_var(self) -> &'static str {
        match self {
            AdvisoryProvider::Gemini => "GEMINI_API_KEY",
            AdvisoryProvider::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Base URL used when none is configured.
    pub fn default_base_url(self) -> &'static str {
        match self {
            AdvisoryProvider::Gemini => "https://generativelanguage.googleapis.com",
            AdvisoryProvider::OpenAi => "https://api.openai.com",
        }
    }
}

/// Advisory inference service configuration.
///
/// Low temperature and a bounded output length keep judgments conservative.
///
/// # Examples
///
/// ```
/// use driftwatch_core::AdvisoryConfig;
///
/// let config = AdvisoryConfig::default();
/// assert_eq!(config.model, "gemini-1.5-flash");
/// assert_eq!(config.temperature, 0.2);
/// assert_eq!(config.top_k, 40);
/// assert_eq!(config.top_p, 0.95);
/// assert_eq!(config.max_output_tokens, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    /// Provider API flavour.
    #[serde(default)]
    pub provider: AdvisoryProvider,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for the provider.
    pub api_key: Option<String>,
    /// Custom base URL for API requests.
    pub base_url: Option<String>,
    /// Sampling temperature (default: 0.2).
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Top-k sampling (default: 40).
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    /// Nucleus sampling (default: 0.95).
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Output length cap (default: 1024).
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Request timeout in seconds (default: 120). Applied to every advisory
    /// request in place of the HTTP client's default of no timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-1.5-flash".into()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f64 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            provider: AdvisoryProvider::default(),
            model: default_model(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Orchestration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Repositories analyzed at once; `1` is strictly sequential (default: 4).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    4
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

/// Safe-update script configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Where the generated script is written (default: `update_script.sh`).
    #[serde(default = "default_script_output")]
    pub output: PathBuf,
}

fn default_script_output() -> PathBuf {
    PathBuf::from("update_script.sh")
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            output: default_script_output(),
        }
    }
}
