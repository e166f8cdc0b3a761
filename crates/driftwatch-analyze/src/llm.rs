use std::time::Duration;

use async_trait::async_trait;
use driftwatch_core::{AdvisoryConfig, AdvisoryProvider, DriftError};
use serde_json::{json, Value};

/// A text-generation service that answers a single prompt.
#[async_trait]
pub trait AdvisoryService: Send + Sync {
    /// Send `prompt` and return the raw text of the first candidate.
    async fn generate(&self, prompt: &str) -> Result<String, DriftError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// HTTP client for the Gemini `generateContent` API or an OpenAI-compatible
/// chat completions endpoint.
///
/// # Examples
///
/// ```
/// use driftwatch_core::AdvisoryConfig;
/// use driftwatch_analyze::llm::AdvisoryClient;
///
/// let client = AdvisoryClient::new(&AdvisoryConfig::default(), "test-key").unwrap();
/// assert_eq!(client.model(), "gemini-1.5-flash");
/// ```
pub struct AdvisoryClient {
    client: reqwest::Client,
    config: AdvisoryConfig,
    api_key: String,
}

impl AdvisoryClient {
    /// Create a client from configuration and a resolved API key.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::Advisory`] if the HTTP client cannot be built.
    pub fn new(config: &AdvisoryConfig, api_key: impl Into<String>) -> Result<Self, DriftError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DriftError::Advisory(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
            api_key: api_key.into(),
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(self.config.provider.default_base_url())
            .trim_end_matches('/')
    }
}

#[async_trait]
impl AdvisoryService for AdvisoryClient {
    async fn generate(&self, prompt: &str) -> Result<String, DriftError> {
        let request = match self.config.provider {
            AdvisoryProvider::Gemini => self
                .client
                .post(format!(
                    "{}/v1beta/models/{}:generateContent",
                    self.base_url(),
                    self.config.model
                ))
                .header("x-goog-api-key", &self.api_key)
                .json(&gemini_body(&self.config, prompt)),
            AdvisoryProvider::OpenAi => self
                .client
                .post(format!("{}/v1/chat/completions", self.base_url()))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&openai_body(&self.config, prompt)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| DriftError::Advisory(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(DriftError::Advisory(format!(
                "advisory API error {status}: {body_text}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| DriftError::Advisory(format!("failed to parse response: {e}")))?;

        let text = match self.config.provider {
            AdvisoryProvider::Gemini => gemini_text(&body),
            AdvisoryProvider::OpenAi => openai_text(&body),
        };
        text.map(str::to_string)
            .ok_or_else(|| DriftError::Advisory(format!("unexpected response structure: {body}")))
    }

    fn model(&self) -> &str {
        AdvisoryClient::model(self)
    }
}

fn gemini_body(config: &AdvisoryConfig, prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": config.temperature,
            "topK": config.top_k,
            "topP": config.top_p,
            "maxOutputTokens": config.max_output_tokens,
        },
    })
}

fn openai_body(config: &AdvisoryConfig, prompt: &str) -> Value {
    json!({
        "model": config.model,
        "messages": [{ "role": "user", "content": prompt }],
        "temperature": config.temperature,
        "top_p": config.top_p,
        "max_tokens": config.max_output_tokens,
        "response_format": { "type": "json_object" },
    })
}

fn gemini_text(body: &Value) -> Option<&str> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

fn openai_text(body: &Value) -> Option<&str> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_body_carries_generation_config() {
        let body = gemini_body(&AdvisoryConfig::default(), "hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["temperature"], 0.2);
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["topP"], 0.95);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
    }

    #[test]
    fn openai_body_uses_chat_shape() {
        let config = AdvisoryConfig {
            provider: AdvisoryProvider::OpenAi,
            model: "gpt-4o-mini".into(),
            ..AdvisoryConfig::default()
        };
        let body = openai_body(&config, "hello");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn extracts_gemini_candidate_text() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"summary\":\"x\"}" }] } }]
        });
        assert_eq!(gemini_text(&body), Some("{\"summary\":\"x\"}"));
        assert_eq!(gemini_text(&json!({ "candidates": [] })), None);
    }

    #[test]
    fn extracts_openai_message_content() {
        let body = json!({ "choices": [{ "message": { "content": "ok" } }] });
        assert_eq!(openai_text(&body), Some("ok"));
        assert_eq!(openai_text(&json!({})), None);
    }

    #[test]
    fn base_url_defaults_per_provider() {
        let client = AdvisoryClient::new(&AdvisoryConfig::default(), "k").unwrap();
        assert_eq!(
            client.base_url(),
            "https://generativelanguage.googleapis.com"
        );

        let config = AdvisoryConfig {
            base_url: Some("http://localhost:11434/".into()),
            ..AdvisoryConfig::default()
        };
        let client = AdvisoryClient::new(&config, "k").unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }
}
