//! Model Client: the single point of entry for generative model calls.
//!
//! The evaluator talks to a local Ollama server through `OllamaClient`. Callers only see the
//! `ModelClient` trait, whose `invoke` never fails: every outcome is reported as a
//! `RawModelResponse` status so the pipeline can fall back to the default evaluation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod prompts;

use prompts::JSON_ONLY_SYSTEM;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "deepseek-r1:7b";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("Model returned no response text")]
    EmptyResponse,
}

impl ModelError {
    /// True when the server could not be reached at all (not running, wrong host).
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ModelError::Http(e) if e.is_connect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Invocation outcome
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    Ok,
    ClientUnavailable,
    InvocationError,
}

/// What came back from one model call. `text` is the model output, unmodified, on `Ok`
/// and empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelResponse {
    pub text: String,
    pub status: InvocationStatus,
    pub error: Option<String>,
}

impl RawModelResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: InvocationStatus::Ok,
            error: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            status: InvocationStatus::ClientUnavailable,
            error: Some(reason.into()),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            status: InvocationStatus::InvocationError,
            error: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == InvocationStatus::Ok
    }
}

/// A generative model reachable with one prompt in, one complete response out.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn invoke(&self, prompt: &str, model: &str) -> RawModelResponse;
}

// ────────────────────────────────────────────────────────────────────────────
// Unavailable client
// ────────────────────────────────────────────────────────────────────────────

/// Stand-in used when no model backend is configured (offline and demo runs).
#[derive(Debug, Clone)]
pub struct UnavailableClient {
    reason: String,
}

impl UnavailableClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ModelClient for UnavailableClient {
    async fn invoke(&self, _prompt: &str, model: &str) -> RawModelResponse {
        warn!("Model client unavailable, skipping call to {model}: {}", self.reason);
        RawModelResponse::unavailable(self.reason.clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Ollama client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: Option<String>,
    pub prompt_eval_count: Option<u32>,
    pub eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// Non-streaming client for the Ollama HTTP API.
/// Retries on 429 and 5xx with exponential backoff; transport failures are not retried.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    max_retries: u32,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ModelError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Total number of attempts per call, at least one.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one generate request and returns the model's full response text.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.base_url);
        let request_body = GenerateRequest {
            model,
            prompt,
            system: JSON_ONLY_SYSTEM,
            stream: false,
        };

        let mut last_error: Option<ModelError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Model call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self.client.post(&url).json(&request_body).send().await?;
            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Ollama returned {}: {}", status, body);
                last_error = Some(ModelError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ModelError::Api {
                    status: status.as_u16(),
                    message: error_message(body),
                });
            }

            let body = response.text().await?;
            let generated: GenerateResponse = serde_json::from_str(&body)?;

            debug!(
                "Model call succeeded: prompt_tokens={:?}, output_tokens={:?}",
                generated.prompt_eval_count, generated.eval_count
            );

            return generated.response.ok_or(ModelError::EmptyResponse);
        }

        Err(last_error.unwrap_or(ModelError::RateLimited {
            retries: self.max_retries,
        }))
    }

    /// Reports whether `model` has been pulled on the server.
    /// A bare model name also matches its `:latest` tag.
    pub async fn probe(&self, model: &str) -> Result<bool, ModelError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: error_message(body),
            });
        }

        let tags: TagsResponse = serde_json::from_str(&response.text().await?)?;
        let latest = format!("{model}:latest");
        Ok(tags
            .models
            .iter()
            .any(|tag| tag.name == model || tag.name == latest))
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn invoke(&self, prompt: &str, model: &str) -> RawModelResponse {
        info!("Calling Ollama model {model} at {}", self.base_url);

        match self.generate(prompt, model).await {
            Ok(text) => RawModelResponse::ok(text),
            Err(e) if e.is_unreachable() => {
                warn!("Ollama is not reachable at {}: {e}", self.base_url);
                RawModelResponse::unavailable(e.to_string())
            }
            Err(e) => {
                error!("Ollama call to {model} failed: {e}");
                RawModelResponse::failed(e.to_string())
            }
        }
    }
}

/// Pulls the message out of an Ollama `{"error": "..."}` body, or returns the body as-is.
fn error_message(body: String) -> String {
    serde_json::from_str::<OllamaError>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(url: &str) -> OllamaClient {
        OllamaClient::new(url, Duration::from_secs(5))
            .unwrap()
            .with_max_retries(1)
    }

    #[tokio::test]
    async fn test_invoke_returns_response_text_unmodified() {
        let body = json!({
            "model": "deepseek-r1:7b",
            "response": "  ```json\n{\"score\": 90}\n```  ",
            "done": true,
            "prompt_eval_count": 120,
            "eval_count": 40
        })
        .to_string();
        let (url, server) = test_server::serve(vec![(200, body)]).await;

        let raw = client(&url).invoke("Evaluate this", "deepseek-r1:7b").await;
        assert_eq!(raw.status, InvocationStatus::Ok);
        assert_eq!(raw.text, "  ```json\n{\"score\": 90}\n```  ");
        assert!(raw.error.is_none());

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/generate"));
        assert!(requests[0].contains("\"model\":\"deepseek-r1:7b\""));
        assert!(requests[0].contains("\"prompt\":\"Evaluate this\""));
        assert!(requests[0].contains("\"stream\":false"));
    }

    #[tokio::test]
    async fn test_invoke_unreachable_server_is_client_unavailable() {
        let url = test_server::closed_url().await;

        let raw = client(&url).invoke("prompt", "deepseek-r1:7b").await;
        assert_eq!(raw.status, InvocationStatus::ClientUnavailable);
        assert!(raw.text.is_empty());
    }

    #[tokio::test]
    async fn test_invoke_model_not_found_is_invocation_error() {
        let body = json!({"error": "model 'llama9' not found, try pulling it first"}).to_string();
        let (url, _server) = test_server::serve(vec![(404, body)]).await;

        let raw = client(&url).invoke("prompt", "llama9").await;
        assert_eq!(raw.status, InvocationStatus::InvocationError);
        assert!(raw.text.is_empty());
        assert!(raw.error.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_invoke_missing_response_field_is_invocation_error() {
        let (url, _server) =
            test_server::serve(vec![(200, json!({"done": true}).to_string())]).await;

        let raw = client(&url).invoke("prompt", "deepseek-r1:7b").await;
        assert_eq!(raw.status, InvocationStatus::InvocationError);
    }

    #[tokio::test]
    async fn test_generate_retries_server_errors() {
        let ok = json!({"response": "{\"score\": 70}", "done": true}).to_string();
        let (url, server) =
            test_server::serve(vec![(503, "overloaded".to_string()), (200, ok)]).await;

        let text = client(&url)
            .with_max_retries(2)
            .generate("prompt", "deepseek-r1:7b")
            .await
            .unwrap();
        assert_eq!(text, "{\"score\": 70}");
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_gives_up_after_max_retries() {
        let (url, _server) =
            test_server::serve(vec![(500, json!({"error": "boom"}).to_string())]).await;

        let err = client(&url)
            .generate("prompt", "deepseek-r1:7b")
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Api { status: 500, ref message } if message == "boom"));
    }

    #[tokio::test]
    async fn test_probe_matches_bare_name_against_latest_tag() {
        let tags = json!({"models": [{"name": "qwen2.5:latest"}, {"name": "deepseek-r1:7b"}]})
            .to_string();
        let (url, _server) =
            test_server::serve(vec![(200, tags.clone()), (200, tags.clone()), (200, tags)]).await;
        let client = client(&url);

        assert!(client.probe("deepseek-r1:7b").await.unwrap());
        assert!(client.probe("qwen2.5").await.unwrap());
        assert!(!client.probe("llama3").await.unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_client_never_calls_out() {
        let raw = UnavailableClient::new("offline mode")
            .invoke("prompt", "deepseek-r1:7b")
            .await;
        assert_eq!(raw, RawModelResponse::unavailable("offline mode"));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_error_message_prefers_ollama_error_field() {
        assert_eq!(error_message(r#"{"error":"bad"}"#.to_string()), "bad");
        assert_eq!(error_message("plain".to_string()), "plain");
    }
}
