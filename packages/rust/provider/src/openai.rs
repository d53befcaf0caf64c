//! OpenAI-compatible `chat/completions` client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use slidesmith_shared::{ProviderConfig, Result, SlidesmithError};

use crate::{CompletionProvider, CompletionRequest};

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("slidesmith/", env!("CARGO_PKG_VERSION"));

/// Error code the provider uses for an exhausted account.
const QUOTA_ERROR_CODE: &str = "insufficient_quota";

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 300;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

// ---------------------------------------------------------------------------
// OpenAiProvider
// ---------------------------------------------------------------------------

/// HTTP provider for OpenAI-compatible APIs.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiProvider {
    /// Build a provider from resolved runtime configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SlidesmithError::Provider(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/chat/completions",
            config.base_url.as_str().trim_end_matches('/')
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    /// The full completions URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    #[instrument(skip_all, fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SlidesmithError::Provider(format!("request timed out: {e}"))
                } else {
                    SlidesmithError::Provider(format!("{}: {e}", self.endpoint))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SlidesmithError::Provider(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(classify_failure(status, &text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            SlidesmithError::Provider(format!("invalid completion response: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SlidesmithError::Provider("completion had no message content".into()))?;

        debug!(chars = content.len(), "completion received");
        Ok(content)
    }
}

/// Map a non-success HTTP response to the right error variant.
fn classify_failure(status: StatusCode, body: &str) -> SlidesmithError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let quota_code = envelope.as_ref().is_some_and(|env| {
        env.error.code.as_deref() == Some(QUOTA_ERROR_CODE)
            || env.error.kind.as_deref() == Some(QUOTA_ERROR_CODE)
    });

    let message = envelope
        .and_then(|env| env.error.message)
        .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect());

    if status == StatusCode::TOO_MANY_REQUESTS || quota_code {
        warn!(%status, "provider reports quota exhaustion");
        return SlidesmithError::QuotaExceeded(format!("HTTP {status}: {message}"));
    }

    SlidesmithError::Provider(format!("HTTP {status}: {message}"))
}
