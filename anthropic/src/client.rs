//! Messages API client implementation

use crate::{
    error::ClaudeError,
    messages::{MessagesRequest, MessagesResponse},
};
use reqwest::{Client, StatusCode};

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Messages API client
#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl AnthropicClient {
    /// Create a new client with API key from environment
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::MissingApiKey` if `ANTHROPIC_API_KEY` is not set
    /// or is empty
    pub fn from_env() -> Result<Self, ClaudeError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClaudeError::MissingApiKey)?;

        Ok(Self::new(api_key))
    }

    /// Create a new client with explicit API key
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Builder: point the client at a different API root (no trailing slash)
    #[must_use]
    pub fn with_base_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create messages (non-streaming)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    #[tracing::instrument(skip(self, request), fields(model = %request.model))]
    pub async fn messages(&self, request: MessagesRequest) -> Result<MessagesResponse, ClaudeError> {
        let response = self
            .client
            .post(format!("{}/messages", self.api_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ClaudeError::RequestFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body = response
                    .json::<MessagesResponse>()
                    .await
                    .map_err(|e| ClaudeError::ResponseParseFailed(e.to_string()))?;
                tracing::debug!(
                    input_tokens = body.usage.input_tokens,
                    output_tokens = body.usage.output_tokens,
                    "Messages API call completed"
                );
                Ok(body)
            },
            StatusCode::TOO_MANY_REQUESTS => Err(ClaudeError::RateLimited),
            StatusCode::UNAUTHORIZED => Err(ClaudeError::Unauthorized),
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(status = status.as_u16(), "Messages API returned an error");
                Err(ClaudeError::ApiError {
                    status: status.as_u16(),
                    message: body,
                })
            },
        }
    }
}
