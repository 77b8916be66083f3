//! AI gateway client for chat completions.
//!
//! This module provides an HTTP client for the OpenAI-compatible completion
//! endpoint used to generate recipe summaries.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use log::*;
use serde::{Deserialize, Serialize};
use service::config::Config;

/// User-facing message returned when the AI gateway rate limits us.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit erreicht. Bitte versuche es später erneut.";

/// User-facing message returned when the AI gateway reports exhausted credits.
pub const OUT_OF_CREDITS_MESSAGE: &str = "Keine Credits verfügbar. Bitte füge Credits hinzu.";

/// One message in a chat completion conversation
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request to the chat completions endpoint
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Response from the chat completions endpoint
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// The content of the first choice, if the gateway returned one.
    pub fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}

/// AI gateway client authenticated with the configured API key
pub struct AiGatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl AiGatewayClient {
    /// Create a new AI gateway client with authentication
    pub fn new(config: &Config) -> Result<Self, Error> {
        let api_key = config.ai_gateway_api_key().ok_or_else(|| {
            warn!("Failed to get AI gateway API key from config");
            Error {
                source: None,
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
            }
        })?;

        let headers = build_auth_headers(&api_key)?;
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.ai_gateway_base_url().trim_end_matches('/').to_string(),
        })
    }

    /// Request a single chat completion
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, Error> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        debug!("Requesting chat completion from model {}", request.model);

        let response = self.client.post(&url).json(request).send().await.map_err(|e| {
            warn!("Failed to reach AI gateway: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("AI gateway rate limited the completion request");
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::RateLimited(
                    RATE_LIMIT_MESSAGE.to_string(),
                )),
            });
        }
        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            warn!("AI gateway reports exhausted credits");
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::OutOfCredits(
                    OUT_OF_CREDITS_MESSAGE.to_string(),
                )),
            });
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("AI gateway error: {} - {}", status, error_text);
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                    "AI Gateway Error".to_string(),
                )),
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse AI gateway response: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                    "Invalid response from AI gateway".to_string(),
                )),
            }
        })?;

        Ok(completion)
    }
}

/// Build authentication headers for the AI gateway
fn build_auth_headers(api_key: &str) -> Result<reqwest::header::HeaderMap, Error> {
    let mut headers = reqwest::header::HeaderMap::new();

    let auth_value = format!("Bearer {}", api_key);
    let mut auth_header = reqwest::header::HeaderValue::from_str(&auth_value).map_err(|err| {
        warn!("Failed to create authorization header value: {err:?}");
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to create authorization header value".to_string(),
            )),
        }
    })?;
    auth_header.set_sensitive(true);
    headers.insert(reqwest::header::AUTHORIZATION, auth_header);

    headers.insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    Ok(headers)
}
