//! Reqwest-backed Gemini completion adapter.
//!
//! Owns transport details only: request shaping, the API-key header, timeout
//! and HTTP status mapping, and extraction of the first candidate's text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{GenerateContentRequestDto, GenerateContentResponseDto, PartDto};
use crate::domain::ports::{AiCompletionError, AiCompletionSource, CompletionRequest};

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini source posting to `{endpoint}/models/{model}:generateContent`.
pub struct GeminiHttpSource {
    client: Client,
    url: Url,
    api_key: Zeroizing<String>,
}

impl GeminiHttpSource {
    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Fails when the model name does not form a valid URL or the reqwest
    /// client cannot be constructed.
    pub fn new(
        endpoint: &Url,
        model: &str,
        api_key: Zeroizing<String>,
        timeout: Duration,
    ) -> Result<Self, GeminiSetupError> {
        let base = endpoint.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/models/{model}:generateContent"))
            .map_err(|err| GeminiSetupError::Url(err.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GeminiSetupError::Client(err.to_string()))?;
        Ok(Self {
            client,
            url,
            api_key,
        })
    }

    /// Fully resolved request URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Construction failures for [`GeminiHttpSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeminiSetupError {
    #[error("invalid Gemini URL: {0}")]
    Url(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

fn image_reference(image_url: &str) -> String {
    format!("Image URL: {image_url}")
}

#[async_trait]
impl AiCompletionSource for GeminiHttpSource {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiCompletionError> {
        let image_part = request.image_url.as_deref().map(image_reference);
        let mut parts = vec![PartDto {
            text: request.prompt.as_str(),
        }];
        if let Some(text) = image_part.as_deref() {
            parts.push(PartDto { text });
        }
        let body = GenerateContentRequestDto::from_parts(parts);

        let response = self
            .client
            .post(self.url.clone())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        parse_completion(bytes.as_ref())
    }
}

fn parse_completion(body: &[u8]) -> Result<String, AiCompletionError> {
    let decoded: GenerateContentResponseDto = serde_json::from_slice(body).map_err(|err| {
        AiCompletionError::invalid_response(format!("invalid Gemini JSON payload: {err}"))
    })?;
    decoded
        .into_first_text()
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AiCompletionError::invalid_response("response held no candidate text"))
}

fn map_transport_error(error: reqwest::Error) -> AiCompletionError {
    // The key is sent as a header, never in the URL reqwest echoes here.
    if error.is_timeout() {
        AiCompletionError::timeout(error.to_string())
    } else {
        AiCompletionError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AiCompletionError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => AiCompletionError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AiCompletionError::timeout(message)
        }
        _ if status.is_client_error() => AiCompletionError::invalid_request(message),
        _ => AiCompletionError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
