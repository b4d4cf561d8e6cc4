//! Ollama chat API adapter.
//!
//! Sends each image as a base64 attachment to `POST {host}/api/chat` with
//! streaming disabled and returns the assistant message.

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use photo_describe_core::{DescriptionService, ServiceError};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Ollama endpoint.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "llava:latest";

/// Description service backed by an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    host: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessageOut<'a>; 1],
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessageOut<'a> {
    role: &'a str,
    content: &'a str,
    images: [String; 1],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessageIn,
}

#[derive(Debug, Deserialize)]
struct ChatMessageIn {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl OllamaClient {
    /// Creates a client for `host` using `model`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> reqwest::Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Model name sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Base URL of the server.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.host)
    }
}

impl DescriptionService for OllamaClient {
    fn describe(
        &self,
        image: &Path,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, ServiceError> {
        let bytes = std::fs::read(image).map_err(|e| {
            ServiceError::Transient(format!("cannot read {}: {e}", image.display()))
        })?;

        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessageOut {
                role: "user",
                content: prompt,
                images: [STANDARD.encode(bytes)],
            }],
            stream: false,
        };

        debug!("POST {} for {}", self.chat_url(), image.display());
        let response = self
            .http
            .post(self.chat_url())
            .timeout(timeout)
            .json(&body)
            .send()
            .map_err(|e| ServiceError::Transient(transport_message(&e, timeout)))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ServiceError::Transient(transport_message(&e, timeout)))?;

        if !status.is_success() {
            return Err(ServiceError::Rejected(rejection_message(status.as_u16(), &text)));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ServiceError::Transient(format!("malformed chat response: {e}")))?;
        Ok(parsed.message.content)
    }
}

fn transport_message(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("request timed out after {}s", timeout.as_secs_f32())
    } else {
        err.to_string()
    }
}

/// Builds the rejection text from an error response, preferring the
/// server's `error` field.
fn rejection_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());
    if detail.is_empty() {
        format!("status code {status}")
    } else {
        format!("{detail} (status code: {status})")
    }
}
