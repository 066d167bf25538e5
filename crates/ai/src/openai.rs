//! Client for the OpenAI `images/edits` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use printshop_core::imaging;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::gemini::DEFAULT_CALL_TIMEOUT;
use crate::provider::ImageProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-image-1";

/// Error code OpenAI uses when its moderation refuses a request.
const MODERATION_CODE: &str = "moderation_blocked";

#[derive(Debug, Clone)]
pub struct OpenAiImageConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAiImageConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

pub struct OpenAiImageClient {
    client: reqwest::Client,
    config: OpenAiImageConfig,
}

#[derive(Debug, Deserialize)]
struct EditResponse {
    #[serde(default)]
    data: Vec<EditDatum>,
}

#[derive(Debug, Deserialize)]
struct EditDatum {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
}

impl OpenAiImageClient {
    pub fn new(config: OpenAiImageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn call(&self, image: &[u8], prompt: &str) -> Result<Vec<Vec<u8>>, ProviderError> {
        let png = imaging::to_png(image)?;
        let image_part = Part::bytes(png)
            .file_name("image.png")
            .mime_str(imaging::DEFAULT_MIME)?;
        let form = Form::new()
            .text("model", self.config.model.clone())
            .text("prompt", prompt.to_string())
            .text("n", "1")
            .part("image", image_part);

        let response = self
            .client
            .post(format!("{}/images/edits", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.timeout)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(classify_failure(status.as_u16(), body));
        }

        let parsed: EditResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        let images: Vec<Vec<u8>> = parsed
            .data
            .into_iter()
            .filter_map(|d| d.b64_json)
            .filter_map(|b64| BASE64.decode(b64.as_bytes()).ok())
            .collect();
        if images.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(images)
    }
}

/// Map a failed response, recognising moderation refusals.
fn classify_failure(status: u16, body: String) -> ProviderError {
    let code = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|e| e.error.code);
    match code {
        Some(code) if code == MODERATION_CODE => ProviderError::SafetyBlocked { reason: code },
        _ => ProviderError::Api { status, body },
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageClient {
    fn name(&self) -> &'static str {
        "openai-image"
    }

    async fn edit_single(
        &self,
        cancel: &CancellationToken,
        image: &[u8],
        prompt: &str,
    ) -> Result<Vec<Vec<u8>>, ProviderError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = self.call(image, prompt) => result,
        }
    }
}
