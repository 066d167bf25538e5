//! Client for the Gemini `generateContent` image-editing endpoint.
//!
//! Each call asks for a single candidate. The input is letterboxed to the
//! target aspect before upload; inline image parts of the response are
//! collected as results.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use printshop_core::imaging;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::provider::ImageProvider;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Always applied to each HTTP call, even under an orchestrator deadline,
/// which may cut it shorter.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Aspect ratio the input is scaled to before upload.
pub const TARGET_ASPECT: (u32, u32) = (16, 9);

/// Finish reasons that mark a policy refusal.
const SAFETY_REASONS: [&str; 2] = ["SAFETY", "PROHIBITED_CONTENT"];

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_output_tokens: None,
            temperature: None,
            timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataOut<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataOut<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    candidate_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineDataIn>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataIn {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body<'a>(&self, mime_type: &'a str, image: &[u8], prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::Inline {
                        inline_data: InlineDataOut {
                            mime_type,
                            data: BASE64.encode(image),
                        },
                    },
                    RequestPart::Text { text: prompt },
                ],
            }],
            generation_config: GenerationConfig {
                candidate_count: 1,
                max_output_tokens: self.config.max_output_tokens,
                temperature: self.config.temperature,
            },
        }
    }

    async fn call(&self, image: &[u8], prompt: &str) -> Result<Vec<Vec<u8>>, ProviderError> {
        let input = image.to_vec();
        let scaled = tokio::task::spawn_blocking(move || {
            imaging::scale_to_aspect(&input, TARGET_ASPECT.0, TARGET_ASPECT.1)
        })
        .await
        .map_err(|e| ProviderError::Task(format!("image scaling: {e}")))??;
        let mime_type = imaging::sniff_mime(&scaled);
        let body = self.request_body(mime_type, &scaled, prompt);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        extract_images(parsed)
    }
}

/// Collect decoded image parts, or classify why there are none.
pub fn extract_images(response: GenerateResponse) -> Result<Vec<Vec<u8>>, ProviderError> {
    let mut images = Vec::new();
    let mut safety_reason = None;

    for candidate in response.candidates {
        if let Some(content) = candidate.content {
            for part in content.parts {
                let Some(inline) = part.inline_data else {
                    continue;
                };
                if !inline.mime_type.starts_with("image/") {
                    continue;
                }
                match BASE64.decode(inline.data.as_bytes()) {
                    Ok(bytes) => images.push(bytes),
                    Err(e) => tracing::warn!(error = %e, "Skipping undecodable inline image part"),
                }
            }
        }
        if let Some(reason) = candidate.finish_reason {
            if SAFETY_REASONS.iter().any(|r| r.eq_ignore_ascii_case(&reason)) {
                safety_reason.get_or_insert(reason);
            }
        }
    }

    if !images.is_empty() {
        return Ok(images);
    }
    match safety_reason {
        Some(reason) => Err(ProviderError::SafetyBlocked { reason }),
        None => Err(ProviderError::EmptyResponse),
    }
}

#[async_trait]
impl ImageProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
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
