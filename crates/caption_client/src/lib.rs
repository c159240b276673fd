use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::error::{ApiError, ErrorCode, ProviderErrorEnvelope};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const FALLBACK_CAPTION: &str = "Sharing a moment";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

const CAPTION_PROMPT: &str =
    "Write one short, upbeat social media caption for this image. Reply with the caption only.";

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("caption service unavailable: {0}")]
    Unavailable(String),
    #[error("invalid caption endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("caption request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("caption provider error: {0}")]
    Provider(#[from] ApiError),
    #[error("caption provider returned no text")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionMedia {
    Inline { mime_type: String, bytes: Vec<u8> },
    Url(String),
}

#[async_trait]
pub trait CaptionService: Send + Sync {
    async fn caption(&self, media: &CaptionMedia, hint: Option<&str>)
        -> Result<String, CaptionError>;
    async fn trending_topics(&self, limit: usize) -> Result<Vec<String>, CaptionError>;
}

/// Used when no provider key is configured.
pub struct UnavailableCaptionService {
    reason: String,
}

impl UnavailableCaptionService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CaptionService for UnavailableCaptionService {
    async fn caption(
        &self,
        _media: &CaptionMedia,
        _hint: Option<&str>,
    ) -> Result<String, CaptionError> {
        Err(CaptionError::Unavailable(self.reason.clone()))
    }

    async fn trending_topics(&self, _limit: usize) -> Result<Vec<String>, CaptionError> {
        Err(CaptionError::Unavailable(self.reason.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct CaptionConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

impl CaptionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            api_key: api_key.into(),
        }
    }
}

pub struct HttpCaptionService {
    http: Client,
    endpoint: Url,
}

impl HttpCaptionService {
    pub fn new(config: CaptionConfig) -> Result<Self, CaptionError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Self::with_client(http, config)
    }

    pub fn with_client(http: Client, config: CaptionConfig) -> Result<Self, CaptionError> {
        Ok(Self {
            http,
            endpoint: generate_endpoint(&config)?,
        })
    }

    async fn generate(&self, parts: Vec<RequestPart>) -> Result<String, CaptionError> {
        let body = GenerateRequest {
            contents: vec![RequestContent { parts }],
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(provider_error(status.as_u16(), &raw).into());
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed.text();
        if text.is_empty() {
            return Err(CaptionError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl CaptionService for HttpCaptionService {
    async fn caption(
        &self,
        media: &CaptionMedia,
        hint: Option<&str>,
    ) -> Result<String, CaptionError> {
        let mut prompt = CAPTION_PROMPT.to_string();
        if let Some(hint) = hint.map(str::trim).filter(|hint| !hint.is_empty()) {
            prompt.push_str(&format!(" Context: {hint}"));
        }

        let mut parts = vec![RequestPart::text(prompt)];
        match media {
            CaptionMedia::Inline { mime_type, bytes } => parts.push(RequestPart::InlineData {
                inline_data: InlineData {
                    mime_type: mime_type.clone(),
                    data: STANDARD.encode(bytes),
                },
            }),
            CaptionMedia::Url(url) => parts.push(RequestPart::text(format!("Image: {url}"))),
        }

        let caption = self.generate(parts).await?;
        debug!(chars = caption.len(), "caption generated");
        Ok(caption.trim_matches('"').to_string())
    }

    async fn trending_topics(&self, limit: usize) -> Result<Vec<String>, CaptionError> {
        let prompt = format!(
            "List {limit} currently trending social media topics, one per line, without numbering."
        );
        let raw = self.generate(vec![RequestPart::text(prompt)]).await?;
        let topics = parse_topic_lines(&raw, limit);
        if topics.is_empty() {
            return Err(CaptionError::EmptyResponse);
        }
        Ok(topics)
    }
}

/// Caption text, or [`FALLBACK_CAPTION`] when the service fails.
pub async fn caption_or_fallback(
    service: &dyn CaptionService,
    media: &CaptionMedia,
    hint: Option<&str>,
) -> String {
    match service.caption(media, hint).await {
        Ok(caption) => caption,
        Err(err) => {
            warn!(error = %err, "caption generation failed; using fallback");
            FALLBACK_CAPTION.to_string()
        }
    }
}

fn generate_endpoint(config: &CaptionConfig) -> Result<Url, CaptionError> {
    let mut base = config.base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let mut endpoint = Url::parse(&base)?.join(&format!(
        "v1beta/models/{}:generateContent",
        config.model.trim()
    ))?;
    endpoint
        .query_pairs_mut()
        .append_pair("key", &config.api_key);
    Ok(endpoint)
}

fn provider_error(status: u16, raw: &str) -> ApiError {
    match serde_json::from_str::<ProviderErrorEnvelope>(raw) {
        Ok(envelope) => envelope.error.into(),
        Err(_) => ApiError::new(
            ErrorCode::from_http_status(status),
            format!("http {status}: {}", raw.trim()),
        ),
    }
}

fn parse_topic_lines(raw: &str, limit: usize) -> Vec<String> {
    raw.lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Drops "1.", "2)", "-", "*" and leading '#' from a model-written list line.
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let after_digits = line.trim_start_matches(|c: char| c.is_ascii_digit());
    let line = if after_digits.len() < line.len() {
        after_digits.strip_prefix(['.', ')']).unwrap_or(line)
    } else {
        line
    };
    line.trim_start_matches(['-', '*', '#', ' ']).trim()
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

impl RequestPart {
    fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
