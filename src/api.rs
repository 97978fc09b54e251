use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use crate::analysis::{self, AnalysisOutcome};
use crate::link::Platform;
use crate::product::Product;
use crate::text::{EnhanceStyle, EnhancedText, TextAnalysis};
use crate::trends::{KeywordTrends, PlatformComparison};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("{}", invalid_link_message(.platform))]
    InvalidLink { platform: Option<Platform> },
    #[error("{message}")]
    Network { status: Option<u16>, message: String },
    #[error("The embed service returned no preview for this link.")]
    EmptyEmbed,
    #[error("The server returned an empty response.")]
    EmptyResponse,
    #[error("Unexpected response from server: {0}")]
    MalformedResponse(String),
    #[error("{0}")]
    Backend(String),
}

fn invalid_link_message(platform: &Option<Platform>) -> String {
    match platform {
        Some(platform) => format!("Invalid {} link format.", platform.display_name()),
        None => "Unsupported platform.".to_string(),
    }
}

impl ApiError {
    /// Builds the error for a non-2xx response, preferring the backend's own
    /// `detail`, then `error`, over a generic message.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| backend_message(&value))
            .unwrap_or_else(|| generic_failure(status));
        ApiError::Network {
            status: Some(status),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network { status, .. } => *status,
            _ => None,
        }
    }
}

fn backend_message(value: &Value) -> Option<String> {
    ["detail", "error"].iter().find_map(|key| {
        match value.get(*key)? {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    })
}

pub fn generic_failure(status: u16) -> String {
    format!("Something went wrong while contacting the server (HTTP {status}). Please try again.")
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

/// Blocking client for the VibeCheck backend (`/api/v1`).
pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            bail!("api client user agent required");
        }
        let mut base = config
            .base_url
            .filter(|base| !base.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).with_context(|| format!("api: parse base url {base}"))?;
        if base_url.cannot_be_a_base() {
            bail!("api: base url {base} cannot carry paths");
        }
        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()
                .context("api: build http client")?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches embeddable HTML for a Twitter or Reddit link through the
    /// backend oEmbed proxy.
    pub fn embed_html(&self, platform: Platform, link: &str) -> Result<String, ApiError> {
        if !platform.uses_remote_embed() {
            return Err(ApiError::InvalidLink {
                platform: Some(platform),
            });
        }
        let url = self.endpoint(&["embed", platform.as_str()]);
        let value = match self.send(self.http.get(url).query(&[("url", link)])) {
            Err(ApiError::EmptyResponse) => return Err(ApiError::EmptyEmbed),
            other => other?,
        };
        value
            .get("html")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|html| !html.is_empty())
            .map(str::to_string)
            .ok_or(ApiError::EmptyEmbed)
    }

    /// Runs the social analysis for `link`. The platform id is extracted
    /// locally; nothing is sent when it is missing.
    pub fn analyze_link(&self, platform: Platform, link: &str) -> Result<AnalysisOutcome, ApiError> {
        let id = crate::link::analysis_id(platform, link).ok_or(ApiError::InvalidLink {
            platform: Some(platform),
        })?;
        let param = match platform {
            Platform::YouTube => "video_id",
            Platform::Twitter => "tweet_id",
            Platform::Reddit => "post_id",
        };
        let url = self.endpoint(&["analyze", platform.as_str()]);
        tracing::info!(platform = platform.as_str(), %id, "requesting link analysis");
        let value = self.send(self.http.get(url).query(&[(param, id.as_str())]))?;
        analysis::interpret_payload(value)
    }

    pub fn analyze_text(&self, text: &str) -> Result<TextAnalysis, ApiError> {
        let url = self.endpoint(&["text", "analyze"]);
        let value = self.send(self.http.post(url).json(&json!({ "text": text })))?;
        decode(value)
    }

    pub fn enhance_text(&self, text: &str, style: EnhanceStyle) -> Result<String, ApiError> {
        let url = self.endpoint(&["text", "enhance"]);
        let body = json!({ "text": text, "style": style.as_str() });
        let value = self.send(self.http.post(url).json(&body))?;
        let enhanced: EnhancedText = decode(value)?;
        let text = enhanced.enhanced_text.trim();
        if text.is_empty() {
            return Err(ApiError::MalformedResponse(
                "enhanced text is empty".to_string(),
            ));
        }
        Ok(text.to_string())
    }

    pub fn scrape_product(&self, product_url: &str) -> Result<Product, ApiError> {
        let url = self.endpoint(&["product-analysis", "scrape"]);
        let value = self.send(self.http.post(url).json(&json!({ "url": product_url })))?;
        decode(value)
    }

    pub fn keyword_trends(&self, keyword: &str) -> Result<KeywordTrends, ApiError> {
        let url = self.endpoint(&["social-media", "trends", "keyword", keyword]);
        let value = self.send(self.http.get(url))?;
        decode(value)
    }

    pub fn platform_comparison(&self, keyword: &str) -> Result<PlatformComparison, ApiError> {
        let url = self.endpoint(&["social-media", "platform-comparison", keyword]);
        let value = self.send(self.http.get(url))?;
        decode(value)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn send(&self, req: RequestBuilder) -> Result<Value, ApiError> {
        let resp = req
            .header(USER_AGENT, self.user_agent.clone())
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| {
                tracing::warn!(error = %err, "backend request failed");
                ApiError::Network {
                    status: err.status().map(|status| status.as_u16()),
                    message: format!("Could not reach the analysis server: {err}"),
                }
            })?;

        let status = resp.status();
        let url = resp.url().clone();
        let body = resp.text().map_err(|err| ApiError::Network {
            status: Some(status.as_u16()),
            message: format!("Failed to read server response: {err}"),
        })?;
        tracing::debug!(%url, status = status.as_u16(), bytes = body.len(), "backend response");

        if !status.is_success() {
            let err = ApiError::from_status(status.as_u16(), &body);
            tracing::warn!(%url, status = status.as_u16(), error = %err, "backend returned an error");
            return Err(err);
        }
        if body.trim().is_empty() {
            return Err(ApiError::EmptyResponse);
        }
        serde_json::from_str(&body).map_err(|err| ApiError::MalformedResponse(err.to_string()))
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        if !message.trim().is_empty() {
            return Err(ApiError::Backend(message.to_string()));
        }
    }
    serde_json::from_value(value).map_err(|err| ApiError::MalformedResponse(err.to_string()))
}
