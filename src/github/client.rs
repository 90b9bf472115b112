// HTTP fetcher for the GitHub API.
// Issues single GET/POST requests, tracks rate limits, and parses responses.

use std::sync::Mutex;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{HubbubError, Result};

use super::types::RateLimit;

const GITHUB_API_VERSION: &str = "2022-11-28";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// How the response body is handed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Text,
    Json,
}

/// A parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Json(Value),
}

impl Payload {
    pub fn into_text(self) -> String {
        match self {
            Payload::Text(text) => text,
            Payload::Json(Value::String(text)) => text,
            Payload::Json(value) => value.to_string(),
        }
    }

    pub fn into_json(self) -> Result<Value> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }
}

/// Everything needed to issue one request.
#[derive(Debug, Clone, Default)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    pub content_type: Option<String>,
    pub mode: ResponseMode,
}

impl RequestDescriptor {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// POST with a JSON-encoded body.
    pub fn post_json<T: Serialize + ?Sized>(url: impl Into<String>, body: &T) -> Result<Self> {
        Ok(Self {
            method: Method::Post,
            url: url.into(),
            body: Some(serde_json::to_string(body)?),
            content_type: Some(JSON_CONTENT_TYPE.to_string()),
            mode: ResponseMode::Text,
        })
    }

    pub fn expect(mut self, mode: ResponseMode) -> Self {
        self.mode = mode;
        self
    }
}

/// HTTP client with optional authentication and rate limit tracking.
///
/// One request yields exactly one outcome: no retries, no timeout.
pub struct HttpFetcher {
    client: Client,
    rate_limit: Mutex<RateLimit>,
}

impl HttpFetcher {
    /// Create a fetcher, authenticating with `token` when given.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(token) = token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| HubbubError::Other(e.to_string()))?,
            );
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("hubbub"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(HubbubError::Api)?;

        Ok(Self {
            client,
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    /// Get the last seen rate limit information.
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
            .lock()
            .map(|limit| limit.clone())
            .unwrap_or_default()
    }

    /// Issue the request and parse the body per its response mode.
    pub async fn request(&self, descriptor: &RequestDescriptor) -> Result<Payload> {
        let mut builder = match descriptor.method {
            Method::Get => self.client.get(&descriptor.url),
            Method::Post => self.client.post(&descriptor.url),
        };
        if let Some(content_type) = &descriptor.content_type {
            builder = builder.header(CONTENT_TYPE, content_type.as_str());
        }
        if let Some(body) = &descriptor.body {
            builder = builder.body(body.clone());
        }

        debug!(method = ?descriptor.method, url = %descriptor.url, "sending request");
        let response = builder.send().await.map_err(HubbubError::Api)?;

        self.update_rate_limit(&response);
        let response = self.check_response(response).await?;

        let text = response.text().await.map_err(HubbubError::Api)?;
        match descriptor.mode {
            ResponseMode::Text => Ok(Payload::Text(text)),
            ResponseMode::Json => Ok(Payload::Json(serde_json::from_str(&text)?)),
        }
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&self, response: &Response) {
        let Ok(mut rate_limit) = self.rate_limit.lock() else {
            return;
        };
        if let Some(limit) = header_u64(response, "x-ratelimit-limit") {
            rate_limit.limit = limit;
        }
        if let Some(remaining) = header_u64(response, "x-ratelimit-remaining") {
            rate_limit.remaining = remaining;
        }
        if let Some(reset) = header_u64(response, "x-ratelimit-reset") {
            rate_limit.reset = reset;
        }
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::UNAUTHORIZED => Err(HubbubError::Unauthorized),
            StatusCode::NOT_FOUND => {
                let url = response.url().to_string();
                Err(HubbubError::NotFound(url))
            }
            // Only this response's own headers say the quota is spent.
            StatusCode::FORBIDDEN if header_u64(&response, "x-ratelimit-remaining") == Some(0) => {
                let reset_at = header_u64(&response, "x-ratelimit-reset")
                    .and_then(|reset| chrono::DateTime::from_timestamp(reset as i64, 0))
                    .map(|dt| dt.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                Err(HubbubError::RateLimited { reset_at })
            }
            status => Err(HubbubError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
