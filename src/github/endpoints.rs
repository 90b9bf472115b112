// GitHub API endpoint functions.
// Typed access to the gist comments and markdown rendering endpoints.

use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, is_gist_id};
use crate::error::{HubbubError, Result};

use super::client::{HttpFetcher, RequestDescriptor, ResponseMode};
use super::source::CommentSource;
use super::types::{Comment, MarkdownRequest};

/// `GET {api}/gists/{id}/comments`
pub fn comments_url(api_base: &str, gist_id: &str) -> String {
    format!("{}/gists/{}/comments", api_base, gist_id)
}

/// `POST {api}/markdown`
pub fn markdown_url(api_base: &str) -> String {
    format!("{}/markdown", api_base)
}

/// Comment source backed by the GitHub REST API.
pub struct GitHubSource {
    fetcher: HttpFetcher,
    api_base: String,
}

impl GitHubSource {
    pub fn new(fetcher: HttpFetcher, api_root: &str) -> Self {
        Self {
            fetcher,
            api_base: api_root.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.token.as_deref())?;
        Ok(Self::new(fetcher, config.api_base()))
    }

    pub fn fetcher(&self) -> &HttpFetcher {
        &self.fetcher
    }

    /// Get all comments on a gist, in API order.
    pub async fn get_gist_comments(&self, gist_id: &str) -> Result<Vec<Comment>> {
        if !is_gist_id(gist_id) {
            return Err(HubbubError::InvalidGistId(gist_id.to_string()));
        }
        let descriptor =
            RequestDescriptor::get(comments_url(&self.api_base, gist_id)).expect(ResponseMode::Json);
        let payload = self.fetcher.request(&descriptor).await?;
        let comments: Vec<Comment> = serde_json::from_value(payload.into_json()?)?;
        Ok(comments)
    }

    /// Render markdown to HTML (returns raw HTML text).
    pub async fn post_markdown(&self, text: &str) -> Result<String> {
        let descriptor =
            RequestDescriptor::post_json(markdown_url(&self.api_base), &MarkdownRequest { text })?;
        let payload = self.fetcher.request(&descriptor).await?;
        Ok(payload.into_text())
    }
}

#[async_trait]
impl CommentSource for GitHubSource {
    async fn fetch_comments(&self, gist_id: &str) -> Result<Vec<Comment>> {
        info!(gist_id, "fetching gist comments");
        self.get_gist_comments(gist_id).await
    }

    async fn render_markdown(&self, comment: &Comment) -> Result<String> {
        info!(comment_id = comment.id, "rendering comment markdown");
        self.post_markdown(&comment.body).await
    }
}
