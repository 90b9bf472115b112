// Comment data sources.
// The pipeline pulls comment lists and rendered bodies through this seam.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::config::is_gist_id;
use crate::error::{HubbubError, Result};

use super::types::Comment;

/// Where comment lists and rendered markdown come from.
#[async_trait]
pub trait CommentSource: Send + Sync {
    /// Fetch the comments on a gist, in source order.
    async fn fetch_comments(&self, gist_id: &str) -> Result<Vec<Comment>>;

    /// Render a comment's markdown body to HTML.
    async fn render_markdown(&self, comment: &Comment) -> Result<String>;
}

/// Offline source reading `{gist_id}.json` and `{comment_id}.html` files.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read(&self, file: String) -> Result<String> {
        let path = self.dir.join(file);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(HubbubError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(HubbubError::Io(e)),
        }
    }
}

#[async_trait]
impl CommentSource for FixtureSource {
    async fn fetch_comments(&self, gist_id: &str) -> Result<Vec<Comment>> {
        if !is_gist_id(gist_id) {
            return Err(HubbubError::InvalidGistId(gist_id.to_string()));
        }
        info!(gist_id, dir = %self.dir.display(), "reading fixture comments");
        let contents = self.read(format!("{}.json", gist_id)).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn render_markdown(&self, comment: &Comment) -> Result<String> {
        self.read(format!("{}.html", comment.id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const COMMENTS: &str = r#"[{
        "id": 1,
        "body": "**hi**",
        "created_at": "2013-03-11T09:24:13Z",
        "url": "https://api.github.com/gists/1234/comments/1",
        "user": {"login": "a", "avatar_url": null, "html_url": "https://github.com/a"}
    }]"#;

    #[tokio::test]
    async fn test_fixture_source_reads_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("1234.json"), COMMENTS).unwrap();
        fs::write(temp_dir.path().join("1.html"), "<p><strong>hi</strong></p>").unwrap();

        let source = FixtureSource::new(temp_dir.path());
        let comments = source.fetch_comments("1234").await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].user.login, "a");

        let html = source.render_markdown(&comments[0]).await.unwrap();
        assert_eq!(html, "<p><strong>hi</strong></p>");
    }

    #[tokio::test]
    async fn test_fixture_source_missing_and_malformed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("9.json"), "{not json").unwrap();

        let source = FixtureSource::new(temp_dir.path());
        assert!(matches!(
            source.fetch_comments("404").await,
            Err(HubbubError::NotFound(_))
        ));
        assert!(matches!(
            source.fetch_comments("9").await,
            Err(HubbubError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_fixture_source_stays_inside_its_directory() {
        let temp_dir = TempDir::new().unwrap();
        let fixtures = temp_dir.path().join("fixtures");
        fs::create_dir(&fixtures).unwrap();
        fs::write(temp_dir.path().join("secret.json"), COMMENTS).unwrap();

        let source = FixtureSource::new(&fixtures);
        assert!(matches!(
            source.fetch_comments("../secret").await,
            Err(HubbubError::InvalidGistId(id)) if id == "../secret"
        ));
    }
}
