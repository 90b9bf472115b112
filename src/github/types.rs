// GitHub API response types.
// Defines structs for deserializing gist comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a gist comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Profile page.
    #[serde(default)]
    pub html_url: String,
}

/// A single comment on a gist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    /// Raw markdown.
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// API url of the comment.
    #[serde(default)]
    pub url: String,
    pub user: User,
}

/// Body of a markdown render request.
#[derive(Debug, Clone, Serialize)]
pub struct MarkdownRequest<'a> {
    pub text: &'a str,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_api_comment() {
        let json = r#"[{
            "id": 86742,
            "url": "https://api.github.com/gists/5129186/comments/86742",
            "body": "Nice **work**",
            "user": {
                "login": "octocat",
                "id": 1,
                "avatar_url": "https://avatars.githubusercontent.com/u/1",
                "html_url": "https://github.com/octocat",
                "type": "User"
            },
            "author_association": "NONE",
            "created_at": "2013-03-11T09:24:13Z",
            "updated_at": "2013-03-11T09:24:13Z"
        }]"#;

        let comments: Vec<Comment> = serde_json::from_str(json).unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, 86742);
        assert_eq!(comments[0].user.login, "octocat");
        assert_eq!(comments[0].created_at.timestamp(), 1_362_993_853);
    }

    #[test]
    fn test_markdown_request_shape() {
        let body = serde_json::to_string(&MarkdownRequest { text: "**hi**" }).unwrap();
        assert_eq!(body, r#"{"text":"**hi**"}"#);
    }
}
