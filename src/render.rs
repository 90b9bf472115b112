// Comment markup construction.
// Pure builders for the heading, comment blocks, and relative timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::WidgetVariant;
use crate::dom::{Element, Node};
use crate::github::Comment;

pub const CONTAINER_CLASS: &str = "hubbub-container";
pub const BODY_CLASS: &str = "hubbub-comment-body";
pub const TIMESTAMP_CLASS: &str = "hubbub-timestamp";
pub const AVATAR_SIZE: u32 = 48;

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3600.0;
const DAY: f64 = 86400.0;

/// Round half up, as browsers do.
fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Describe an age in seconds ("2 minutes ago", "an hour ago", "yesterday").
pub fn relative_time(diff_secs: i64) -> String {
    let diff = diff_secs as f64;
    if diff < HOUR {
        format!("{} minutes ago", round_half_up(diff / MINUTE))
    } else if diff < DAY {
        match round_half_up(diff / HOUR) {
            1 => "an hour ago".to_string(),
            hours => format!("{} hours ago", hours),
        }
    } else {
        match round_half_up(diff / DAY) {
            1 => "yesterday".to_string(),
            days => format!("{} days ago", days),
        }
    }
}

/// Format `timestamp` relative to `now`.
pub fn format_relative_time(timestamp: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let diff_ms = now.signed_duration_since(*timestamp).num_milliseconds();
    relative_time(round_half_up(diff_ms as f64 / 1000.0))
}

/// Heading placed above the comments.
pub fn render_heading(variant: WidgetVariant, gist_url: &str, count: usize) -> Element {
    if !variant.heading_shows_count() {
        return Element::new("h3").with_text("Comments");
    }
    Element::new("h3").with_class("heading").with_child(
        Element::new("a")
            .with_attr("href", gist_url)
            .with_text(format!("Comments ({})", count)),
    )
}

/// Inline note shown when the comment list could not be fetched.
pub fn render_error_note() -> Element {
    Element::new("small").with_text("Error fetching Comments")
}

/// One comment block: avatar, header, and body.
///
/// `body_html` is the rendered markdown when already known; otherwise the
/// body holds the variant's placeholder until [`patch_body`] fills it.
pub fn render_comment(
    variant: WidgetVariant,
    gist_url: &str,
    comment: &Comment,
    body_html: Option<&str>,
    now: &DateTime<Utc>,
) -> Element {
    let content = Element::new("div")
        .with_class("hubbub-content")
        .with_child(render_header(variant, gist_url, comment, now))
        .with_child(render_body(variant, comment, body_html));

    Element::new("div")
        .with_class(CONTAINER_CLASS)
        .with_child(render_avatar(variant, comment))
        .with_child(content)
}

/// Replace a comment block's body with rendered markup.
///
/// Returns false when the block has no body element.
pub fn patch_body(block: &mut Element, html: &str) -> bool {
    match block.find_by_class_mut(BODY_CLASS) {
        Some(body) => {
            body.set_inner_html(html);
            true
        }
        None => false,
    }
}

fn render_avatar(variant: WidgetVariant, comment: &Comment) -> Element {
    let img = Element::new("img")
        .with_class("hubbub-avatar")
        .with_attr("src", comment.user.avatar_url.as_deref().unwrap_or_default())
        .with_attr("width", AVATAR_SIZE)
        .with_attr("height", AVATAR_SIZE);

    if !variant.links_avatar() {
        return img;
    }
    Element::new("a")
        .with_attr("href", &comment.user.html_url)
        .with_class("hubbub-avatar-link")
        .with_child(img)
}

fn render_header(
    variant: WidgetVariant,
    gist_url: &str,
    comment: &Comment,
    now: &DateTime<Utc>,
) -> Element {
    let username = Element::new("a")
        .with_class("hubbub-username")
        .with_attr("href", &comment.user.html_url);
    let username = if variant.bold_username() {
        username.with_child(Element::new("b").with_text(&comment.user.login))
    } else {
        username.with_text(&comment.user.login)
    };

    let permalink = if variant.permalink_from_gist_url() {
        format!("{}#comment-{}", gist_url, comment.id)
    } else {
        comment.url.clone()
    };

    Element::new("div")
        .with_class("hubbub-header")
        .with_child(username)
        .with_child(
            Element::new("a")
                .with_class("hubbub-permalink")
                .with_attr("href", permalink)
                .with_text("commented"),
        )
        .with_child(render_timestamp(&comment.created_at, now))
}

fn render_timestamp(created_at: &DateTime<Utc>, now: &DateTime<Utc>) -> Element {
    let stamp = created_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    Element::new("time")
        .with_class(TIMESTAMP_CLASS)
        .with_attr("datetime", &stamp)
        .with_attr("title", &stamp)
        .with_text(format_relative_time(created_at, now))
}

fn render_body(variant: WidgetVariant, comment: &Comment, body_html: Option<&str>) -> Element {
    let body = Element::new("div").with_class(BODY_CLASS);
    match body_html {
        Some(html) => body.with_child(Node::Html(html.to_string())),
        None if variant.raw_placeholder() => {
            body.with_child(Element::new("p").with_text(&comment.body))
        }
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::User;
    use chrono::Duration;

    const GIST_URL: &str = "https://gist.github.com/a/1234";

    fn comment(created_at: DateTime<Utc>) -> Comment {
        Comment {
            id: 1,
            body: "**hi** <script>".into(),
            created_at,
            url: "https://api.github.com/gists/1234/comments/1".into(),
            user: User {
                login: "a".into(),
                avatar_url: Some("https://avatars.example/a".into()),
                html_url: "https://github.com/a".into(),
            },
        }
    }

    #[test]
    fn test_relative_time_buckets() {
        assert_eq!(relative_time(120), "2 minutes ago");
        assert_eq!(relative_time(3700), "an hour ago");
        assert_eq!(relative_time(7200), "2 hours ago");
        assert_eq!(relative_time(90000), "yesterday");
        assert_eq!(relative_time(200000), "2 days ago");
    }

    #[test]
    fn test_relative_time_rounds_half_up() {
        assert_eq!(relative_time(89), "1 minutes ago");
        assert_eq!(relative_time(90), "2 minutes ago");
        assert_eq!(relative_time(5400), "2 hours ago");
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc::now();
        assert_eq!(
            format_relative_time(&(now - Duration::hours(1)), &now),
            "an hour ago"
        );
        assert_eq!(
            format_relative_time(&(now - Duration::days(3)), &now),
            "3 days ago"
        );
    }

    #[test]
    fn test_heading_per_variant() {
        assert_eq!(
            render_heading(WidgetVariant::UrlAttribute, GIST_URL, 3).to_html(),
            "<h3 class=\"heading\"><a href=\"https://gist.github.com/a/1234\">Comments (3)</a></h3>"
        );
        assert_eq!(
            render_heading(WidgetVariant::IdAttribute, GIST_URL, 3).to_html(),
            "<h3>Comments</h3>"
        );
    }

    #[test]
    fn test_url_variant_comment_block() {
        let now = Utc::now();
        let block = render_comment(
            WidgetVariant::UrlAttribute,
            GIST_URL,
            &comment(now - Duration::minutes(5)),
            None,
            &now,
        );

        assert!(block.has_class(CONTAINER_CLASS));
        let avatar_link = block.find_by_class("hubbub-avatar-link").unwrap();
        assert_eq!(avatar_link.attr("href"), Some("https://github.com/a"));
        let permalink = block.find_by_class("hubbub-permalink").unwrap();
        assert_eq!(
            permalink.attr("href"),
            Some("https://gist.github.com/a/1234#comment-1")
        );
        let username = block.find_by_class("hubbub-username").unwrap();
        assert_eq!(username.inner_html(), "<b>a</b>");
        let stamp = block.find_by_class(TIMESTAMP_CLASS).unwrap();
        assert_eq!(stamp.text_content(), "5 minutes ago");

        // Raw markdown placeholder, escaped.
        let body = block.find_by_class(BODY_CLASS).unwrap();
        assert_eq!(body.inner_html(), "<p>**hi** &lt;script&gt;</p>");
    }

    #[test]
    fn test_id_variant_comment_block() {
        let now = Utc::now();
        let block = render_comment(
            WidgetVariant::IdAttribute,
            GIST_URL,
            &comment(now),
            None,
            &now,
        );

        assert!(block.find_by_class("hubbub-avatar-link").is_none());
        assert!(block.find_by_class("hubbub-avatar").is_some());
        let permalink = block.find_by_class("hubbub-permalink").unwrap();
        assert_eq!(
            permalink.attr("href"),
            Some("https://api.github.com/gists/1234/comments/1")
        );
        assert_eq!(block.find_by_class(BODY_CLASS).unwrap().inner_html(), "");
    }

    #[test]
    fn test_cached_body_and_patch() {
        let now = Utc::now();
        let mut block = render_comment(
            WidgetVariant::IdAttribute,
            GIST_URL,
            &comment(now),
            Some("<p>cached</p>"),
            &now,
        );
        assert_eq!(
            block.find_by_class(BODY_CLASS).unwrap().inner_html(),
            "<p>cached</p>"
        );

        assert!(patch_body(&mut block, "<p>fresh</p>"));
        assert_eq!(
            block.find_by_class(BODY_CLASS).unwrap().inner_html(),
            "<p>fresh</p>"
        );
        assert!(!patch_body(&mut Element::new("div"), "<p>x</p>"));
    }
}
