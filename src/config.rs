// Widget configuration.
// Holds API location, cache lifetimes, and the per-variant widget behaviour.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use clap::ValueEnum;
use regex::Regex;

pub const DEFAULT_API_ROOT: &str = "https://api.github.com";
pub const DEFAULT_CSS_CLASS: &str = "hubbub";

/// Comment lists are refreshed hourly.
pub const DEFAULT_GIST_TTL: Duration = Duration::from_secs(60 * 60);

/// Rendered markdown lives six hours.
pub const DEFAULT_MARKDOWN_TTL: Duration = Duration::from_secs(6 * 60 * 60);

static GIST_URL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)/?$").expect("static regex is valid"));

/// Gist ids are non-empty ASCII alphanumerics (numeric or hex).
pub fn is_gist_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// How a widget names its gist and how its markup is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum WidgetVariant {
    /// `data-gist-url="https://gist.github.com/user/1234"`, counted heading,
    /// raw body shown until markdown arrives.
    #[default]
    #[value(name = "url")]
    UrlAttribute,
    /// `data-gist-id="1234"`, plain heading, empty body until markdown arrives.
    #[value(name = "id")]
    IdAttribute,
}

impl WidgetVariant {
    /// Attribute carrying the gist reference.
    pub fn attribute(&self) -> &'static str {
        match self {
            WidgetVariant::UrlAttribute => "data-gist-url",
            WidgetVariant::IdAttribute => "data-gist-id",
        }
    }

    /// Resolve the gist id from the attribute value.
    pub fn gist_id(&self, value: &str) -> Option<String> {
        match self {
            WidgetVariant::UrlAttribute => GIST_URL_ID
                .captures(value.trim())
                .map(|caps| caps[1].to_string()),
            WidgetVariant::IdAttribute => {
                let id = value.trim();
                is_gist_id(id).then(|| id.to_string())
            }
        }
    }

    pub fn heading_shows_count(&self) -> bool {
        matches!(self, WidgetVariant::UrlAttribute)
    }

    /// Whether the raw markdown is shown while the rendered body is pending.
    pub fn raw_placeholder(&self) -> bool {
        matches!(self, WidgetVariant::UrlAttribute)
    }

    pub fn links_avatar(&self) -> bool {
        matches!(self, WidgetVariant::UrlAttribute)
    }

    pub fn bold_username(&self) -> bool {
        matches!(self, WidgetVariant::UrlAttribute)
    }

    /// Permalinks point at the gist page rather than the API comment url.
    pub fn permalink_from_gist_url(&self) -> bool {
        matches!(self, WidgetVariant::UrlAttribute)
    }

    /// Whether existing widget content is replaced before rendering.
    pub fn clears_widget(&self) -> bool {
        matches!(self, WidgetVariant::IdAttribute)
    }
}

/// What a read of an expired cache entry yields.
///
/// The entry is purged from storage either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StaleRead {
    /// Treat the expired entry as absent.
    #[default]
    Miss,
    /// Hand back the stale payload one last time.
    ReturnOnce,
}

/// Runtime configuration for the widget pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_root: String,
    /// Optional bearer token; anonymous requests are heavily rate limited.
    pub token: Option<String>,
    pub css_class: String,
    pub variant: WidgetVariant,
    pub gist_ttl: Duration,
    pub markdown_ttl: Duration,
    pub stale_read: StaleRead,
    /// Serve comments and markdown from this directory instead of the API.
    pub fixtures_dir: Option<PathBuf>,
    /// Override for the on-disk cache location.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            token: None,
            css_class: DEFAULT_CSS_CLASS.to_string(),
            variant: WidgetVariant::default(),
            gist_ttl: DEFAULT_GIST_TTL,
            markdown_ttl: DEFAULT_MARKDOWN_TTL,
            stale_read: StaleRead::default(),
            fixtures_dir: None,
            cache_dir: None,
        }
    }
}

impl Config {
    /// Build a config from defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(root) = present("HUBBUB_API_ROOT") {
            config.api_root = root;
        }
        config.token = present("GITHUB_TOKEN");
        config.fixtures_dir = present("HUBBUB_FIXTURES").map(PathBuf::from);
        config.cache_dir = present("HUBBUB_CACHE_DIR").map(PathBuf::from);
        config
    }

    /// API root without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_root.trim_end_matches('/')
    }
}
