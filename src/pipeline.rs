// Widget pipeline.
// Resolves widgets to gists, loads comments through the cache, and patches rendered bodies in.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::cache::{CommentCache, FileStore, KeyValueStore, TimedCache};
use crate::config::Config;
use crate::dom::{self, Element, Node};
use crate::error::{HubbubError, Result};
use crate::github::{Comment, CommentSource, FixtureSource, GitHubSource};
use crate::render;

/// Where a widget's comment list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    Cached,
    Fetched,
    /// Fetch failed; an inline error note was appended.
    Failed,
}

/// Final state of one comment body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOutcome {
    Cached,
    Rendered,
    /// Rendering failed; the body keeps its placeholder.
    Failed,
}

/// What happened while loading one widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetReport {
    pub gist_id: String,
    pub list: ListOutcome,
    /// One entry per comment, in source order.
    pub bodies: Vec<BodyOutcome>,
}

/// Build the comment source the config asks for.
pub fn source_from_config(config: &Config) -> Result<Arc<dyn CommentSource>> {
    match &config.fixtures_dir {
        Some(dir) => Ok(Arc::new(FixtureSource::new(dir))),
        None => Ok(Arc::new(GitHubSource::from_config(config)?)),
    }
}

/// Build the persistent store the config asks for.
pub fn store_from_config(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match &config.cache_dir {
        Some(dir) => Ok(Arc::new(FileStore::new(dir))),
        None => Ok(Arc::new(FileStore::open_default()?)),
    }
}

/// Loads gist comments into widget elements.
pub struct Hubbub {
    config: Config,
    source: Arc<dyn CommentSource>,
    cache: CommentCache,
}

impl Hubbub {
    pub fn new(
        config: Config,
        source: Arc<dyn CommentSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let cache = CommentCache::new(store, &config);
        Self {
            config,
            source,
            cache,
        }
    }

    /// Wire up the configured source and on-disk cache.
    pub fn from_config(config: Config) -> Result<Self> {
        let source = source_from_config(&config)?;
        let store = store_from_config(&config)?;
        Ok(Self::new(config, source, store))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &CommentCache {
        &self.cache
    }

    /// Load every given widget. Widgets proceed independently.
    pub async fn init<'a>(
        &self,
        widgets: impl IntoIterator<Item = &'a mut Element>,
    ) -> Vec<Result<WidgetReport>> {
        let reports = join_all(widgets.into_iter().map(|w| self.load_widget(w))).await;
        for err in reports.iter().filter_map(|r| r.as_ref().err()) {
            warn!(error = %err, "widget skipped");
        }
        reports
    }

    /// Find the widgets under `root` by CSS class and load them.
    pub async fn render_page(&self, root: &mut Element) -> Vec<Result<WidgetReport>> {
        let widgets = dom::find_widgets(root, &self.config.css_class);
        info!(count = widgets.len(), "discovered widgets");
        self.init(widgets).await
    }

    /// Create a widget for `gist_ref` under `parent` and load it.
    ///
    /// `gist_ref` is whatever the configured variant's attribute holds.
    pub async fn append_widget(&self, parent: &mut Element, gist_ref: &str) -> Result<WidgetReport> {
        parent.append(
            Element::new("div")
                .with_class(&self.config.css_class)
                .with_attr(self.config.variant.attribute(), gist_ref),
        );
        let widget = parent
            .children
            .last_mut()
            .and_then(Node::as_element_mut)
            .ok_or_else(|| HubbubError::Other("appended widget missing".into()))?;
        self.load_widget(widget).await
    }

    /// Run the pipeline on one widget element.
    pub async fn load_widget(&self, widget: &mut Element) -> Result<WidgetReport> {
        let variant = self.config.variant;
        let attr = variant.attribute();
        let reference = widget
            .attr(attr)
            .map(str::to_string)
            .ok_or_else(|| HubbubError::MissingGistId(attr.to_string()))?;
        let gist_id = variant
            .gist_id(&reference)
            .ok_or_else(|| HubbubError::MissingGistId(attr.to_string()))?;

        let (comments, list) = match read_cache(&self.cache.gists, &gist_id) {
            Some(comments) => (comments, ListOutcome::Cached),
            None => match self.source.fetch_comments(&gist_id).await {
                Ok(comments) => {
                    if let Err(e) = self.cache.gists.set(&gist_id, &comments) {
                        warn!(gist_id = %gist_id, error = %e, "failed to cache comments");
                    }
                    (comments, ListOutcome::Fetched)
                }
                Err(e) => {
                    warn!(gist_id = %gist_id, error = %e, "failed to fetch comments");
                    widget.append(render::render_error_note());
                    return Ok(WidgetReport {
                        gist_id,
                        list: ListOutcome::Failed,
                        bodies: Vec::new(),
                    });
                }
            },
        };
        debug!(gist_id = %gist_id, count = comments.len(), outcome = ?list, "comment list ready");

        if variant.clears_widget() {
            widget.clear();
        }
        widget.append(render::render_heading(variant, &reference, comments.len()));

        let now = Utc::now();
        let start = widget.children.len();
        let mut cached = Vec::with_capacity(comments.len());
        for comment in &comments {
            let body = read_cache(&self.cache.markdown, &comment.id.to_string());
            widget.append(render::render_comment(
                variant,
                &reference,
                comment,
                body.as_deref(),
                &now,
            ));
            cached.push(body.is_some());
        }

        let mut bodies: Vec<BodyOutcome> = cached
            .iter()
            .map(|&hit| {
                if hit {
                    BodyOutcome::Cached
                } else {
                    BodyOutcome::Failed
                }
            })
            .collect();

        // Each pending body owns its own block; completions land in any order.
        let pending = widget.children[start..]
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .zip(&comments)
            .enumerate()
            .filter(|(i, _)| !cached[*i])
            .map(|(i, (block, comment))| async move { (i, self.fill_body(block, comment).await) });
        for (i, outcome) in join_all(pending).await {
            bodies[i] = outcome;
        }

        Ok(WidgetReport {
            gist_id,
            list,
            bodies,
        })
    }

    async fn fill_body(&self, block: &mut Element, comment: &Comment) -> BodyOutcome {
        let html = match self.source.render_markdown(comment).await {
            Ok(html) => html,
            Err(e) => {
                warn!(comment_id = comment.id, error = %e, "failed to render comment body");
                return BodyOutcome::Failed;
            }
        };

        if let Err(e) = self.cache.markdown.set(&comment.id.to_string(), &html) {
            warn!(comment_id = comment.id, error = %e, "failed to cache rendered body");
        }
        render::patch_body(block, &html);
        BodyOutcome::Rendered
    }
}

/// Read through the cache, degrading storage errors to a miss.
fn read_cache<T: Serialize + DeserializeOwned>(cache: &TimedCache<T>, id: &str) -> Option<T> {
    let lookup = match cache.has(id) {
        Ok(true) => cache.get(id),
        Ok(false) => Ok(None),
        Err(e) => Err(e),
    };
    lookup.unwrap_or_else(|e| {
        warn!(namespace = ?cache.namespace(), id, error = %e, "cache read failed");
        None
    })
}
