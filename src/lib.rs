// hubbub: GitHub Gist comment widgets.
// Fetches gist comments, renders their markdown, and caches both locally.

pub mod cache;
pub mod config;
pub mod dom;
pub mod error;
pub mod github;
pub mod pipeline;
pub mod render;

pub use config::{Config, StaleRead, WidgetVariant};
pub use dom::{Element, Node};
pub use error::{HubbubError, Result};
pub use pipeline::{BodyOutcome, Hubbub, ListOutcome, WidgetReport};
