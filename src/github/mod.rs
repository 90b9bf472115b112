// GitHub API module.
// Provides the HTTP fetcher, comment types, and the pluggable comment sources.

pub mod client;
pub mod endpoints;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::{HttpFetcher, Method, Payload, RequestDescriptor, ResponseMode};
pub use endpoints::GitHubSource;
pub use source::{CommentSource, FixtureSource};
pub use types::*;
