// Cache module for comment lists and rendered markdown.
// A time-bucketed cache layered over a localStorage-style key-value store.

pub mod namespace;
pub mod paths;
pub mod store;

pub use namespace::{CacheEntry, CommentCache, Namespace, TimedCache};
pub use paths::cache_dir;
pub use store::{FileStore, KeyValueStore, MemoryStore};
