// Time-bucketed cache namespaces.
// Prefixes keys per payload kind and expires entries on read.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{Config, StaleRead};
use crate::error::{HubbubError, Result};
use crate::github::Comment;

use super::store::KeyValueStore;

const CREATED_AT_FIELD: &str = "createdAt";

/// Independent keyspaces sharing one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Comment lists, keyed by gist id.
    Gist,
    /// Rendered comment bodies, keyed by comment id.
    Markdown,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Gist => "hubbub-gist-",
            Namespace::Markdown => "hubbub-markdown-",
        }
    }

    /// Name of the payload field in the stored JSON object.
    pub fn payload_field(&self) -> &'static str {
        match self {
            Namespace::Gist => "comments",
            Namespace::Markdown => "text",
        }
    }

    pub fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix(), id)
    }
}

/// A payload with the time it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub created_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(payload: T, created_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            created_at,
        }
    }

    /// True once the entry is strictly older than `ttl` at `now`.
    ///
    /// Compared in whole milliseconds, the unit `createdAt` is persisted in.
    /// An entry written in the future (clock skew) is not stale.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age_ms = now.timestamp_millis() - self.created_at.timestamp_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        age_ms > ttl_ms
    }
}

impl<T: Serialize> CacheEntry<T> {
    /// Encode as `{"<field>": payload, "createdAt": epoch_millis}`.
    pub fn encode(&self, namespace: Namespace) -> Result<String> {
        let mut object = Map::new();
        object.insert(
            namespace.payload_field().to_string(),
            serde_json::to_value(&self.payload)?,
        );
        object.insert(
            CREATED_AT_FIELD.to_string(),
            Value::from(self.created_at.timestamp_millis()),
        );
        Ok(Value::Object(object).to_string())
    }
}

impl<T: DeserializeOwned> CacheEntry<T> {
    pub fn decode(namespace: Namespace, raw: &str) -> Result<Self> {
        let mut object = match serde_json::from_str::<Value>(raw)? {
            Value::Object(object) => object,
            _ => return Err(HubbubError::Storage("cache entry is not an object".into())),
        };

        let created_at = object
            .get(CREATED_AT_FIELD)
            .and_then(Value::as_i64)
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| HubbubError::Storage("cache entry has no createdAt".into()))?;
        let payload = object
            .remove(namespace.payload_field())
            .ok_or_else(|| {
                HubbubError::Storage(format!(
                    "cache entry has no `{}` field",
                    namespace.payload_field()
                ))
            })?;

        Ok(Self {
            payload: serde_json::from_value(payload)?,
            created_at,
        })
    }
}

/// One namespace of the cache with its own lifetime.
pub struct TimedCache<T> {
    store: Arc<dyn KeyValueStore>,
    namespace: Namespace,
    ttl: Duration,
    stale_read: StaleRead,
    _payload: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> TimedCache<T> {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        namespace: Namespace,
        ttl: Duration,
        stale_read: StaleRead,
    ) -> Self {
        Self {
            store,
            namespace,
            ttl,
            stale_read,
            _payload: PhantomData,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether an entry is stored, expired or not.
    pub fn has(&self, id: &str) -> Result<bool> {
        Ok(self.store.get_item(&self.namespace.key(id))?.is_some())
    }

    pub fn get(&self, id: &str) -> Result<Option<T>> {
        self.get_at(id, Utc::now())
    }

    /// Read an entry as of `now`, purging it if expired.
    ///
    /// Whether an expired payload is still returned depends on the
    /// configured [`StaleRead`] policy.
    pub fn get_at(&self, id: &str, now: DateTime<Utc>) -> Result<Option<T>> {
        let key = self.namespace.key(id);
        let Some(raw) = self.store.get_item(&key)? else {
            return Ok(None);
        };

        let entry = CacheEntry::<T>::decode(self.namespace, &raw)?;
        if !entry.is_expired(self.ttl, now) {
            debug!(key = %key, "cache hit");
            return Ok(Some(entry.payload));
        }

        self.store.remove_item(&key)?;
        match self.stale_read {
            StaleRead::Miss => {
                debug!(key = %key, "cache entry expired");
                Ok(None)
            }
            StaleRead::ReturnOnce => {
                debug!(key = %key, "cache entry expired, serving stale payload once");
                Ok(Some(entry.payload))
            }
        }
    }

    pub fn set(&self, id: &str, payload: &T) -> Result<()> {
        self.set_at(id, payload, Utc::now())
    }

    /// Store `payload` stamped with `now`, replacing any prior entry.
    pub fn set_at(&self, id: &str, payload: &T, now: DateTime<Utc>) -> Result<()> {
        let raw = CacheEntry::new(payload, now).encode(self.namespace)?;
        self.store.set_item(&self.namespace.key(id), &raw)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        self.store.remove_item(&self.namespace.key(id))
    }
}

/// The two namespaces the widget pipeline uses.
pub struct CommentCache {
    pub gists: TimedCache<Vec<Comment>>,
    pub markdown: TimedCache<String>,
}

impl CommentCache {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &Config) -> Self {
        Self {
            gists: TimedCache::new(
                store.clone(),
                Namespace::Gist,
                config.gist_ttl,
                config.stale_read,
            ),
            markdown: TimedCache::new(
                store,
                Namespace::Markdown,
                config.markdown_ttl,
                config.stale_read,
            ),
        }
    }
}
