//! In-process cache for public GET responses.
//!
//! Entries live for the configured revalidation window, are bounded by an
//! LRU capacity, and are dropped wholesale whenever an editor write succeeds.

use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use http_body_util::BodyExt;
use lru::LruCache;
use metrics::counter;
use thiserror::Error;
use tokio::sync::RwLock;

pub const METRIC_CACHE_HIT: &str = "crispr_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "crispr_cache_miss_total";
pub const METRIC_CACHE_CLEAR: &str = "crispr_cache_clear_total";

/// Invalidation counter; a response rendered under an older epoch is never stored.
pub type Epoch = u64;

#[derive(Clone)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Arc<RwLock<LruCache<String, CachedResponse>>>,
    epoch: Arc<AtomicU64>,
}

impl ResponseCache {
    /// A zero `ttl` yields a cache that never stores anything.
    pub fn new(ttl: Duration, max_entries: NonZeroUsize) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(LruCache::new(max_entries))),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, NonZeroUsize::MIN)
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Read before rendering a response that may later be stored.
    pub fn epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    pub async fn get(&self, key: &str) -> Option<Response<Body>> {
        if !self.is_enabled() {
            return None;
        }

        // LRU lookups reorder entries, so reads take the write lock.
        let hit = {
            let mut guard = self.entries.write().await;
            match guard.get(key) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.clone()),
                Some(_) => {
                    guard.pop(key);
                    None
                }
                None => None,
            }
        };

        match hit {
            Some(entry) => {
                counter!(METRIC_CACHE_HIT).increment(1);
                Some(entry.into_response())
            }
            None => {
                counter!(METRIC_CACHE_MISS).increment(1);
                None
            }
        }
    }

    /// Store `response` unless the cache was invalidated after `observed` was read.
    ///
    /// Returns whether the entry was kept.
    pub async fn put(&self, key: String, response: CachedResponse, observed: Epoch) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let mut guard = self.entries.write().await;
        if self.epoch.load(Ordering::SeqCst) != observed {
            return false;
        }
        guard.put(key, response);
        true
    }

    /// Buffer `response`, remember it under `key` and hand back an equivalent response.
    pub async fn store_response(
        &self,
        key: &str,
        response: Response,
        observed: Epoch,
    ) -> Result<Response, (Response, CacheStoreError)> {
        let (rebuilt, cached) = buffer_response(response).await?;
        self.put(key.to_string(), cached, observed).await;
        Ok(rebuilt)
    }

    pub async fn invalidate_all(&self) {
        let mut guard = self.entries.write().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if !guard.is_empty() {
            counter!(METRIC_CACHE_CLEAR).increment(1);
        }
        guard.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[derive(Clone)]
pub struct CachedResponse {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
    inserted_at: Instant,
}

impl CachedResponse {
    pub fn new(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers: headers
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            body,
            inserted_at: Instant::now(),
        }
    }

    fn into_response(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.clear();
        for (name, value) in self.headers {
            headers.append(name, value);
        }

        response
    }
}

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("failed to buffer response body: {0}")]
    Buffer(String),
}

/// Only successful responses that do not set cookies are shared between clients.
pub fn should_store_response(response: &Response) -> bool {
    response.status().is_success() && !response.headers().contains_key(header::SET_COOKIE)
}

pub async fn buffer_response(
    response: Response,
) -> Result<(Response, CachedResponse), (Response, CacheStoreError)> {
    let (parts, body) = response.into_parts();
    match BodyExt::collect(body).await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            let cached = CachedResponse::new(parts.status, &parts.headers, bytes.clone());
            let rebuilt = Response::from_parts(parts, Body::from(bytes));
            Ok((rebuilt, cached))
        }
        Err(error) => {
            let rebuilt = Response::from_parts(parts, Body::empty());
            Err((rebuilt, CacheStoreError::Buffer(error.to_string())))
        }
    }
}
