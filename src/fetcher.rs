use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::error::{Result, ScrapeError};

// ============================================================================
// FETCHER TRAIT
// ============================================================================

/// Something that can turn a URL into page markup.
///
/// The scrape pipeline awaits one fetch at a time; an error from here ends
/// the whole run.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String>;
}

// ============================================================================
// HTTP
// ============================================================================

/// Fetches pages over HTTP, optionally through an on-disk cache
pub struct HttpFetcher {
    client: reqwest::Client,
    cache: Option<PageCache>,
}

impl HttpFetcher {
    pub fn new(cache: Option<PageCache>) -> HttpFetcher {
        HttpFetcher {
            client: reqwest::Client::new(),
            cache,
        }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        if let Some(body) = self.cache.as_ref().and_then(|cache| cache.load(url)) {
            debug!("Cached: {}", url);
            return Ok(body);
        }

        debug!("Fetching: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ScrapeError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::FetchStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        })?;

        if let Some(cache) = &self.cache {
            cache.store(url, &body);
        }

        Ok(body)
    }
}

// ============================================================================
// DISK CACHE
// ============================================================================

/// One file per URL, named by the SHA-256 of the URL. Anything younger than the TTL is served without
/// touching the network, whatever the response headers said.
#[derive(Debug, Clone)]
pub struct PageCache {
    dir: PathBuf,
    ttl: Duration,
}

impl PageCache {
    pub fn new(dir: impl Into<PathBuf>) -> PageCache {
        PageCache {
            dir: dir.into(),
            ttl: Duration::hours(24),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> PageCache {
        self.ttl = ttl;
        self
    }

    fn path_for(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        self.dir.join(format!("{:x}.html", hasher.finalize()))
    }

    pub fn get(&self, url: &str) -> Result<Option<String>> {
        let path = self.path_for(url);
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let modified: DateTime<Utc> = metadata.modified()?.into();
        if Utc::now() - modified > self.ttl {
            return Ok(None);
        }

        Ok(Some(fs::read_to_string(&path)?))
    }

    pub fn put(&self, url: &str, body: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(url), body)?;
        Ok(())
    }

    /// Like [`PageCache::get`], but an unreadable cache is only a miss
    pub fn load(&self, url: &str) -> Option<String> {
        self.get(url).unwrap_or_else(|e| {
            warn!("Could not read cache for {}: {}", url, e);
            None
        })
    }

    /// Like [`PageCache::put`], but a failed write is only logged
    pub fn store(&self, url: &str, body: &str) {
        if let Err(e) = self.put(url, body) {
            warn!("Could not cache {}: {}", url, e);
        }
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Serves pages from a map, e.g. pages saved earlier. Unknown URLs are a
/// 404 fetch error.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    pages: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn new() -> MemoryFetcher {
        MemoryFetcher::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<String>) {
        self.pages.insert(url.into(), body.into());
    }
}

impl PageFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Fetching: {}", url);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::FetchStatus {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::new(dir.path().join("cache"));
        let url = "https://example.org/?view=games&team=1";

        assert_eq!(cache.get(url).unwrap(), None);
        cache.put(url, "<html></html>").unwrap();
        assert_eq!(cache.get(url).unwrap().as_deref(), Some("<html></html>"));
    }

    #[test]
    fn test_cache_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::new(dir.path()).with_ttl(Duration::seconds(-1));
        cache.put("https://example.org/", "body").unwrap();
        assert_eq!(cache.get("https://example.org/").unwrap(), None);
    }

    #[test]
    fn test_cache_keeps_similar_urls_apart() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::new(dir.path());

        cache.put("https://example.org/a/b?view=games&team=1", "TEAM ONE").unwrap();
        assert_eq!(cache.get("https://example.org/a_b?view=games_team=1").unwrap(), None);
        assert_eq!(
            cache.get("https://example.org/a/b?view=games&team=1").unwrap().as_deref(),
            Some("TEAM ONE")
        );
    }

    #[test]
    fn test_cache_long_url() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::new(dir.path());
        let url = format!("https://example.org/?view=games&q={}", "x".repeat(300));

        cache.put(&url, "long").unwrap();
        assert_eq!(cache.get(&url).unwrap().as_deref(), Some("long"));
    }

    #[test]
    fn test_unusable_cache_degrades_to_miss() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let cache = PageCache::new(&blocker);

        assert!(cache.put("https://example.org/", "body").is_err());
        cache.store("https://example.org/", "body");
        assert_eq!(cache.load("https://example.org/"), None);
    }

    #[tokio::test]
    async fn test_memory_fetcher_missing_page() {
        let mut fetcher = MemoryFetcher::new();
        fetcher.insert("https://example.org/a", "a");

        assert_eq!(fetcher.fetch("https://example.org/a").await.unwrap(), "a");
        let err = fetcher.fetch("https://example.org/b").await.unwrap_err();
        assert!(err.to_string().contains("https://example.org/b"));
    }
}
