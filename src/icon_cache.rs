use crate::models::FALLBACK_ICON;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const ICON_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const CACHE_DIR_NAME: &str = "flathub-search-icons";

/// Blocking byte source for icon downloads. Runs on pool workers.
pub trait IconFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String>;
}

pub struct HttpIconFetcher {
    timeout: Duration,
}

impl Default for HttpIconFetcher {
    fn default() -> Self {
        Self::new(ICON_FETCH_TIMEOUT)
    }
}

impl HttpIconFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl IconFetcher for HttpIconFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        // Built per call: a blocking client must not be created or dropped on an async thread.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| format!("Client error: {}", e))?;

        let resp = client
            .get(url)
            .send()
            .map_err(|e| format!("Request error: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        resp.bytes()
            .map(|b| b.to_vec())
            .map_err(|e| format!("Bytes error: {}", e))
    }
}

/// Deterministic cache key for an icon URL.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join(CACHE_DIR_NAME)
}

/// Content-addressed icon store: `<dir>/<sha256(url)>.png`.
///
/// Entries never expire and failed downloads are not remembered, so the next
/// resolve of the same URL tries the network again.
pub struct IconCache {
    dir: PathBuf,
    fetcher: Arc<dyn IconFetcher>,
    fallback: PathBuf,
}

impl IconCache {
    pub fn new(dir: impl Into<PathBuf>, fetcher: Arc<dyn IconFetcher>) -> Self {
        Self {
            dir: dir.into(),
            fetcher,
            fallback: PathBuf::from(FALLBACK_ICON),
        }
    }

    pub fn fallback(&self) -> &Path {
        &self.fallback
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.png", cache_key(url)))
    }

    pub fn resolve(&self, url: &str) -> PathBuf {
        let path = self.path_for(url);
        if path.exists() {
            return path;
        }

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            log::warn!("Icon cache dir {:?} unavailable: {}", self.dir, e);
            return self.fallback.clone();
        }

        let bytes = match self.fetcher.fetch(url) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::debug!("Icon fetch failed for {}: {}", url, e);
                return self.fallback.clone();
            }
        };

        match self.store(&path, &bytes) {
            Ok(()) => path,
            Err(e) => {
                log::warn!("Could not cache icon {}: {}", url, e);
                self.fallback.clone()
            }
        }
    }

    // Write to a sibling temp file and rename, so a concurrent resolve of the
    // same URL never sees a half-written icon.
    fn store(&self, path: &Path, bytes: &[u8]) -> Result<(), String> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| e.to_string())?;
        tmp.write_all(bytes).map_err(|e| e.to_string())?;
        tmp.flush().map_err(|e| e.to_string())?;
        tmp.persist(path).map_err(|e| e.error.to_string())?;
        Ok(())
    }
}
