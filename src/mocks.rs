//! In-memory stand-ins for the network and the `flatpak` CLI.

use crate::flathub_api::CatalogHttp;
use crate::flatpak::{IconLookup, LocalPackageManager};
use crate::icon_cache::IconFetcher;
use crate::models::{InstalledApp, FALLBACK_ICON};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MockCommand {
    pub binary: String,
    pub args: Vec<String>,
}

/// Canned catalog responses. Every request is recorded.
#[derive(Clone)]
pub struct MockCatalogHttp {
    pub requests: Arc<Mutex<Vec<String>>>,
    response: Arc<Mutex<Result<String, String>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl Default for MockCatalogHttp {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalogHttp {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            response: Arc::new(Mutex::new(Ok("[]".to_string()))),
            delay: Arc::new(Mutex::new(None)),
        }
    }

    pub fn mock_body(&self, body: &str) {
        if let Ok(mut r) = self.response.lock() {
            *r = Ok(body.to_string());
        }
    }

    pub fn mock_json(&self, value: serde_json::Value) {
        self.mock_body(&value.to_string());
    }

    pub fn mock_error(&self, error: &str) {
        if let Ok(mut r) = self.response.lock() {
            *r = Err(error.to_string());
        }
    }

    pub fn set_delay(&self, delay: Duration) {
        if let Ok(mut d) = self.delay.lock() {
            *d = Some(delay);
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl CatalogHttp for MockCatalogHttp {
    async fn get_text(&self, url: &str) -> Result<String, String> {
        if let Ok(mut reqs) = self.requests.lock() {
            reqs.push(url.to_string());
        }
        let delay = self.delay.lock().ok().and_then(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.response.lock() {
            Ok(r) => r.clone(),
            Err(_) => Err("Mock poisoned".to_string()),
        }
    }
}

/// Per-URL icon bytes, errors and artificial latency.
#[derive(Clone)]
pub struct MockIconFetcher {
    responses: Arc<Mutex<HashMap<String, Result<Vec<u8>, String>>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockIconFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIconFetcher {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            delays: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn mock_response(&self, url: &str, data: Vec<u8>) {
        if let Ok(mut r) = self.responses.lock() {
            r.insert(url.to_string(), Ok(data));
        }
    }

    pub fn mock_error(&self, url: &str, error: &str) {
        if let Ok(mut r) = self.responses.lock() {
            r.insert(url.to_string(), Err(error.to_string()));
        }
    }

    pub fn mock_delay(&self, url: &str, delay: Duration) {
        if let Ok(mut d) = self.delays.lock() {
            d.insert(url.to_string(), delay);
        }
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls
            .lock()
            .map(|c| c.iter().filter(|u| u.as_str() == url).count())
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl IconFetcher for MockIconFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        let delay = self.delays.lock().ok().and_then(|d| d.get(url).copied());
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        match self.responses.lock() {
            Ok(r) => r
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(format!("Mock 404: {}", url))),
            Err(_) => Err("Mock poisoned".to_string()),
        }
    }
}

/// Simulated Flatpak installation. Records the CLI invocations it stands in for.
#[derive(Clone)]
pub struct MockPackageManager {
    pub command_history: Arc<Mutex<Vec<MockCommand>>>,
    installed: Arc<Mutex<HashSet<String>>>,
    listing: Arc<Mutex<Vec<InstalledApp>>>,
}

impl Default for MockPackageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPackageManager {
    pub fn new() -> Self {
        Self {
            command_history: Arc::new(Mutex::new(Vec::new())),
            installed: Arc::new(Mutex::new(HashSet::new())),
            listing: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_installed(&self, app_id: &str, installed: bool) {
        if let Ok(mut set) = self.installed.lock() {
            if installed {
                set.insert(app_id.to_string());
            } else {
                set.remove(app_id);
            }
        }
    }

    pub fn add_listing(&self, name: &str, app_id: &str) {
        if let Ok(mut list) = self.listing.lock() {
            list.push(InstalledApp {
                name: name.to_string(),
                app_id: app_id.to_string(),
            });
        }
    }

    fn record(&self, args: &[&str]) {
        if let Ok(mut hist) = self.command_history.lock() {
            hist.push(MockCommand {
                binary: "flatpak".to_string(),
                args: args.iter().map(|s| s.to_string()).collect(),
            });
        }
    }
}

#[async_trait::async_trait]
impl LocalPackageManager for MockPackageManager {
    async fn is_installed(&self, app_id: &str) -> bool {
        self.record(&["info", app_id]);
        self.installed
            .lock()
            .map(|set| set.contains(app_id))
            .unwrap_or(false)
    }

    async fn list_installed(&self, filter: &str, limit: usize) -> Vec<InstalledApp> {
        self.record(&["list", "--app", "--columns=name,application"]);
        let entries = self.listing.lock().map(|l| l.clone()).unwrap_or_default();
        crate::flatpak::fuzzy_filter(entries, filter, limit)
    }
}

/// Icon directory stand-in: known ids map to a path, everything else gets the fallback.
#[derive(Clone, Default)]
pub struct MockIconLookup {
    icons: Arc<Mutex<HashMap<String, String>>>,
}

impl MockIconLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_icon(&self, app_id: &str, path: &str) {
        if let Ok(mut icons) = self.icons.lock() {
            icons.insert(app_id.to_string(), path.to_string());
        }
    }
}

#[async_trait::async_trait]
impl IconLookup for MockIconLookup {
    async fn find(&self, app_id: &str) -> String {
        self.icons
            .lock()
            .ok()
            .and_then(|icons| icons.get(app_id).cloned())
            .unwrap_or_else(|| FALLBACK_ICON.to_string())
    }
}
