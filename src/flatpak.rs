use crate::models::{InstalledApp, FALLBACK_ICON};
use crate::utils;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

pub const FLATPAK_ICON_DIR: &str = "/var/lib/flatpak/exports/share/icons";
pub const ICON_EXTENSIONS: [&str; 3] = ["svg", "png", "jpg"];
pub const ICON_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

const CLI_TIMEOUT: Duration = Duration::from_secs(5);

/// Installed-state and listing queries against the local package manager.
/// Failures are absorbed: "not installed" and "nothing installed".
#[async_trait::async_trait]
pub trait LocalPackageManager: Send + Sync {
    async fn is_installed(&self, app_id: &str) -> bool;
    async fn list_installed(&self, filter: &str, limit: usize) -> Vec<InstalledApp>;
}

/// Finds an icon for an installed app; always yields something displayable.
#[async_trait::async_trait]
pub trait IconLookup: Send + Sync {
    async fn find(&self, app_id: &str) -> String;
}

pub struct FlatpakCli {
    binary: String,
}

impl Default for FlatpakCli {
    fn default() -> Self {
        Self::new("flatpak")
    }
}

impl FlatpakCli {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl LocalPackageManager for FlatpakCli {
    async fn is_installed(&self, app_id: &str) -> bool {
        if let Err(e) = utils::validate_app_id(app_id) {
            log::warn!("{}", e);
            return false;
        }

        let status = tokio::process::Command::new(&self.binary)
            .args(["info", app_id])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(CLI_TIMEOUT, status).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                log::warn!("Failed to run {} info: {}", self.binary, e);
                false
            }
            Err(_) => {
                log::warn!("{} info {} timed out", self.binary, app_id);
                false
            }
        }
    }

    async fn list_installed(&self, filter: &str, limit: usize) -> Vec<InstalledApp> {
        let output = tokio::process::Command::new(&self.binary)
            .args(["list", "--app", "--columns=name,application"])
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(CLI_TIMEOUT, output).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                log::warn!("Failed to run {} list: {}", self.binary, e);
                return vec![];
            }
            Err(_) => {
                log::warn!("{} list timed out", self.binary);
                return vec![];
            }
        };

        if !output.status.success() {
            log::warn!(
                "{} list failed: {}",
                self.binary,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return vec![];
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        fuzzy_filter(parse_listing(&stdout), filter, limit)
    }
}

/// Parse `name\tapplication` lines. Lines without both columns are skipped.
pub fn parse_listing(stdout: &str) -> Vec<InstalledApp> {
    stdout
        .lines()
        .filter_map(|line| {
            let (name, app_id) = line.split_once('\t')?;
            let (name, app_id) = (name.trim(), app_id.trim());
            if name.is_empty() || app_id.is_empty() {
                return None;
            }
            Some(InstalledApp {
                name: name.to_string(),
                app_id: app_id.to_string(),
            })
        })
        .collect()
}

/// Fuzzy-match `query` against the display names, best match first, at most `limit`.
/// An empty query keeps the listing order.
pub fn fuzzy_filter(entries: Vec<InstalledApp>, query: &str, limit: usize) -> Vec<InstalledApp> {
    let query = query.trim();
    if query.is_empty() {
        return entries.into_iter().take(limit).collect();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(i64, InstalledApp)> = entries
        .into_iter()
        .filter_map(|app| matcher.fuzzy_match(&app.name, query).map(|s| (s, app)))
        .collect();
    // Stable, so equal scores keep listing order
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, app)| app).collect()
}

/// Looks up exported icons under the system Flatpak icon tree.
pub struct SystemIconLookup {
    base_dir: PathBuf,
    probe_timeout: Duration,
    hits: moka::sync::Cache<String, String>,
}

impl Default for SystemIconLookup {
    fn default() -> Self {
        Self::new(FLATPAK_ICON_DIR)
    }
}

impl SystemIconLookup {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            probe_timeout: ICON_PROBE_TIMEOUT,
            hits: moka::sync::Cache::builder()
                .max_capacity(500)
                .time_to_live(Duration::from_secs(300))
                .build(),
        }
    }

    /// Blocking search; one bounded probe per extension.
    pub fn find_blocking(&self, app_id: &str) -> Option<PathBuf> {
        find_icon_file(&self.base_dir, app_id, self.probe_timeout)
    }
}

pub fn find_icon_file(base_dir: &Path, app_id: &str, probe_timeout: Duration) -> Option<PathBuf> {
    if !base_dir.exists() {
        return None;
    }
    ICON_EXTENSIONS
        .iter()
        .find_map(|ext| probe(base_dir, &format!("{}.{}", app_id, ext), probe_timeout))
}

fn probe(base_dir: &Path, file_name: &str, timeout: Duration) -> Option<PathBuf> {
    let deadline = Instant::now() + timeout;
    for entry in walkdir::WalkDir::new(base_dir).follow_links(true) {
        if Instant::now() > deadline {
            log::debug!("Icon probe for {} timed out", file_name);
            return None;
        }
        let Ok(entry) = entry else { continue };
        if entry.file_type().is_file() && entry.file_name().to_string_lossy() == file_name {
            return Some(entry.into_path());
        }
    }
    None
}

#[async_trait::async_trait]
impl IconLookup for SystemIconLookup {
    async fn find(&self, app_id: &str) -> String {
        if let Some(hit) = self.hits.get(app_id) {
            return hit;
        }

        let base_dir = self.base_dir.clone();
        let probe_timeout = self.probe_timeout;
        let id = app_id.to_string();
        let found =
            tokio::task::spawn_blocking(move || find_icon_file(&base_dir, &id, probe_timeout))
                .await
                .ok()
                .flatten();

        match found {
            Some(path) => {
                let path = path.to_string_lossy().to_string();
                self.hits.insert(app_id.to_string(), path.clone());
                path
            }
            None => FALLBACK_ICON.to_string(),
        }
    }
}
