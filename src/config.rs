use crate::debounce::DEFAULT_DEBOUNCE;
use crate::enrichment::DEFAULT_JOIN_DEADLINE;
use crate::icon_cache;
use crate::worker_pool::DEFAULT_WORKERS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR: &str = "flathub-search";
const CONFIG_FILE: &str = "preferences.json";

/// User preferences, as the launcher stores them. `results_limit` stays free
/// text on purpose; it is parsed and clamped where it is used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub results_limit: String,
    pub local_keyword: String,
    pub debounce_ms: u64,
    pub join_deadline_ms: u64,
    pub workers: usize,
    pub script_path: PathBuf,
    pub icon_cache_dir: Option<PathBuf>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            results_limit: "6".to_string(),
            local_keyword: "fpl".to_string(),
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            join_deadline_ms: DEFAULT_JOIN_DEADLINE.as_millis() as u64,
            workers: DEFAULT_WORKERS,
            script_path: PathBuf::from("scripts/flatpak-helper.sh"),
            icon_cache_dir: None,
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(CONFIG_FILE))
}

impl Preferences {
    /// Load from `path`, or the per-user config file when `None`. A missing file
    /// means defaults; a broken one is reported and also means defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(p) => p,
            None => return Self::default(),
        };
        if !path.exists() {
            log::debug!("No preferences at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::read(&path) {
            Ok(prefs) => prefs,
            Err(e) => {
                log::warn!("Ignoring preferences at {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&text).map_err(|e| e.to_string())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn join_deadline(&self) -> Duration {
        Duration::from_millis(self.join_deadline_ms)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.icon_cache_dir
            .clone()
            .unwrap_or_else(icon_cache::default_cache_dir)
    }
}
