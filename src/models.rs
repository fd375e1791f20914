use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::IntErrorKind;
use std::path::PathBuf;

pub const MIN_QUERY_LEN: usize = 2;

pub const RESULTS_LIMIT_MIN: usize = 2;
pub const RESULTS_LIMIT_DEFAULT: usize = 6;
pub const RESULTS_LIMIT_MAX: usize = 20;

/// Icon shown whenever a real one can't be resolved (slow host, missing export, ...).
pub const FALLBACK_ICON: &str = "images/icon.png";
pub const UPDATE_ICON: &str = "images/update.jpg";
pub const REMOVE_ICON: &str = "images/remove.png";
pub const DOWNLOAD_ICON: &str = "images/download.jpg";

pub const FLATHUB_APP_URL: &str = "https://flathub.org/apps";

/// The only condition allowed to leave a component boundary. Everything else
/// degrades to an empty list or a fallback icon where it happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    QueryTooShort { min: usize },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::QueryTooShort { min } => {
                write!(f, "Enter at least {} characters to search", min)
            }
        }
    }
}

impl std::error::Error for SearchError {}

/// Strip launcher placeholder characters from a raw keyword argument.
pub fn clean_argument(argument: Option<&str>) -> String {
    argument.map(|a| a.replace('%', "")).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn parse(raw: &str) -> Result<Self, SearchError> {
        let cleaned = raw.replace('%', "");
        if cleaned.chars().count() < MIN_QUERY_LEN {
            return Err(SearchError::QueryTooShort { min: MIN_QUERY_LEN });
        }
        Ok(Self(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of results to show, always within `[RESULTS_LIMIT_MIN, RESULTS_LIMIT_MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultLimit(usize);

impl Default for ResultLimit {
    fn default() -> Self {
        Self(RESULTS_LIMIT_DEFAULT)
    }
}

impl ResultLimit {
    pub fn new(value: usize) -> Self {
        Self(value.clamp(RESULTS_LIMIT_MIN, RESULTS_LIMIT_MAX))
    }

    /// Parse the free-text preference. Out-of-range numbers are clamped,
    /// anything that isn't a number falls back to the default.
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<i64>() {
            Ok(n) if n < RESULTS_LIMIT_MIN as i64 => Self(RESULTS_LIMIT_MIN),
            Ok(n) if n > RESULTS_LIMIT_MAX as i64 => Self(RESULTS_LIMIT_MAX),
            Ok(n) => Self(n as usize),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => Self(RESULTS_LIMIT_MAX),
                IntErrorKind::NegOverflow => Self(RESULTS_LIMIT_MIN),
                _ => Self::default(),
            },
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteApp {
    pub app_id: String,
    pub name: String,
    pub icon_url: String,
}

impl RemoteApp {
    /// Build from one element of the compat search response. Records missing
    /// any of the three fields are dropped, not reported.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };
        Some(Self {
            app_id: field("flatpakAppId")?,
            name: field("name")?,
            icon_url: field("iconDesktopUrl")?,
        })
    }
}

/// A row of `flatpak list --columns=name,application`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledApp {
    pub name: String,
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconResolution {
    Resolved(PathBuf),
    Fallback,
}

impl IconResolution {
    pub fn display_path(&self) -> String {
        match self {
            IconResolution::Resolved(p) => p.to_string_lossy().to_string(),
            IconResolution::Fallback => FALLBACK_ICON.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedResult {
    pub app: RemoteApp,
    pub icon: IconResolution,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptVerb {
    Install,
    Update,
    Uninstall,
}

impl ScriptVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptVerb::Install => "install",
            ScriptVerb::Update => "update",
            ScriptVerb::Uninstall => "uninstall",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum ItemAction {
    HideWindow,
    RenderResultList(Vec<ResultItem>),
    RunScript {
        script: PathBuf,
        verb: ScriptVerb,
        app_id: String,
        name: String,
    },
    OpenUrl(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub icon: String,
    pub on_enter: ItemAction,
}

impl ResultItem {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, on_enter: ItemAction) -> Self {
        Self {
            name: name.into(),
            description: None,
            icon: icon.into(),
            on_enter,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// One-line informational item that just closes the launcher.
    pub fn message(text: impl Into<String>) -> Self {
        Self::new(text, FALLBACK_ICON, ItemAction::HideWindow)
    }

    pub fn searching() -> Self {
        Self::message("Searching...")
    }

    /// The action submenu this item opens, if any.
    pub fn submenu(&self) -> Option<&[ResultItem]> {
        match &self.on_enter {
            ItemAction::RenderResultList(items) => Some(items),
            _ => None,
        }
    }
}

/// A keyword query as delivered by the host launcher.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryEvent {
    #[serde(default)]
    pub id: u64,
    pub keyword: String,
    #[serde(default)]
    pub argument: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_limit_clamping() {
        assert_eq!(ResultLimit::parse("0").get(), 2);
        assert_eq!(ResultLimit::parse("999").get(), 20);
        assert_eq!(ResultLimit::parse("abc").get(), 6);
        assert_eq!(ResultLimit::parse("10").get(), 10);
        assert_eq!(ResultLimit::parse(" 7 ").get(), 7);
        assert_eq!(ResultLimit::parse("-4").get(), 2);
        assert_eq!(ResultLimit::parse("").get(), 6);
        assert_eq!(ResultLimit::parse("99999999999999999999999").get(), 20);
        assert_eq!(ResultLimit::new(100).get(), 20);
    }

    #[test]
    fn test_short_query_rejected() {
        assert_eq!(
            SearchQuery::parse("f"),
            Err(SearchError::QueryTooShort { min: 2 })
        );
        assert!(SearchQuery::parse("").is_err());
        // Placeholders don't count towards the minimum
        assert!(SearchQuery::parse("f%").is_err());
        assert_eq!(SearchQuery::parse("fi").unwrap().as_str(), "fi");
        // Counted in characters, not bytes
        assert!(SearchQuery::parse("é").is_err());
        assert!(SearchQuery::parse("éa").is_ok());
        // Whitespace counts; the raw argument is never trimmed
        assert_eq!(SearchQuery::parse(" f").unwrap().as_str(), " f");
    }

    #[test]
    fn test_clean_argument() {
        assert_eq!(clean_argument(Some("fire%fox%")), "firefox");
        assert_eq!(clean_argument(None), "");
    }

    #[test]
    fn test_remote_app_requires_all_fields() {
        let ok = json!({
            "flatpakAppId": "org.mozilla.firefox",
            "name": "Firefox",
            "iconDesktopUrl": "https://x/icon.png",
            "summary": "ignored"
        });
        let app = RemoteApp::from_value(&ok).expect("valid record");
        assert_eq!(app.app_id, "org.mozilla.firefox");
        assert_eq!(app.name, "Firefox");

        let missing_icon = json!({ "flatpakAppId": "a.b", "name": "B" });
        assert!(RemoteApp::from_value(&missing_icon).is_none());

        let wrong_type = json!({ "flatpakAppId": 3, "name": "B", "iconDesktopUrl": "u" });
        assert!(RemoteApp::from_value(&wrong_type).is_none());

        let empty_name = json!({ "flatpakAppId": "a.b", "name": "", "iconDesktopUrl": "u" });
        assert!(RemoteApp::from_value(&empty_name).is_none());
    }

    #[test]
    fn test_action_serialization() {
        let action = ItemAction::RunScript {
            script: PathBuf::from("scripts/flatpak-helper.sh"),
            verb: ScriptVerb::Install,
            app_id: "org.gimp.GIMP".to_string(),
            name: "GIMP".to_string(),
        };
        let json = serde_json::to_string(&action).expect("Should serialize");
        assert!(json.contains("RunScript"));
        assert!(json.contains("\"install\""));

        let parsed: ItemAction = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(parsed, action);
    }
}
