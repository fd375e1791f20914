pub mod local;
pub mod search;

use crate::config::Preferences;
use crate::models::{QueryEvent, ResultItem};
use local::LocalSearch;
use search::FlathubSearch;

/// Where results that arrive after the initial answer are delivered (the host's renderer).
pub trait ResultSink: Send + Sync {
    fn render(&self, event: &QueryEvent, items: Vec<ResultItem>);
}

/// Routes keyword queries: the local keyword lists installed apps, every other
/// keyword searches Flathub.
pub struct Extension {
    prefs: Preferences,
    flathub: FlathubSearch,
    local: LocalSearch,
}

impl Extension {
    pub fn new(prefs: Preferences, flathub: FlathubSearch, local: LocalSearch) -> Self {
        Self {
            prefs,
            flathub,
            local,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// The list to show right away. For Flathub this is the "Searching..."
    /// placeholder; the results follow through the sink.
    pub async fn on_query(&self, event: &QueryEvent) -> Vec<ResultItem> {
        if let Some(items) = self.local.on_event(event, &self.prefs).await {
            return items;
        }
        self.flathub.on_event(event, &self.prefs)
    }
}
