use crate::config::Preferences;
use crate::flatpak::LocalPackageManager;
use crate::models::{clean_argument, QueryEvent, ResultItem, ResultLimit};
use crate::presenter::ResultPresenter;
use std::sync::Arc;

/// Installed-apps keyword handler. Runs immediately; the local listing is cheap.
pub struct LocalSearch {
    packages: Arc<dyn LocalPackageManager>,
    presenter: Arc<ResultPresenter>,
}

impl LocalSearch {
    pub fn new(packages: Arc<dyn LocalPackageManager>, presenter: Arc<ResultPresenter>) -> Self {
        Self {
            packages,
            presenter,
        }
    }

    /// `None` when the event belongs to another keyword.
    pub async fn on_event(
        &self,
        event: &QueryEvent,
        prefs: &Preferences,
    ) -> Option<Vec<ResultItem>> {
        if event.keyword != prefs.local_keyword {
            return None;
        }

        let query = clean_argument(event.argument.as_deref());
        if query.is_empty() {
            return Some(vec![]);
        }

        let limit = ResultLimit::parse(&prefs.results_limit);
        let apps = self.packages.list_installed(&query, limit.get()).await;
        Some(self.presenter.present_local(apps).await)
    }
}
