use crate::config::Preferences;
use crate::debounce::SearchDebouncer;
use crate::enrichment::EnrichmentPipeline;
use crate::flathub_api::CatalogClient;
use crate::models::{clean_argument, QueryEvent, ResultItem, ResultLimit, SearchError};
use crate::presenter::ResultPresenter;
use std::sync::Arc;

use super::ResultSink;

/// Search -> icon fan-out -> join -> present. Never fails: a short query turns
/// into a hint item, everything else at worst into an empty list.
pub async fn run_search(
    catalog: &CatalogClient,
    pipeline: &EnrichmentPipeline,
    presenter: &ResultPresenter,
    query: &str,
    limit: ResultLimit,
) -> Vec<ResultItem> {
    let apps = match catalog.search(query, limit).await {
        Ok(apps) => apps,
        Err(e @ SearchError::QueryTooShort { .. }) => {
            return vec![ResultItem::message(e.to_string())]
        }
    };

    let pending = pipeline.fan_out(apps);
    let enriched = pipeline.join(pending).await;
    presenter.present_remote(enriched).await
}

/// Remote Flathub keyword handler.
pub struct FlathubSearch {
    catalog: Arc<CatalogClient>,
    pipeline: Arc<EnrichmentPipeline>,
    presenter: Arc<ResultPresenter>,
    debouncer: SearchDebouncer,
    sink: Arc<dyn ResultSink>,
}

impl FlathubSearch {
    pub fn new(
        catalog: Arc<CatalogClient>,
        pipeline: Arc<EnrichmentPipeline>,
        presenter: Arc<ResultPresenter>,
        debouncer: SearchDebouncer,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            catalog,
            pipeline,
            presenter,
            debouncer,
            sink,
        }
    }

    /// Schedule the debounced search and answer right away with a placeholder.
    /// The real list reaches the sink when the search fires.
    pub fn on_event(&self, event: &QueryEvent, prefs: &Preferences) -> Vec<ResultItem> {
        let query = clean_argument(event.argument.as_deref());
        let limit = ResultLimit::parse(&prefs.results_limit);

        let catalog = Arc::clone(&self.catalog);
        let pipeline = Arc::clone(&self.pipeline);
        let presenter = Arc::clone(&self.presenter);
        let sink = Arc::clone(&self.sink);
        let event = event.clone();

        self.debouncer.schedule(query, limit, move |query, limit| async move {
            let items = run_search(&catalog, &pipeline, &presenter, &query, limit).await;
            sink.render(&event, items);
        });

        vec![ResultItem::searching()]
    }
}
