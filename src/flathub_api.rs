use crate::models::{RemoteApp, ResultLimit, SearchError, SearchQuery};
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;

pub const SEARCH_URL: &str = "https://flathub.org/api/v2/compat/apps/search/";
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait::async_trait]
pub trait CatalogHttp: Send + Sync {
    /// Body of a successful GET. Non-success statuses are errors.
    async fn get_text(&self, url: &str) -> Result<String, String>;
}

pub struct ReqwestCatalogHttp {
    client: Client,
}

impl Default for ReqwestCatalogHttp {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestCatalogHttp {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("flathub-search/", env!("CARGO_PKG_VERSION")))
            .timeout(SEARCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

#[async_trait::async_trait]
impl CatalogHttp for ReqwestCatalogHttp {
    async fn get_text(&self, url: &str) -> Result<String, String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Request error: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        resp.text().await.map_err(|e| format!("Body error: {}", e))
    }
}

/// Flathub compat search. Network trouble never reaches the caller: it is
/// logged and the search comes back empty.
pub struct CatalogClient {
    http: Arc<dyn CatalogHttp>,
}

impl CatalogClient {
    pub fn new(http: Arc<dyn CatalogHttp>) -> Self {
        Self { http }
    }

    pub fn search_url(&self, query: &SearchQuery) -> Result<Url, String> {
        let mut url = Url::parse(SEARCH_URL).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("Base URL cannot take a path: {}", SEARCH_URL))?
            .pop_if_empty()
            .push(query.as_str());
        Ok(url)
    }

    pub async fn search(&self, raw_query: &str, limit: ResultLimit) -> Result<Vec<RemoteApp>, SearchError> {
        let query = SearchQuery::parse(raw_query)?;

        log::info!(
            "Fetching results with params query={:?}, results_limit={}",
            query.as_str(),
            limit.get()
        );

        let url = match self.search_url(&query) {
            Ok(url) => url,
            Err(e) => {
                log::error!("Invalid search URL: {}", e);
                return Ok(vec![]);
            }
        };

        let body = match self.http.get_text(url.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                log::error!("Flathub search failed for {:?}: {}", query.as_str(), e);
                return Ok(vec![]);
            }
        };

        Ok(parse_search_response(&body, limit))
    }
}

/// The page is cut to `limit` before invalid records are dropped, so a bad
/// record costs a slot instead of pulling in a later one.
pub fn parse_search_response(body: &str, limit: ResultLimit) -> Vec<RemoteApp> {
    let records: Vec<serde_json::Value> = match serde_json::from_str(body) {
        Ok(records) => records,
        Err(e) => {
            log::error!("Flathub search parse error: {}", e);
            return vec![];
        }
    };

    records
        .iter()
        .take(limit.get())
        .filter_map(RemoteApp::from_value)
        .collect()
}
