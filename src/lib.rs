pub mod actions;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod enrichment;
pub mod flathub_api;
pub mod flatpak;
pub mod icon_cache;
pub mod logger;
pub mod mocks;
pub mod models;
pub mod output;
pub mod presenter;
pub mod utils;
pub mod worker_pool;


use commands::local::LocalSearch;
use commands::search::FlathubSearch;
use commands::{Extension, ResultSink};
use config::Preferences;
use debounce::SearchDebouncer;
use enrichment::EnrichmentPipeline;
use flathub_api::{CatalogClient, CatalogHttp, ReqwestCatalogHttp};
use flatpak::{FlatpakCli, IconLookup, LocalPackageManager, SystemIconLookup};
use icon_cache::{HttpIconFetcher, IconCache, IconFetcher};
use presenter::ResultPresenter;
use std::sync::Arc;
use worker_pool::PoolHandle;

/// Everything the extension talks to outside the process.
pub struct Collaborators {
    pub catalog: Arc<dyn CatalogHttp>,
    pub icon_fetcher: Arc<dyn IconFetcher>,
    pub packages: Arc<dyn LocalPackageManager>,
    pub icons: Arc<dyn IconLookup>,
}

impl Collaborators {
    /// Real network and the real `flatpak` installation.
    pub fn system() -> Self {
        Self {
            catalog: Arc::new(ReqwestCatalogHttp::new()),
            icon_fetcher: Arc::new(HttpIconFetcher::default()),
            packages: Arc::new(FlatpakCli::default()),
            icons: Arc::new(SystemIconLookup::default()),
        }
    }
}

/// Search services shared by the keyword handlers and the one-shot CLI commands.
pub struct Services {
    pub catalog: Arc<CatalogClient>,
    pub pipeline: Arc<EnrichmentPipeline>,
    pub presenter: Arc<ResultPresenter>,
    pub packages: Arc<dyn LocalPackageManager>,
}

impl Services {
    pub fn new(prefs: &Preferences, pool: PoolHandle, deps: Collaborators) -> Self {
        let cache = Arc::new(IconCache::new(prefs.cache_dir(), deps.icon_fetcher));
        let pipeline =
            EnrichmentPipeline::new(pool, cache).with_join_deadline(prefs.join_deadline());
        let presenter = ResultPresenter::new(
            Arc::clone(&deps.packages),
            deps.icons,
            prefs.script_path.clone(),
        );
        Self {
            catalog: Arc::new(CatalogClient::new(deps.catalog)),
            pipeline: Arc::new(pipeline),
            presenter: Arc::new(presenter),
            packages: deps.packages,
        }
    }
}

/// Wire up the keyword router. Debounce timers and icon jobs run on `pool`.
pub fn build_extension(
    prefs: Preferences,
    pool: PoolHandle,
    deps: Collaborators,
    sink: Arc<dyn ResultSink>,
) -> Extension {
    let debouncer = SearchDebouncer::new(pool.runtime().clone(), prefs.debounce());
    let services = Services::new(&prefs, pool, deps);

    let flathub = FlathubSearch::new(
        Arc::clone(&services.catalog),
        Arc::clone(&services.pipeline),
        Arc::clone(&services.presenter),
        debouncer,
        sink,
    );
    let local = LocalSearch::new(services.packages, services.presenter);
    Extension::new(prefs, flathub, local)
}
