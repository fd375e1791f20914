use crate::icon_cache::IconCache;
use crate::models::{EnrichedResult, IconResolution, RemoteApp};
use crate::worker_pool::{PoolHandle, TaskHandle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_JOIN_DEADLINE: Duration = Duration::from_millis(100);

/// An app whose icon is being fetched in the background.
pub struct PendingIcon {
    pub app: RemoteApp,
    task: TaskHandle<PathBuf>,
}

/// Fans icon downloads out to the pool as soon as results arrive and joins
/// them back with a short per-item deadline.
pub struct EnrichmentPipeline {
    pool: PoolHandle,
    cache: Arc<IconCache>,
    join_deadline: Duration,
}

impl EnrichmentPipeline {
    pub fn new(pool: PoolHandle, cache: Arc<IconCache>) -> Self {
        Self {
            pool,
            cache,
            join_deadline: DEFAULT_JOIN_DEADLINE,
        }
    }

    pub fn with_join_deadline(mut self, deadline: Duration) -> Self {
        self.join_deadline = deadline;
        self
    }

    pub fn join_deadline(&self) -> Duration {
        self.join_deadline
    }

    /// Queue one icon resolve per app without waiting for any of them.
    pub fn fan_out(&self, apps: Vec<RemoteApp>) -> Vec<PendingIcon> {
        apps.into_iter()
            .map(|app| {
                let cache = Arc::clone(&self.cache);
                let url = app.icon_url.clone();
                let task = self.pool.submit(move || cache.resolve(&url));
                PendingIcon { app, task }
            })
            .collect()
    }

    /// Collect icons. Every wait runs concurrently and is bounded on its own, so
    /// one slow host costs at most one deadline for the whole list. Late icons
    /// are dropped here but still land in the cache for the next search.
    pub async fn join(&self, pending: Vec<PendingIcon>) -> Vec<EnrichedResult> {
        let deadline = self.join_deadline;
        let fallback = self.cache.fallback().to_path_buf();

        let waits = pending.into_iter().map(|mut p| {
            let fallback = fallback.clone();
            async move {
                let icon = match p.task.try_get(deadline).await {
                    Some(path) if path != fallback => IconResolution::Resolved(path),
                    Some(_) => IconResolution::Fallback,
                    None => {
                        log::debug!("Icon for {} not ready, using fallback", p.app.app_id);
                        IconResolution::Fallback
                    }
                };
                EnrichedResult { app: p.app, icon }
            }
        });

        futures::future::join_all(waits).await
    }
}
