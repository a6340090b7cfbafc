use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::watch;

use common::catalog::{CatalogRepository, Persistence};
use common::lifecycle::LifecycleState;
use common::search::SearchFacade;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogRepository,
    pub search: SearchFacade,
    pub lifecycle: watch::Receiver<LifecycleState>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        persistence: Persistence,
        lifecycle: watch::Receiver<LifecycleState>,
        metrics: PrometheusHandle,
    ) -> Self {
        let catalog = CatalogRepository::new(persistence);

        Self {
            search: SearchFacade::new(catalog.clone()),
            catalog,
            lifecycle,
            metrics,
        }
    }

    /// Snapshot of the published lifecycle state
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.borrow().clone()
    }
}
