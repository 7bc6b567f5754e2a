//! Application setup and wiring

use std::sync::Arc;

use scanlens_core::Config;
use scanlens_report::{
    QueryService, ReportStore, StatsService, StoreError, open_store,
};
use tracing::info;

/// Shared services built from one configuration
pub struct AppHandle {
    pub config: Arc<Config>,
    pub store: Arc<dyn ReportStore>,
}

impl AppHandle {
    pub fn query_service(&self) -> QueryService {
        QueryService::new(self.store.clone(), self.config.query.clone())
    }

    pub fn stats_service(&self) -> StatsService {
        StatsService::new(self.store.clone())
    }
}

/// Open the configured store and build the application services
pub async fn create_app(config: Config) -> Result<AppHandle, StoreError> {
    let store = open_store(&config.store).await?;
    info!(backend = ?config.store.backend, "Report store ready");

    Ok(AppHandle {
        config: Arc::new(config),
        store,
    })
}
