use std::sync::Arc;

use monwatch_adapters::MonitorApi;
use monwatch_types::StatusMap;

use crate::config::EngineConfig;
use crate::fetch::{FetchCoordinator, Paginator};

/// Entry point for queries, option lists and health checks.
///
/// The engine holds only configuration and the API client; every query
/// builds its records and frames from scratch.
#[derive(Clone)]
pub struct QueryEngine {
    pub(crate) api: Arc<dyn MonitorApi>,
    pub(crate) config: EngineConfig,
    pub(crate) statuses: StatusMap,
    pub(crate) coordinator: FetchCoordinator,
}

impl QueryEngine {
    pub fn new(api: Arc<dyn MonitorApi>, config: EngineConfig) -> Self {
        let paginator = Paginator::new(api.clone(), config.max_page_count, config.non_success_policy);
        Self {
            api,
            config,
            statuses: StatusMap::default(),
            coordinator: FetchCoordinator::new(paginator),
        }
    }

    /// Replace the status vocabulary.
    pub fn with_statuses(mut self, statuses: StatusMap) -> Self {
        self.statuses = statuses;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn statuses(&self) -> &StatusMap {
        &self.statuses
    }
}
