use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::betsapi_client::BetsApiProvider;
use crate::services::match_formatter::MatchCatalog;
use crate::services::match_store::MatchRepository;
use crate::services::reconciler::MatchReconciler;
use crate::services::sync_orchestrator::SyncOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn MatchRepository>,
    pub reconciler: Arc<MatchReconciler>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub catalog: Arc<MatchCatalog>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        upstream: Arc<dyn BetsApiProvider>,
        store: Arc<dyn MatchRepository>,
    ) -> Self {
        let reconciler = Arc::new(MatchReconciler::new(upstream.clone(), store.clone()));
        let orchestrator = Arc::new(SyncOrchestrator::new(
            upstream,
            store.clone(),
            reconciler.clone(),
        ));

        AppState {
            config: Arc::new(config),
            catalog: Arc::new(MatchCatalog::new(store.clone())),
            store,
            reconciler,
            orchestrator,
        }
    }
}
