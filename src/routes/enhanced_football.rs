use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::enhanced_football;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matches/high-quality", get(enhanced_football::high_quality_matches))
        .route("/matches/with-stats/:stat_type", get(enhanced_football::matches_with_stats))
        .route("/matches/:match_type", get(enhanced_football::list_matches))
        .route("/match/:event_id", get(enhanced_football::get_match))
        .route("/match/:event_id/admin", put(enhanced_football::update_match_admin))
        .route("/sync/auto/:match_type", post(enhanced_football::auto_sync))
        .route("/sync/full", post(enhanced_football::full_sync))
        .route("/sync/selective", post(enhanced_football::selective_sync))
        .route("/sync/resync-incomplete", post(enhanced_football::resync_incomplete))
        .route("/stats/db", get(enhanced_football::db_stats))
        .route("/stats/completeness", get(enhanced_football::completeness))
        .route("/check/sync-needed", get(enhanced_football::sync_needed))
        .route("/debug/sample-data", get(enhanced_football::sample_data))
}
