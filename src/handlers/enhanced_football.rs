use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Serialize;
use validator::Validate;

use crate::errors::Result;
use crate::models::betsapi::MatchType;
use crate::models::football_match::AdminMatchUpdate;
use crate::models::sync::{
    CompletenessReport, DayQuery, DbMatchCount, FullSyncResult, LimitQuery, PageQuery,
    ResyncResult, SelectiveSyncRequest, SelectiveSyncResult, SyncCounts, SyncNeededReport,
};
use crate::services::match_formatter::{
    EnhancedMatchResponse, HighQualityMatches, MatchDetail, MatchesWithStat, SampleAnalysis,
    StatType, DEFAULT_QUALITY_LIMIT, DEFAULT_STAT_LIMIT,
};
use crate::services::sync_orchestrator::RESYNC_BATCH_LIMIT;
use crate::state::AppState;

/// Success body shared by every endpoint under `/api/v1/enhanced-football`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            data,
            message: message.into(),
        })
    }
}

pub async fn list_matches(
    State(state): State<AppState>,
    Path(match_type): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<EnhancedMatchResponse>>> {
    let match_type: MatchType = match_type.parse()?;
    tracing::info!(
        "🔍 GET /matches/{} called (page: {:?}, day: {:?})",
        match_type,
        query.page,
        query.day
    );

    let listing = state
        .catalog
        .get_enhanced_matches(match_type, query.page.unwrap_or(1), query.day.as_deref())
        .await?;

    Ok(ApiResponse::ok(
        listing,
        format!("Stored {} matches retrieved from MongoDB", match_type),
    ))
}

pub async fn high_quality_matches(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<HighQualityMatches>>> {
    let listing = state
        .catalog
        .get_high_quality_matches(query.limit.unwrap_or(DEFAULT_QUALITY_LIMIT))
        .await?;
    Ok(ApiResponse::ok(listing, "High quality matches retrieved successfully"))
}

pub async fn matches_with_stats(
    State(state): State<AppState>,
    Path(stat_type): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<MatchesWithStat>>> {
    let stat_type: StatType = stat_type.parse()?;

    let listing = state
        .catalog
        .get_matches_with_stat(stat_type, query.limit.unwrap_or(DEFAULT_STAT_LIMIT))
        .await?;
    Ok(ApiResponse::ok(
        listing,
        format!("Matches with {} statistics retrieved successfully", stat_type),
    ))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<ApiResponse<MatchDetail>>> {
    tracing::info!("🔍 GET /match/{} called", event_id);

    let detail = state.catalog.get_enhanced_match_details(&event_id).await?;
    Ok(ApiResponse::ok(detail, "Match details retrieved from MongoDB"))
}

pub async fn update_match_admin(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(update): Json<AdminMatchUpdate>,
) -> Result<Json<ApiResponse<MatchDetail>>> {
    tracing::info!("✏️ PUT /match/{}/admin called", event_id);

    let detail = state.catalog.update_admin_fields(&event_id, &update).await?;
    Ok(ApiResponse::ok(detail, "Match admin fields updated successfully"))
}

pub async fn auto_sync(
    State(state): State<AppState>,
    Path(match_type): Path<String>,
    Query(query): Query<DayQuery>,
) -> Result<Json<ApiResponse<SyncCounts>>> {
    let match_type: MatchType = match_type.parse()?;
    tracing::info!("🔄 POST /sync/auto/{} called (day: {:?})", match_type, query.day);

    let counts = state
        .orchestrator
        .auto_sync(match_type, query.day.as_deref())
        .await?;

    let message = format!(
        "BetsAPI → MongoDB {} sync completed: {} created, {} updated",
        match_type, counts.created, counts.updated
    );
    Ok(ApiResponse::ok(counts, message))
}

pub async fn full_sync(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FullSyncResult>>> {
    tracing::info!("🚀 POST /sync/full called");

    let result = state.orchestrator.full_sync().await?;
    let message = format!(
        "BetsAPI → MongoDB full sync: {} total created, {} total updated",
        result.total.created, result.total.updated
    );
    Ok(ApiResponse::ok(result, message))
}

pub async fn selective_sync(
    State(state): State<AppState>,
    Json(request): Json<SelectiveSyncRequest>,
) -> Result<Json<ApiResponse<SelectiveSyncResult>>> {
    request.validate()?;
    tracing::info!(
        "🎯 POST /sync/selective called with {} ids (forceOverwrite: {}, statsOnly: {})",
        request.event_ids.len(),
        request.options.force_overwrite,
        request.options.stats_only
    );

    let result = state
        .reconciler
        .selective_sync(&request.event_ids, request.options)
        .await?;

    let message = format!(
        "Selective sync completed: {} created, {} updated, {} skipped, {} errors",
        result.created, result.updated, result.skipped, result.errors
    );
    Ok(ApiResponse::ok(result, message))
}

pub async fn resync_incomplete(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ResyncResult>>> {
    tracing::info!("🔧 POST /sync/resync-incomplete called");

    let result = state.orchestrator.resync_incomplete(RESYNC_BATCH_LIMIT).await?;
    let message = format!(
        "Incomplete data resync completed: {} resynced, {} errors",
        result.resynced, result.errors
    );
    Ok(ApiResponse::ok(result, message))
}

pub async fn db_stats(State(state): State<AppState>) -> Json<ApiResponse<DbMatchCount>> {
    let counts = state.orchestrator.db_match_count().await;
    ApiResponse::ok(counts, "MongoDB match statistics retrieved successfully")
}

pub async fn completeness(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CompletenessReport>>> {
    let report = state.orchestrator.check_data_completeness().await?;
    Ok(ApiResponse::ok(report, "Data completeness analysis completed successfully"))
}

pub async fn sync_needed(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SyncNeededReport>>> {
    let report = state.orchestrator.check_sync_needed().await?;
    Ok(ApiResponse::ok(
        report,
        "Sync requirement and data completeness check completed",
    ))
}

pub async fn sample_data(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SampleAnalysis>>> {
    let analysis = state.catalog.get_sample_data().await?;
    Ok(ApiResponse::ok(analysis, "Sample data analysis completed for debugging"))
}
