// services/sync_orchestrator.rs
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::errors::Result;
use crate::models::betsapi::MatchType;
use crate::models::football_match::MatchQuery;
use crate::models::sync::{
    CompletenessReport, DbMatchCount, FullSyncResult, ResyncResult, SelectiveSyncOptions,
    SyncCounts, SyncNeededReport, SyncRecommendation,
};
use crate::services::betsapi_client::BetsApiProvider;
use crate::services::match_store::MatchRepository;
use crate::services::reconciler::MatchReconciler;
use crate::utils::dates::{parse_day, today_and_tomorrow};

/// Upper bound on listing pages fetched by a single auto sync.
pub const MAX_SYNC_PAGES: u32 = 5;

/// Completeness below this share of records with stats asks for a resync.
pub const COMPLETENESS_THRESHOLD: u32 = 80;

pub const RESYNC_BATCH_LIMIT: i64 = 100;

pub struct SyncOrchestrator {
    upstream: Arc<dyn BetsApiProvider>,
    store: Arc<dyn MatchRepository>,
    reconciler: Arc<MatchReconciler>,
}

impl SyncOrchestrator {
    pub fn new(
        upstream: Arc<dyn BetsApiProvider>,
        store: Arc<dyn MatchRepository>,
        reconciler: Arc<MatchReconciler>,
    ) -> Self {
        SyncOrchestrator { upstream, store, reconciler }
    }

    /// Pulls one listing (all pages up to the cap) and upserts it.
    pub async fn auto_sync(&self, match_type: MatchType, day: Option<&str>) -> Result<SyncCounts> {
        if let Some(day) = day {
            parse_day(day)?;
        }
        info!("🔄 Auto sync started: {} (day: {:?})", match_type, day);

        let first = self.upstream.list_matches(match_type, 1, day).await?;
        if first.results.is_empty() {
            info!("No {} matches returned upstream", match_type);
            let counts = SyncCounts::default();
            self.reconciler.observer().auto_sync_finished(match_type, day, &counts);
            return Ok(counts);
        }

        let pager = first.pager;
        let mut events = first.results;

        if let Some(pager) = pager.filter(|p| match_type.is_paginated() && p.total > p.per_page) {
            let last_page = pager.total_pages().min(MAX_SYNC_PAGES);
            info!(
                "   → {} total, {} per page, fetching pages 2..={}",
                pager.total, pager.per_page, last_page
            );

            for page in 2..=last_page {
                match self.upstream.list_matches(match_type, page, day).await {
                    Ok(response) => events.extend(response.results),
                    Err(e) => warn!("Skipping {} page {}: {}", match_type, page, e),
                }
            }
        }

        let counts: SyncCounts = self.reconciler.upsert_events(&events).await.into();
        self.reconciler.observer().auto_sync_finished(match_type, day, &counts);
        Ok(counts)
    }

    pub async fn full_sync(&self) -> Result<FullSyncResult> {
        let (today, tomorrow) = today_and_tomorrow();
        self.full_sync_for(&today, &tomorrow).await
    }

    /// Today's upcoming and ended listings run together, tomorrow's
    /// upcoming listing after both finished. A failing branch does not
    /// cancel its sibling.
    pub async fn full_sync_for(&self, today: &str, tomorrow: &str) -> Result<FullSyncResult> {
        info!("🚀 Full sync started (today: {}, tomorrow: {})", today, tomorrow);

        let (today_upcoming, today_ended) = tokio::join!(
            self.auto_sync(MatchType::Upcoming, Some(today)),
            self.auto_sync(MatchType::Ended, Some(today))
        );
        let (today_upcoming, today_ended) = (today_upcoming?, today_ended?);
        let tomorrow_upcoming = self.auto_sync(MatchType::Upcoming, Some(tomorrow)).await?;

        let upcoming = today_upcoming + tomorrow_upcoming;
        let result = FullSyncResult {
            upcoming,
            ended: today_ended,
            total: upcoming + today_ended,
        };

        info!(
            "✅ Full sync finished: {} created, {} updated",
            result.total.created, result.total.updated
        );
        Ok(result)
    }

    /// Stored match counts per listing type. Zeros when the store fails.
    pub async fn db_match_count(&self) -> DbMatchCount {
        let upcoming = MatchQuery::by_time_status(MatchType::Upcoming.time_status());
        let inplay = MatchQuery::by_time_status(MatchType::Inplay.time_status());
        let ended = MatchQuery::by_time_status(MatchType::Ended.time_status());

        let counted = tokio::try_join!(
            self.store.count_matches(&upcoming),
            self.store.count_matches(&inplay),
            self.store.count_matches(&ended)
        );

        match counted {
            Ok((upcoming, inplay, ended)) => DbMatchCount {
                upcoming,
                inplay,
                ended,
                total: upcoming + inplay + ended,
            },
            Err(e) => {
                error!("Failed to count stored matches: {}", e);
                DbMatchCount::default()
            }
        }
    }

    pub async fn check_data_completeness(&self) -> Result<CompletenessReport> {
        let everything = MatchQuery::default();
        let missing_stats = MatchQuery::missing_stats();
        let original_teams = MatchQuery::with_original_teams();

        let (total, without_stats, with_original_teams) = tokio::try_join!(
            self.store.count_matches(&everything),
            self.store.count_matches(&missing_stats),
            self.store.count_matches(&original_teams)
        )?;

        let with_stats = total.saturating_sub(without_stats);
        let completeness_percentage = if total == 0 {
            0
        } else {
            ((with_stats as f64 / total as f64) * 100.0).round() as u32
        };

        Ok(CompletenessReport {
            total_matches: total,
            with_stats,
            without_stats,
            with_original_teams,
            completeness_percentage,
        })
    }

    /// Stats-only resync of stored matches that have no statistics yet.
    pub async fn resync_incomplete(&self, limit: i64) -> Result<ResyncResult> {
        let candidates = self
            .store
            .find_matches(&MatchQuery::missing_stats(), 0, Some(limit))
            .await?;

        if candidates.is_empty() {
            info!("No incomplete matches to resync");
            return Ok(ResyncResult::default());
        }

        let event_ids: Vec<String> = candidates.into_iter().map(|m| m.bets_api_id).collect();
        info!("🔧 Resyncing {} matches without stats", event_ids.len());

        let result = self
            .reconciler
            .selective_sync(&event_ids, SelectiveSyncOptions::stats_only())
            .await?;

        Ok(ResyncResult {
            candidates: event_ids.len() as u32,
            resynced: result.updated + result.created,
            errors: result.errors,
            skipped: result.skipped,
        })
    }

    pub async fn check_sync_needed(&self) -> Result<SyncNeededReport> {
        let db_stats = self.db_match_count().await;
        let completeness = self.check_data_completeness().await?.completeness_percentage;

        let sync_needed = db_stats.total == 0;
        let incomplete_data = completeness < COMPLETENESS_THRESHOLD;

        let recommendation = if sync_needed {
            SyncRecommendation::Empty
        } else if incomplete_data {
            SyncRecommendation::Incomplete
        } else if db_stats.upcoming == 0 {
            SyncRecommendation::NoUpcoming
        } else {
            SyncRecommendation::Ok
        };

        Ok(SyncNeededReport {
            sync_needed,
            incomplete_data,
            db_stats,
            completeness,
            recommendation,
            message: recommendation.describe(completeness),
        })
    }
}
