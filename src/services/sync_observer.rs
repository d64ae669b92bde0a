// services/sync_observer.rs
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::models::betsapi::MatchType;
use crate::models::sync::{SelectiveSyncOptions, SelectiveSyncResult, SyncCounts, SyncDetail, SyncStatus};

/// Receives progress from the sync services. Handed in at construction so
/// tests can record what a batch reported.
pub trait SyncObserver: Send + Sync {
    fn batch_started(&self, size: usize, options: &SelectiveSyncOptions);

    fn record_processed(&self, detail: &SyncDetail);

    fn batch_finished(&self, result: &SelectiveSyncResult);

    fn upsert_failed(&self, event_id: &str, error: &AppError);

    fn auto_sync_finished(&self, match_type: MatchType, day: Option<&str>, counts: &SyncCounts);
}

/// Default observer: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn batch_started(&self, size: usize, options: &SelectiveSyncOptions) {
        info!(
            batch_size = size,
            force_overwrite = options.force_overwrite,
            stats_only = options.stats_only,
            "🎯 Selective sync started"
        );
    }

    fn record_processed(&self, detail: &SyncDetail) {
        match detail.status {
            SyncStatus::Error => {
                error!(event_id = %detail.event_id, "❌ Match sync failed: {}", detail.message)
            }
            SyncStatus::Skipped => {
                debug!(event_id = %detail.event_id, "Match skipped: {}", detail.message)
            }
            SyncStatus::Created => debug!(event_id = %detail.event_id, "🆕 Match created"),
            SyncStatus::Updated => debug!(event_id = %detail.event_id, "✅ Match updated"),
        }
    }

    fn batch_finished(&self, result: &SelectiveSyncResult) {
        info!(
            updated = result.updated,
            created = result.created,
            errors = result.errors,
            skipped = result.skipped,
            "✅ Selective sync finished"
        );
    }

    fn upsert_failed(&self, event_id: &str, error: &AppError) {
        warn!(event_id = %event_id, "Bulk upsert failed: {}", error);
    }

    fn auto_sync_finished(&self, match_type: MatchType, day: Option<&str>, counts: &SyncCounts) {
        info!(
            match_type = %match_type,
            day = day.unwrap_or("-"),
            created = counts.created,
            updated = counts.updated,
            "{} sync finished",
            match_type
        );
    }
}
