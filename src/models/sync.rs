// models/sync.rs
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectiveSyncOptions {
    #[serde(default)]
    pub force_overwrite: bool,
    #[serde(default)]
    pub stats_only: bool,
}

impl SelectiveSyncOptions {
    pub fn stats_only() -> Self {
        SelectiveSyncOptions { force_overwrite: false, stats_only: true }
    }

    #[cfg(test)]
    pub fn forced() -> Self {
        SelectiveSyncOptions { force_overwrite: true, stats_only: false }
    }

    /// `dataSource` tag stamped on records updated under these options.
    pub fn data_source(&self) -> &'static str {
        if self.stats_only {
            DATA_SOURCE_STATS_SYNC
        } else if self.force_overwrite {
            DATA_SOURCE_FORCE_SYNC
        } else {
            DATA_SOURCE_SELECTIVE_SYNC
        }
    }
}

pub const DATA_SOURCE_SELECTIVE_SYNC: &str = "betsapi_selective_sync";
pub const DATA_SOURCE_STATS_SYNC: &str = "betsapi_stats_sync";
pub const DATA_SOURCE_FORCE_SYNC: &str = "betsapi_force_sync";
pub const DATA_SOURCE_AUTO_SYNC: &str = "betsapi_auto_sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Created,
    Updated,
    Skipped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncDetail {
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub status: SyncStatus,
    pub message: String,
}

impl SyncDetail {
    pub fn new(event_id: &str, status: SyncStatus, message: impl Into<String>) -> Self {
        SyncDetail {
            event_id: event_id.to_string(),
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectiveSyncResult {
    pub updated: u32,
    pub created: u32,
    pub errors: u32,
    pub skipped: u32,
    pub details: Vec<SyncDetail>,
}

impl SelectiveSyncResult {
    pub fn record(&mut self, detail: SyncDetail) {
        match detail.status {
            SyncStatus::Created => self.created += 1,
            SyncStatus::Updated => self.updated += 1,
            SyncStatus::Skipped => self.skipped += 1,
            SyncStatus::Error => self.errors += 1,
        }
        self.details.push(detail);
    }

    #[cfg(test)]
    pub fn processed(&self) -> u32 {
        self.created + self.updated + self.errors + self.skipped
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    pub created: u32,
    pub updated: u32,
}

impl std::ops::Add for SyncCounts {
    type Output = SyncCounts;

    fn add(self, other: SyncCounts) -> SyncCounts {
        SyncCounts {
            created: self.created + other.created,
            updated: self.updated + other.updated,
        }
    }
}

/// Outcome of a bulk upsert over already-fetched upstream events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub created: u32,
    pub updated: u32,
    pub failed: u32,
}

impl From<UpsertSummary> for SyncCounts {
    fn from(summary: UpsertSummary) -> Self {
        SyncCounts { created: summary.created, updated: summary.updated }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FullSyncResult {
    pub upcoming: SyncCounts,
    pub ended: SyncCounts,
    pub total: SyncCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DbMatchCount {
    pub upcoming: u64,
    pub inplay: u64,
    pub ended: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompletenessReport {
    pub total_matches: u64,
    pub with_stats: u64,
    pub without_stats: u64,
    pub with_original_teams: u64,
    pub completeness_percentage: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResyncResult {
    pub candidates: u32,
    pub resynced: u32,
    pub errors: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRecommendation {
    Empty,
    Incomplete,
    NoUpcoming,
    Ok,
}

impl SyncRecommendation {
    pub fn describe(&self, completeness: u32) -> String {
        match self {
            SyncRecommendation::Empty => {
                "No matches stored yet. Run a full sync to pull data from BetsAPI.".to_string()
            }
            SyncRecommendation::Incomplete => format!(
                "Data completeness is {}%. Run the incomplete-data resync.",
                completeness
            ),
            SyncRecommendation::NoUpcoming => {
                "No upcoming matches stored. Run an upcoming sync.".to_string()
            }
            SyncRecommendation::Ok => "Stored match data is complete.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncNeededReport {
    pub sync_needed: bool,
    pub incomplete_data: bool,
    pub db_stats: DbMatchCount,
    pub completeness: u32,
    pub recommendation: SyncRecommendation,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectiveSyncRequest {
    #[validate(length(min = 1, max = 500, message = "eventIds must contain between 1 and 500 ids"))]
    pub event_ids: Vec<String>,
    #[serde(flatten)]
    pub options: SelectiveSyncOptions,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub day: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub day: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}
