// models/football_match.rs
use mongodb::bson::{self, doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::Result;
use crate::models::betsapi::{
    BetsApiMatch, League, MatchScores, MatchStats, MatchTimer, Team,
};
use crate::utils::dates::TimestampRange;

pub const COLLECTION: &str = "football_matches";

// Stored football match - field names follow the BetsAPI payload so the
// documents can be handed back to clients unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootballMatch {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(rename = "betsApiId")]
    pub bets_api_id: String,

    #[serde(default = "default_sport_id")]
    pub sport_id: String,

    #[serde(default)]
    pub time: String,

    #[serde(default)]
    pub time_status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league: Option<League>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<Team>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away: Option<Team>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o_home: Option<Team>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o_away: Option<Team>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ss: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<MatchScores>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<MatchTimer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<MatchStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet365_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,

    #[serde(default = "default_status")]
    pub status: String, // "active", "archived"

    #[serde(rename = "adminNote", default, skip_serializing_if = "Option::is_none")]
    pub admin_note: Option<String>,

    #[serde(rename = "dataSource", default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,

    #[serde(rename = "lastSyncAt", default, skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<BsonDateTime>,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,

    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
}

fn default_sport_id() -> String {
    "1".to_string()
}

fn default_status() -> String {
    "active".to_string()
}

impl FootballMatch {
    /// Builds a new, not yet persisted record from an upstream event.
    pub fn from_upstream(event: &BetsApiMatch, data_source: &str, synced_at: BsonDateTime) -> Self {
        FootballMatch {
            id: None,
            bets_api_id: event.id.clone(),
            sport_id: event.sport_id.clone().unwrap_or_else(default_sport_id),
            time: event.time.clone().unwrap_or_default(),
            time_status: event.time_status.clone().unwrap_or_default(),
            league: event.league.clone(),
            home: event.home.clone(),
            away: event.away.clone(),
            o_home: event.o_home.clone(),
            o_away: event.o_away.clone(),
            ss: event.ss.clone(),
            scores: event.scores.clone(),
            timer: event.timer.clone(),
            stats: event.stats.clone(),
            bet365_id: event.bet365_id.clone(),
            round: event.round.clone(),
            status: default_status(),
            admin_note: None,
            data_source: Some(data_source.to_string()),
            last_sync_at: Some(synced_at),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn has_stats(&self) -> bool {
        self.stats.as_ref().is_some_and(|stats| !stats.is_empty())
    }

    pub fn has_original_teams(&self) -> bool {
        self.o_home.is_some() || self.o_away.is_some()
    }

    pub fn id_hex(&self) -> Option<String> {
        self.id.map(|id| id.to_hex())
    }
}

/// Fields a sync pass may write. Has no admin note field.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MatchPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub league: Option<League>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<Team>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away: Option<Team>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub o_home: Option<Team>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub o_away: Option<Team>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<MatchScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<MatchTimer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<MatchStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bet365_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<String>,
    #[serde(rename = "lastSyncAt", skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<BsonDateTime>,
    #[serde(rename = "dataSource", skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,
}

impl MatchPatch {
    /// `$set` body for this patch; `updatedAt` is always refreshed.
    pub fn to_set_document(&self, now: BsonDateTime) -> Result<Document> {
        let mut set = bson::to_document(self)?;
        set.insert("updatedAt", now);
        Ok(set)
    }
}

// Admin panel edits - the only path allowed to touch adminNote
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AdminMatchUpdate {
    #[serde(rename = "adminNote", skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Admin note must be at most 2000 characters"))]
    pub admin_note: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_lifecycle_status"))]
    pub status: Option<String>,
}

fn validate_lifecycle_status(status: &str) -> std::result::Result<(), validator::ValidationError> {
    match status {
        "active" | "archived" => Ok(()),
        _ => Err(validator::ValidationError::new("status must be 'active' or 'archived'")),
    }
}

impl AdminMatchUpdate {
    pub fn is_empty(&self) -> bool {
        self.admin_note.is_none() && self.status.is_none()
    }

    pub fn to_set_document(&self, now: BsonDateTime) -> Result<Document> {
        let mut set = bson::to_document(self)?;
        set.insert("updatedAt", now);
        Ok(set)
    }
}

/// Read-side filter over stored matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchQuery {
    pub time_status: Option<String>,
    pub time_range: Option<TimestampRange>,
    pub missing_stats: bool,
    pub with_original_teams: bool,
}

impl MatchQuery {
    pub fn by_time_status(time_status: impl Into<String>) -> Self {
        MatchQuery {
            time_status: Some(time_status.into()),
            ..Default::default()
        }
    }

    pub fn missing_stats() -> Self {
        MatchQuery {
            missing_stats: true,
            ..Default::default()
        }
    }

    pub fn with_original_teams() -> Self {
        MatchQuery {
            with_original_teams: true,
            ..Default::default()
        }
    }

    pub fn with_time_range(mut self, range: TimestampRange) -> Self {
        self.time_range = Some(range);
        self
    }

    pub fn to_filter(&self) -> Document {
        let mut filter = doc! {};

        if let Some(time_status) = &self.time_status {
            filter.insert("time_status", time_status);
        }

        // `time` is stored as the provider's decimal string; equal-width
        // epoch strings compare the same lexically and numerically.
        if let Some(range) = &self.time_range {
            filter.insert(
                "time",
                doc! { "$gte": range.start.to_string(), "$lte": range.end.to_string() },
            );
        }

        let mut all_of = Vec::new();
        if self.missing_stats {
            all_of.push(doc! {
                "$or": [
                    { "stats": { "$exists": false } },
                    { "stats": null },
                    { "stats": {} },
                ]
            });
        }
        if self.with_original_teams {
            all_of.push(doc! {
                "$or": [
                    { "o_home": { "$exists": true, "$ne": null } },
                    { "o_away": { "$exists": true, "$ne": null } },
                ]
            });
        }
        if !all_of.is_empty() {
            filter.insert("$and", all_of);
        }

        filter
    }

    /// In-memory equivalent of `to_filter`, string comparison on `time` included.
    #[cfg(test)]
    pub fn matches(&self, record: &FootballMatch) -> bool {
        if let Some(time_status) = &self.time_status {
            if &record.time_status != time_status {
                return false;
            }
        }
        if let Some(range) = &self.time_range {
            let (start, end) = (range.start.to_string(), range.end.to_string());
            if record.time < start || record.time > end {
                return false;
            }
        }
        if self.missing_stats && record.has_stats() {
            return false;
        }
        if self.with_original_teams && !record.has_original_teams() {
            return false;
        }
        true
    }
}
