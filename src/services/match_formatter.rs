// services/match_formatter.rs
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::errors::{AppError, Result};
use crate::models::betsapi::{
    League, MatchScores, MatchStats, MatchTimer, MatchType, Pager, StatPair, Team,
};
use crate::models::football_match::{AdminMatchUpdate, FootballMatch, MatchQuery};
use crate::services::match_store::MatchRepository;
use crate::utils::dates::day_to_timestamp_range;

pub const PAGE_SIZE: u32 = 20;

pub const DEFAULT_QUALITY_LIMIT: usize = 20;
pub const DEFAULT_STAT_LIMIT: usize = 50;

// How many stored matches the quality and stat filters look at.
const QUALITY_SCAN_LIMIT: i64 = 100;
const STAT_SCAN_LIMIT: i64 = 200;
const SAMPLE_SIZE: i64 = 3;

const QUALITY_CRITERIA: &str = "Matches with 3+ goals or 20+ shots";

/// A stored match in the provider's own response shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchView {
    pub id: String,
    pub sport_id: String,
    pub time: String,
    pub time_status: String,
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
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(rename = "adminNote", skip_serializing_if = "Option::is_none")]
    pub admin_note: Option<String>,
}

pub fn format_match(record: &FootballMatch) -> MatchView {
    MatchView {
        id: record.bets_api_id.clone(),
        sport_id: record.sport_id.clone(),
        time: record.time.clone(),
        time_status: record.time_status.clone(),
        league: record.league.clone(),
        home: record.home.clone(),
        away: record.away.clone(),
        o_home: record.o_home.clone(),
        o_away: record.o_away.clone(),
        ss: record.ss.clone(),
        scores: record.scores.clone(),
        timer: record.timer.clone(),
        stats: record.stats.clone(),
        bet365_id: record.bet365_id.clone(),
        round: record.round.clone(),
        object_id: record.id_hex(),
        admin_note: record.admin_note.clone(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedMatch {
    #[serde(flatten)]
    pub view: MatchView,
    pub is_modified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListingStats {
    pub total_matches: usize,
    pub modified_matches: usize,
    pub local_only_matches: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnhancedMatchResponse {
    pub results: Vec<EnhancedMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pager: Option<Pager>,
    pub enhanced: bool,
    pub stats: ListingStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetail {
    #[serde(flatten)]
    pub view: MatchView,
    pub status: String,
    pub is_modified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl From<&FootballMatch> for MatchDetail {
    fn from(record: &FootballMatch) -> Self {
        MatchDetail {
            view: format_match(record),
            status: record.status.clone(),
            is_modified: true,
            last_sync_at: record.last_sync_at.and_then(|d| d.try_to_rfc3339_string().ok()),
            last_modified: record.updated_at.and_then(|d| d.try_to_rfc3339_string().ok()),
        }
    }
}

fn stat_total(stats: &MatchStats, key: &str) -> f64 {
    stats.get(key).map(StatPair::total).unwrap_or(0.0)
}

/// Three or more goals, or twenty or more goal attempts.
pub fn is_high_quality(record: &FootballMatch) -> bool {
    match &record.stats {
        Some(stats) => stat_total(stats, "goals") >= 3.0 || stat_total(stats, "goalattempts") >= 20.0,
        None => false,
    }
}

/// Statistic families a listing can be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatType {
    Xg,
    Possession,
    Shots,
    Cards,
}

impl StatType {
    pub fn as_str(self) -> &'static str {
        match self {
            StatType::Xg => "xg",
            StatType::Possession => "possession",
            StatType::Shots => "shots",
            StatType::Cards => "cards",
        }
    }

    pub fn is_reported_in(self, stats: &MatchStats) -> bool {
        let both_sides = |key: &str| stats.get(key).is_some_and(StatPair::both_present);
        match self {
            StatType::Xg => both_sides("xg"),
            StatType::Possession => both_sides("possession_rt"),
            StatType::Shots => both_sides("goalattempts"),
            StatType::Cards => stats.contains_key("yellowcards") || stats.contains_key("redcards"),
        }
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xg" => Ok(StatType::Xg),
            "possession" => Ok(StatType::Possession),
            "shots" => Ok(StatType::Shots),
            "cards" => Ok(StatType::Cards),
            other => Err(AppError::invalid_data(format!(
                "Invalid stat type '{}'. Must be one of: xg, possession, shots, cards",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HighQualityMatches {
    pub results: Vec<MatchView>,
    pub criteria: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchesWithStat {
    pub results: Vec<MatchView>,
    pub stat_type: StatType,
    pub count: usize,
}

/// Shape summary of one stored record, for eyeballing what a sync wrote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub bets_api_id: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub has_stats: bool,
    pub stats_fields: usize,
    #[serde(rename = "hasXG")]
    pub has_xg: bool,
    pub has_possession: bool,
    pub has_o_teams: bool,
    pub data_source: Option<String>,
    pub last_sync_at: Option<String>,
}

impl From<&FootballMatch> for SampleRecord {
    fn from(record: &FootballMatch) -> Self {
        let has_key = |key: &str| record.stats.as_ref().is_some_and(|s| s.contains_key(key));
        SampleRecord {
            bets_api_id: record.bets_api_id.clone(),
            home_team: record.home.as_ref().and_then(|t| t.name.clone()),
            away_team: record.away.as_ref().and_then(|t| t.name.clone()),
            has_stats: record.stats.is_some(),
            stats_fields: record.stats.as_ref().map_or(0, |s| s.len()),
            has_xg: has_key("xg"),
            has_possession: has_key("possession_rt"),
            has_o_teams: record.has_original_teams(),
            data_source: record.data_source.clone(),
            last_sync_at: record.last_sync_at.and_then(|d| d.try_to_rfc3339_string().ok()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleAnalysis {
    pub total_matches: u64,
    pub sample_count: usize,
    pub samples: Vec<SampleRecord>,
}

/// Read side over stored matches. Never calls the provider.
pub struct MatchCatalog {
    store: Arc<dyn MatchRepository>,
}

impl MatchCatalog {
    pub fn new(store: Arc<dyn MatchRepository>) -> Self {
        MatchCatalog { store }
    }

    /// Stored matches of one type in kickoff order. With `day` the listing
    /// is further narrowed to that local calendar day, still within the type.
    pub async fn get_enhanced_matches(
        &self,
        match_type: MatchType,
        page: u32,
        day: Option<&str>,
    ) -> Result<EnhancedMatchResponse> {
        let page = page.max(1);
        info!("Listing stored {} matches (page: {}, day: {:?})", match_type, page, day);

        let mut query = MatchQuery::by_time_status(match_type.time_status());
        if let Some(day) = day {
            query = query.with_time_range(day_to_timestamp_range(day)?);
        }

        let (records, pager) = if match_type.is_paginated() {
            let total = self.store.count_matches(&query).await?;
            let skip = u64::from(page - 1) * u64::from(PAGE_SIZE);
            let records = self
                .store
                .find_matches(&query, skip, Some(i64::from(PAGE_SIZE)))
                .await?;
            let pager = Pager {
                page,
                per_page: PAGE_SIZE,
                total: u32::try_from(total).unwrap_or(u32::MAX),
            };
            (records, Some(pager))
        } else {
            (self.store.find_matches(&query, 0, None).await?, None)
        };

        let results: Vec<EnhancedMatch> = records
            .iter()
            .map(|record| EnhancedMatch { view: format_match(record), is_modified: true })
            .collect();
        let count = results.len();

        Ok(EnhancedMatchResponse {
            results,
            pager,
            enhanced: true,
            stats: ListingStats {
                total_matches: count,
                modified_matches: count,
                local_only_matches: 0,
            },
        })
    }

    pub async fn get_enhanced_match_details(&self, event_id: &str) -> Result<MatchDetail> {
        let record = self.find_stored(event_id).await?;
        Ok(MatchDetail::from(&record))
    }

    /// Admin panel edit of `adminNote` / `status`.
    pub async fn update_admin_fields(
        &self,
        event_id: &str,
        update: &AdminMatchUpdate,
    ) -> Result<MatchDetail> {
        update.validate()?;
        if update.is_empty() {
            return Err(AppError::invalid_data("Nothing to update: provide adminNote or status"));
        }

        let record = self.find_stored(event_id).await?;
        let id = record
            .id
            .ok_or_else(|| AppError::persistence(format!("stored match {} has no _id", event_id)))?;

        let updated = self.store.apply_admin_update(id, update).await?;
        info!("✅ Admin fields updated for match {}", event_id);
        Ok(MatchDetail::from(&updated))
    }

    /// High scoring or shot-heavy matches among the first stored records.
    pub async fn get_high_quality_matches(&self, limit: usize) -> Result<HighQualityMatches> {
        let scanned = self
            .store
            .find_matches(&MatchQuery::default(), 0, Some(QUALITY_SCAN_LIMIT))
            .await?;

        let results: Vec<MatchView> = scanned
            .iter()
            .filter(|record| is_high_quality(record))
            .take(limit)
            .map(format_match)
            .collect();

        info!("⭐ {} high quality matches out of {} scanned", results.len(), scanned.len());
        Ok(HighQualityMatches { count: results.len(), results, criteria: QUALITY_CRITERIA })
    }

    pub async fn get_matches_with_stat(
        &self,
        stat_type: StatType,
        limit: usize,
    ) -> Result<MatchesWithStat> {
        let scanned = self
            .store
            .find_matches(&MatchQuery::default(), 0, Some(STAT_SCAN_LIMIT))
            .await?;

        let results: Vec<MatchView> = scanned
            .iter()
            .filter(|record| record.stats.as_ref().is_some_and(|s| stat_type.is_reported_in(s)))
            .take(limit)
            .map(format_match)
            .collect();

        Ok(MatchesWithStat { count: results.len(), results, stat_type })
    }

    pub async fn get_sample_data(&self) -> Result<SampleAnalysis> {
        let everything = MatchQuery::default();
        let (total_matches, records) = tokio::try_join!(
            self.store.count_matches(&everything),
            self.store.find_matches(&everything, 0, Some(SAMPLE_SIZE))
        )?;

        let samples: Vec<SampleRecord> = records.iter().map(SampleRecord::from).collect();
        Ok(SampleAnalysis {
            total_matches,
            sample_count: samples.len(),
            samples,
        })
    }

    async fn find_stored(&self, event_id: &str) -> Result<FootballMatch> {
        self.store
            .find_by_bets_api_id(event_id)
            .await?
            .ok_or_else(|| {
                AppError::MatchNotFound(format!(
                    "{} is not stored yet, run an auto sync first",
                    event_id
                ))
            })
    }
}
