// In-memory stand-ins for BetsAPI and MongoDB used by the service tests.
use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, DateTime as BsonDateTime};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::errors::{AppError, Result};
use crate::models::betsapi::{
    BetsApiListResponse, BetsApiMatch, FlexValue, MatchStats, MatchType, Pager, StatPair, Team,
};
use crate::models::football_match::{AdminMatchUpdate, FootballMatch, MatchPatch, MatchQuery};
use crate::models::sync::{SelectiveSyncOptions, SelectiveSyncResult, SyncCounts, SyncDetail};
use crate::services::betsapi_client::BetsApiProvider;
use crate::services::match_store::MatchRepository;
use crate::services::sync_observer::SyncObserver;

pub fn event(id: &str, time_status: &str, ss: Option<&str>) -> BetsApiMatch {
    BetsApiMatch {
        id: id.to_string(),
        sport_id: Some("1".into()),
        time: Some("1750000000".into()),
        time_status: Some(time_status.to_string()),
        home: Some(Team { name: Some(format!("Home {}", id)), ..Default::default() }),
        away: Some(Team { name: Some(format!("Away {}", id)), ..Default::default() }),
        ss: ss.map(str::to_string),
        ..Default::default()
    }
}

pub fn stats(entries: &[(&str, &str, &str)]) -> MatchStats {
    entries
        .iter()
        .map(|(name, home, away)| (name.to_string(), StatPair::new(*home, *away)))
        .collect()
}

pub fn page(results: Vec<BetsApiMatch>, page: u32, per_page: u32, total: u32) -> BetsApiListResponse {
    BetsApiListResponse {
        success: Some(FlexValue::Int(1)),
        pager: Some(Pager { page, per_page, total }),
        results,
        error: None,
    }
}

#[derive(Default)]
pub struct FakeBetsApi {
    events: Mutex<HashMap<String, BetsApiMatch>>,
    failing_events: Mutex<HashSet<String>>,
    listings: Mutex<HashMap<(MatchType, u32, Option<String>), BetsApiListResponse>>,
    failing_pages: Mutex<HashSet<(MatchType, u32)>>,
    pub list_calls: Mutex<Vec<(MatchType, u32, Option<String>)>>,
}

impl FakeBetsApi {
    pub fn with_event(self, event: BetsApiMatch) -> Self {
        self.events.lock().unwrap().insert(event.id.clone(), event);
        self
    }

    pub fn failing_event(self, event_id: &str) -> Self {
        self.failing_events.lock().unwrap().insert(event_id.to_string());
        self
    }

    pub fn with_listing(
        self,
        match_type: MatchType,
        page: u32,
        day: Option<&str>,
        response: BetsApiListResponse,
    ) -> Self {
        self.listings
            .lock()
            .unwrap()
            .insert((match_type, page, day.map(str::to_string)), response);
        self
    }

    pub fn failing_page(self, match_type: MatchType, page: u32) -> Self {
        self.failing_pages.lock().unwrap().insert((match_type, page));
        self
    }

    pub fn pages_requested(&self, match_type: MatchType) -> Vec<u32> {
        self.list_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(mt, _, _)| *mt == match_type)
            .map(|(_, page, _)| *page)
            .collect()
    }
}

#[async_trait]
impl BetsApiProvider for FakeBetsApi {
    async fn get_match_details(&self, event_id: &str) -> Result<Option<BetsApiMatch>> {
        if self.failing_events.lock().unwrap().contains(event_id) {
            return Err(AppError::external_api(format!("timeout fetching {}", event_id)));
        }
        Ok(self.events.lock().unwrap().get(event_id).cloned())
    }

    async fn list_matches(
        &self,
        match_type: MatchType,
        page: u32,
        day: Option<&str>,
    ) -> Result<BetsApiListResponse> {
        let day = day.map(str::to_string);
        self.list_calls.lock().unwrap().push((match_type, page, day.clone()));

        if self.failing_pages.lock().unwrap().contains(&(match_type, page)) {
            return Err(AppError::external_api(format!("{} page {} failed", match_type, page)));
        }

        Ok(self
            .listings
            .lock()
            .unwrap()
            .get(&(match_type, page, day))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryMatchStore {
    records: Mutex<Vec<FootballMatch>>,
    failing_writes: Mutex<HashSet<String>>,
    offline: Mutex<bool>,
}

impl InMemoryMatchStore {
    pub fn with_record(self, mut record: FootballMatch) -> Self {
        if record.id.is_none() {
            record.id = Some(ObjectId::new());
        }
        self.records.lock().unwrap().push(record);
        self
    }

    pub fn failing_write(self, bets_api_id: &str) -> Self {
        self.failing_writes.lock().unwrap().insert(bets_api_id.to_string());
        self
    }

    pub fn offline(self) -> Self {
        *self.offline.lock().unwrap() = true;
        self
    }

    pub fn get(&self, bets_api_id: &str) -> Option<FootballMatch> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.bets_api_id == bets_api_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn check_online(&self) -> Result<()> {
        if *self.offline.lock().unwrap() {
            return Err(AppError::ServiceUnavailable("MongoDB unreachable".into()));
        }
        Ok(())
    }

    fn check_writable(&self, bets_api_id: &str) -> Result<()> {
        self.check_online()?;
        if self.failing_writes.lock().unwrap().contains(bets_api_id) {
            return Err(AppError::persistence(format!("write rejected for {}", bets_api_id)));
        }
        Ok(())
    }

    // Applies a `$set` document the way MongoDB would.
    fn apply_set(&self, id: ObjectId, set: bson::Document) -> Result<FootballMatch> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == Some(id))
            .ok_or(AppError::DocumentNotFound)?;

        let mut document = bson::to_document(&*record)?;
        for (key, value) in set {
            document.insert(key, value);
        }
        *record = bson::from_document(document)
            .map_err(|e| AppError::persistence(format!("invalid document after update: {}", e)))?;
        Ok(record.clone())
    }

    fn bets_api_id_of(&self, id: ObjectId) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == Some(id))
            .map(|r| r.bets_api_id.clone())
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchStore {
    async fn ping(&self) -> Result<()> {
        self.check_online()
    }

    async fn find_by_bets_api_id(&self, bets_api_id: &str) -> Result<Option<FootballMatch>> {
        self.check_online()?;
        Ok(self.get(bets_api_id))
    }

    async fn find_matches(
        &self,
        query: &MatchQuery,
        skip: u64,
        limit: Option<i64>,
    ) -> Result<Vec<FootballMatch>> {
        self.check_online()?;
        let mut found: Vec<FootballMatch> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.time.cmp(&b.time));

        let found = found.into_iter().skip(skip as usize);
        Ok(match limit {
            Some(limit) => found.take(limit as usize).collect(),
            None => found.collect(),
        })
    }

    async fn count_matches(&self, query: &MatchQuery) -> Result<u64> {
        self.check_online()?;
        Ok(self.records.lock().unwrap().iter().filter(|r| query.matches(r)).count() as u64)
    }

    async fn create(&self, mut record: FootballMatch) -> Result<FootballMatch> {
        self.check_writable(&record.bets_api_id)?;
        if self.get(&record.bets_api_id).is_some() {
            return Err(AppError::persistence(format!("duplicate betsApiId {}", record.bets_api_id)));
        }
        let now = BsonDateTime::now();
        record.id = Some(ObjectId::new());
        record.created_at = Some(now);
        record.updated_at = Some(now);
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update_by_id(&self, id: ObjectId, patch: &MatchPatch) -> Result<FootballMatch> {
        let bets_api_id = self.bets_api_id_of(id).ok_or(AppError::DocumentNotFound)?;
        self.check_writable(&bets_api_id)?;
        self.apply_set(id, patch.to_set_document(BsonDateTime::now())?)
    }

    async fn apply_admin_update(
        &self,
        id: ObjectId,
        update: &AdminMatchUpdate,
    ) -> Result<FootballMatch> {
        self.check_online()?;
        self.apply_set(id, update.to_set_document(BsonDateTime::now())?)
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub processed: Mutex<Vec<SyncDetail>>,
    pub batches: Mutex<Vec<(usize, SelectiveSyncResult)>>,
    pub upsert_failures: Mutex<Vec<String>>,
    pub auto_syncs: Mutex<Vec<(MatchType, Option<String>, SyncCounts)>>,
}

impl SyncObserver for RecordingObserver {
    fn batch_started(&self, size: usize, _options: &SelectiveSyncOptions) {
        self.batches.lock().unwrap().push((size, SelectiveSyncResult::default()));
    }

    fn record_processed(&self, detail: &SyncDetail) {
        self.processed.lock().unwrap().push(detail.clone());
    }

    fn batch_finished(&self, result: &SelectiveSyncResult) {
        if let Some(last) = self.batches.lock().unwrap().last_mut() {
            last.1 = result.clone();
        }
    }

    fn upsert_failed(&self, event_id: &str, _error: &AppError) {
        self.upsert_failures.lock().unwrap().push(event_id.to_string());
    }

    fn auto_sync_finished(&self, match_type: MatchType, day: Option<&str>, counts: &SyncCounts) {
        self.auto_syncs
            .lock()
            .unwrap()
            .push((match_type, day.map(str::to_string), *counts));
    }
}
