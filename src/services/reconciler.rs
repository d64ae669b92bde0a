// services/reconciler.rs
use mongodb::bson::DateTime as BsonDateTime;
use std::sync::Arc;

use crate::errors::{AppError, Result};
use crate::models::betsapi::{BetsApiMatch, MatchStats};
use crate::models::football_match::{FootballMatch, MatchPatch};
use crate::models::sync::{
    SelectiveSyncOptions, SelectiveSyncResult, SyncDetail, SyncStatus, UpsertSummary,
    DATA_SOURCE_AUTO_SYNC, DATA_SOURCE_SELECTIVE_SYNC,
};
use crate::services::betsapi_client::BetsApiProvider;
use crate::services::match_store::MatchRepository;
use crate::services::sync_observer::{SyncObserver, TracingObserver};

pub const MSG_NOT_FOUND_UPSTREAM: &str = "not found upstream";
pub const MSG_NO_UPDATE_NEEDED: &str = "no update condition met";
pub const MSG_CREATED: &str = "created new match";
pub const MSG_UPDATED: &str = "updated existing match";

/// Decides, per upstream event, whether the local copy is created, updated
/// or left alone, and applies the merge policy for the chosen mode.
pub struct MatchReconciler {
    upstream: Arc<dyn BetsApiProvider>,
    store: Arc<dyn MatchRepository>,
    observer: Arc<dyn SyncObserver>,
}

impl MatchReconciler {
    pub fn new(upstream: Arc<dyn BetsApiProvider>, store: Arc<dyn MatchRepository>) -> Self {
        MatchReconciler {
            upstream,
            store,
            observer: Arc::new(TracingObserver),
        }
    }

    #[cfg(test)]
    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn observer(&self) -> Arc<dyn SyncObserver> {
        self.observer.clone()
    }

    /// Reconciles every id in input order. Per-id failures end up in the
    /// details; only an unreachable store fails the whole call.
    pub async fn selective_sync(
        &self,
        event_ids: &[String],
        options: SelectiveSyncOptions,
    ) -> Result<SelectiveSyncResult> {
        self.store.ping().await?;
        self.observer.batch_started(event_ids.len(), &options);

        let mut result = SelectiveSyncResult::default();
        for event_id in event_ids {
            let detail = self.reconcile_one(event_id, options).await;
            self.observer.record_processed(&detail);
            result.record(detail);
        }

        self.observer.batch_finished(&result);
        Ok(result)
    }

    pub async fn reconcile_one(&self, event_id: &str, options: SelectiveSyncOptions) -> SyncDetail {
        match self.try_reconcile(event_id, options).await {
            Ok(detail) => detail,
            Err(e) => SyncDetail::new(event_id, SyncStatus::Error, e.to_string()),
        }
    }

    async fn try_reconcile(&self, event_id: &str, options: SelectiveSyncOptions) -> Result<SyncDetail> {
        let Some(upstream) = self.upstream.get_match_details(event_id).await? else {
            return Ok(SyncDetail::new(event_id, SyncStatus::Skipped, MSG_NOT_FOUND_UPSTREAM));
        };

        let now = BsonDateTime::now();

        let Some(existing) = self.store.find_by_bets_api_id(event_id).await? else {
            let mut record = FootballMatch::from_upstream(&upstream, DATA_SOURCE_SELECTIVE_SYNC, now);
            record.bets_api_id = event_id.to_string();
            self.store.create(record).await?;
            return Ok(SyncDetail::new(event_id, SyncStatus::Created, MSG_CREATED));
        };

        if !needs_update(&existing, &upstream, &options) {
            return Ok(SyncDetail::new(event_id, SyncStatus::Skipped, MSG_NO_UPDATE_NEEDED));
        }

        let id = existing
            .id
            .ok_or_else(|| AppError::persistence(format!("stored match {} has no _id", event_id)))?;
        let patch = build_update_patch(&existing, &upstream, &options, now);
        self.store.update_by_id(id, &patch).await?;

        Ok(SyncDetail::new(event_id, SyncStatus::Updated, MSG_UPDATED))
    }

    /// Bulk upsert of events already fetched from a listing endpoint.
    pub async fn upsert_events(&self, events: &[BetsApiMatch]) -> UpsertSummary {
        let mut summary = UpsertSummary::default();

        for event in events {
            match self.upsert_event(event).await {
                Ok(SyncStatus::Created) => summary.created += 1,
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    summary.failed += 1;
                    self.observer.upsert_failed(&event.id, &e);
                }
            }
        }

        summary
    }

    async fn upsert_event(&self, event: &BetsApiMatch) -> Result<SyncStatus> {
        let now = BsonDateTime::now();

        match self.store.find_by_bets_api_id(&event.id).await? {
            None => {
                let record = FootballMatch::from_upstream(event, DATA_SOURCE_AUTO_SYNC, now);
                self.store.create(record).await?;
                Ok(SyncStatus::Created)
            }
            Some(existing) => {
                let id = existing.id.ok_or_else(|| {
                    AppError::persistence(format!("stored match {} has no _id", event.id))
                })?;
                self.store.update_by_id(id, &listing_patch(event, now)).await?;
                Ok(SyncStatus::Updated)
            }
        }
    }
}

/// Update-needed decision for an already stored match.
pub fn needs_update(
    existing: &FootballMatch,
    upstream: &BetsApiMatch,
    options: &SelectiveSyncOptions,
) -> bool {
    if options.force_overwrite {
        return true;
    }

    if options.stats_only {
        return !existing.has_stats();
    }

    // An absent stats object always qualifies, even when upstream has none
    // to offer either.
    Some(existing.time_status.as_str()) != upstream.time_status.as_deref()
        || existing.ss != upstream.ss
        || existing.stats.is_none()
}

/// Patch for an update decided by `needs_update`. Only fields upstream
/// actually provides are set.
pub fn build_update_patch(
    existing: &FootballMatch,
    upstream: &BetsApiMatch,
    options: &SelectiveSyncOptions,
    now: BsonDateTime,
) -> MatchPatch {
    let mut patch = if options.stats_only {
        MatchPatch {
            stats: upstream
                .stats
                .as_ref()
                .map(|incoming| merge_stats(existing.stats.as_ref(), incoming)),
            timer: upstream.timer.clone(),
            ..Default::default()
        }
    } else {
        MatchPatch {
            time_status: upstream.time_status.clone(),
            ss: upstream.ss.clone(),
            scores: upstream.scores.clone(),
            timer: upstream.timer.clone(),
            stats: upstream.stats.clone(),
            home: upstream.home.clone(),
            away: upstream.away.clone(),
            o_home: upstream.o_home.clone(),
            o_away: upstream.o_away.clone(),
            ..Default::default()
        }
    };

    patch.last_sync_at = Some(now);
    patch.data_source = Some(options.data_source().to_string());
    patch
}

/// Stats-only merge: incoming series win, stored series missing from the
/// incoming payload are kept.
pub fn merge_stats(existing: Option<&MatchStats>, incoming: &MatchStats) -> MatchStats {
    let mut merged = existing.cloned().unwrap_or_default();
    for (name, pair) in incoming {
        merged.insert(name.clone(), pair.clone());
    }
    merged
}

/// Sync-relevant fields refreshed by the listing-driven bulk upsert.
pub fn listing_patch(event: &BetsApiMatch, now: BsonDateTime) -> MatchPatch {
    MatchPatch {
        time: event.time.clone(),
        time_status: event.time_status.clone(),
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
        last_sync_at: Some(now),
        data_source: Some(DATA_SOURCE_AUTO_SYNC.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::betsapi::{MatchTimer, FlexValue, Team};
    use crate::models::sync::{DATA_SOURCE_FORCE_SYNC, DATA_SOURCE_STATS_SYNC};
    use crate::services::testing::{event, stats, FakeBetsApi, InMemoryMatchStore, RecordingObserver};

    fn stored(id: &str, time_status: &str, ss: Option<&str>, match_stats: Option<MatchStats>) -> FootballMatch {
        let mut record = FootballMatch::from_upstream(&event(id, time_status, ss), "seed", BsonDateTime::now());
        record.stats = match_stats;
        record.admin_note = Some(format!("note for {}", id));
        record
    }

    fn reconciler(upstream: FakeBetsApi, store: Arc<InMemoryMatchStore>) -> MatchReconciler {
        MatchReconciler::new(Arc::new(upstream), store)
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn creates_unseen_match() {
        let upstream = FakeBetsApi::default().with_event(event("100", "1", Some("1-0")));
        let store = Arc::new(InMemoryMatchStore::default());

        let detail = reconciler(upstream, store.clone())
            .reconcile_one("100", SelectiveSyncOptions::default())
            .await;

        assert_eq!(detail.status, SyncStatus::Created);
        let record = store.get("100").unwrap();
        assert!(record.last_sync_at.is_some());
        assert!(record.admin_note.is_none());
        assert_eq!(record.data_source.as_deref(), Some(DATA_SOURCE_SELECTIVE_SYNC));
        assert_eq!(record.status, "active");
        assert_eq!(record.ss.as_deref(), Some("1-0"));
    }

    #[tokio::test]
    async fn skips_when_missing_upstream() {
        let store = Arc::new(InMemoryMatchStore::default());
        let detail = reconciler(FakeBetsApi::default(), store.clone())
            .reconcile_one("404", SelectiveSyncOptions::default())
            .await;

        assert_eq!(detail.status, SyncStatus::Skipped);
        assert_eq!(detail.message, MSG_NOT_FOUND_UPSTREAM);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn stats_only_skips_when_local_stats_present() {
        let mut incoming = event("7", "3", Some("3-3"));
        incoming.stats = Some(stats(&[("goals", "3", "3"), ("corners", "9", "2")]));
        let upstream = FakeBetsApi::default().with_event(incoming);

        let local_stats = stats(&[("goals", "0", "0")]);
        let store = Arc::new(
            InMemoryMatchStore::default().with_record(stored("7", "1", Some("0-0"), Some(local_stats.clone()))),
        );

        let detail = reconciler(upstream, store.clone())
            .reconcile_one("7", SelectiveSyncOptions::stats_only())
            .await;

        assert_eq!(detail.status, SyncStatus::Skipped);
        assert_eq!(detail.message, MSG_NO_UPDATE_NEEDED);
        assert_eq!(store.get("7").unwrap().stats, Some(local_stats));
    }

    #[tokio::test]
    async fn stats_only_fills_empty_stats_and_leaves_other_fields() {
        let mut incoming = event("8", "3", Some("2-1"));
        incoming.stats = Some(stats(&[("goals", "2", "1")]));
        incoming.timer = Some(MatchTimer { tm: Some(FlexValue::Int(90)), ..Default::default() });
        let upstream = FakeBetsApi::default().with_event(incoming);

        let store = Arc::new(
            InMemoryMatchStore::default().with_record(stored("8", "1", Some("0-0"), Some(MatchStats::new()))),
        );

        let detail = reconciler(upstream, store.clone())
            .reconcile_one("8", SelectiveSyncOptions::stats_only())
            .await;

        assert_eq!(detail.status, SyncStatus::Updated);
        let record = store.get("8").unwrap();
        assert_eq!(record.stats, Some(stats(&[("goals", "2", "1")])));
        assert!(record.timer.is_some());
        assert_eq!(record.time_status, "1");
        assert_eq!(record.ss.as_deref(), Some("0-0"));
        assert_eq!(record.data_source.as_deref(), Some(DATA_SOURCE_STATS_SYNC));
    }

    #[tokio::test]
    async fn default_mode_updates_on_time_status_change() {
        let upstream = FakeBetsApi::default().with_event(event("9", "3", Some("0-0")));
        let store = Arc::new(
            InMemoryMatchStore::default()
                .with_record(stored("9", "1", Some("0-0"), Some(stats(&[("goals", "0", "0")])))),
        );

        let detail = reconciler(upstream, store.clone())
            .reconcile_one("9", SelectiveSyncOptions::default())
            .await;

        assert_eq!(detail.status, SyncStatus::Updated);
        assert_eq!(store.get("9").unwrap().time_status, "3");
    }

    #[tokio::test]
    async fn default_mode_skips_unchanged_match_with_stats() {
        let upstream = FakeBetsApi::default().with_event(event("10", "1", Some("1-1")));
        let store = Arc::new(
            InMemoryMatchStore::default()
                .with_record(stored("10", "1", Some("1-1"), Some(stats(&[("goals", "1", "1")])))),
        );

        let detail = reconciler(upstream, store)
            .reconcile_one("10", SelectiveSyncOptions::default())
            .await;

        assert_eq!(detail.status, SyncStatus::Skipped);
    }

    #[tokio::test]
    async fn forced_update_keeps_local_teams_upstream_omits() {
        let mut incoming = event("11", "1", Some("1-1"));
        incoming.home = None;
        incoming.o_away = Some(Team { name: Some("Original Away".into()), ..Default::default() });
        let upstream = FakeBetsApi::default().with_event(incoming);

        let store = Arc::new(
            InMemoryMatchStore::default()
                .with_record(stored("11", "1", Some("1-1"), Some(stats(&[("goals", "1", "1")])))),
        );

        let detail = reconciler(upstream, store.clone())
            .reconcile_one("11", SelectiveSyncOptions::forced())
            .await;

        assert_eq!(detail.status, SyncStatus::Updated);
        let record = store.get("11").unwrap();
        assert_eq!(record.home.unwrap().name.as_deref(), Some("Home 11"));
        assert_eq!(record.o_away.unwrap().name.as_deref(), Some("Original Away"));
        assert_eq!(record.data_source.as_deref(), Some(DATA_SOURCE_FORCE_SYNC));
        // upstream sent no stats, so the stored series stay
        assert_eq!(record.stats, Some(stats(&[("goals", "1", "1")])));
    }

    #[tokio::test]
    async fn forced_stats_only_merges_additively() {
        let mut incoming = event("12", "3", None);
        incoming.stats = Some(stats(&[("goals", "2", "0"), ("xg", "1.8", "0.4")]));
        let upstream = FakeBetsApi::default().with_event(incoming);

        let local = stats(&[("goals", "1", "0"), ("yellowcards", "2", "3")]);
        let store = Arc::new(InMemoryMatchStore::default().with_record(stored("12", "1", None, Some(local))));

        let options = SelectiveSyncOptions { force_overwrite: true, stats_only: true };
        let detail = reconciler(upstream, store.clone()).reconcile_one("12", options).await;

        assert_eq!(detail.status, SyncStatus::Updated);
        let merged = store.get("12").unwrap().stats.unwrap();
        assert_eq!(
            merged,
            stats(&[("goals", "2", "0"), ("xg", "1.8", "0.4"), ("yellowcards", "2", "3")])
        );
    }

    #[tokio::test]
    async fn admin_note_survives_every_mode() {
        let modes = [
            SelectiveSyncOptions::default(),
            SelectiveSyncOptions::stats_only(),
            SelectiveSyncOptions::forced(),
            SelectiveSyncOptions { force_overwrite: true, stats_only: true },
        ];

        for options in modes {
            let mut incoming = event("13", "3", Some("4-2"));
            incoming.stats = Some(stats(&[("goals", "4", "2")]));
            let upstream = FakeBetsApi::default().with_event(incoming.clone());
            let store = Arc::new(InMemoryMatchStore::default().with_record(stored("13", "1", None, None)));
            let engine = reconciler(upstream, store.clone());

            engine.reconcile_one("13", options).await;
            engine.upsert_events(&[incoming]).await;

            assert_eq!(
                store.get("13").unwrap().admin_note.as_deref(),
                Some("note for 13"),
                "admin note changed under {:?}",
                options
            );
        }
    }

    #[tokio::test]
    async fn batch_survives_transient_failures() {
        let upstream = FakeBetsApi::default()
            .with_event(event("1", "0", None))
            .with_event(event("2", "0", None))
            .with_event(event("4", "1", Some("0-0")))
            .failing_event("3")
            .failing_event("5");
        let store = Arc::new(InMemoryMatchStore::default().failing_write("4"));
        let observer = Arc::new(RecordingObserver::default());
        let engine = reconciler(upstream, store).with_observer(observer.clone());

        let result = engine
            .selective_sync(&ids(&["1", "2", "3", "4", "5"]), SelectiveSyncOptions::default())
            .await
            .unwrap();

        assert_eq!(result.details.len(), 5);
        assert_eq!(result.processed(), 5);
        assert_eq!(result.created, 2);
        assert_eq!(result.errors, 3);
        let order: Vec<&str> = result.details.iter().map(|d| d.event_id.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(result.details[2].status, SyncStatus::Error);
        assert!(result.details[2].message.contains("timeout"));

        assert_eq!(observer.processed.lock().unwrap().len(), 5);
        let batches = observer.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, 5);
        assert_eq!(batches[0].1, result);
    }

    #[tokio::test]
    async fn batch_where_everything_fails_still_reports() {
        let upstream = FakeBetsApi::default().failing_event("a").failing_event("b");
        let store = Arc::new(InMemoryMatchStore::default());

        let result = reconciler(upstream, store)
            .selective_sync(&ids(&["a", "b"]), SelectiveSyncOptions::default())
            .await
            .unwrap();

        assert_eq!(result.errors, 2);
        assert_eq!(result.details.len(), 2);
    }

    #[tokio::test]
    async fn unreachable_store_fails_the_batch() {
        let upstream = FakeBetsApi::default().with_event(event("1", "0", None));
        let store = Arc::new(InMemoryMatchStore::default().offline());

        let err = reconciler(upstream, store)
            .selective_sync(&ids(&["1"]), SelectiveSyncOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn upsert_creates_and_updates_and_counts_failures() {
        let store = Arc::new(
            InMemoryMatchStore::default()
                .with_record(stored("20", "0", None, Some(stats(&[("goals", "0", "0")]))))
                .failing_write("22"),
        );
        let observer = Arc::new(RecordingObserver::default());
        let engine = reconciler(FakeBetsApi::default(), store.clone()).with_observer(observer.clone());

        let summary = engine
            .upsert_events(&[event("20", "1", Some("1-0")), event("21", "0", None), event("22", "0", None)])
            .await;

        assert_eq!(summary, UpsertSummary { created: 1, updated: 1, failed: 1 });
        let updated = store.get("20").unwrap();
        assert_eq!(updated.time_status, "1");
        assert_eq!(updated.data_source.as_deref(), Some(DATA_SOURCE_AUTO_SYNC));
        // listing payload had no stats
        assert_eq!(updated.stats, Some(stats(&[("goals", "0", "0")])));
        assert_eq!(*observer.upsert_failures.lock().unwrap(), vec!["22".to_string()]);
    }

    #[test]
    fn needs_update_when_stats_absent_even_if_upstream_has_none() {
        let existing = stored("30", "1", Some("0-0"), None);
        let upstream = event("30", "1", Some("0-0"));
        assert!(needs_update(&existing, &upstream, &SelectiveSyncOptions::default()));
    }

    #[test]
    fn needs_update_on_score_change() {
        let existing = stored("31", "1", Some("0-0"), Some(stats(&[("goals", "0", "0")])));
        let upstream = event("31", "1", Some("1-0"));
        assert!(needs_update(&existing, &upstream, &SelectiveSyncOptions::default()));
        assert!(!needs_update(&existing, &upstream, &SelectiveSyncOptions::stats_only()));
    }

    #[test]
    fn default_patch_sets_only_provided_fields() {
        let existing = stored("32", "1", None, None);
        let mut upstream = event("32", "3", Some("2-2"));
        upstream.away = None;
        let now = BsonDateTime::now();

        let patch = build_update_patch(&existing, &upstream, &SelectiveSyncOptions::default(), now);
        assert_eq!(patch.time_status.as_deref(), Some("3"));
        assert_eq!(patch.ss.as_deref(), Some("2-2"));
        assert!(patch.away.is_none());
        assert!(patch.stats.is_none());
        assert_eq!(patch.last_sync_at, Some(now));
        assert_eq!(patch.data_source.as_deref(), Some(DATA_SOURCE_SELECTIVE_SYNC));
    }

    #[test]
    fn merge_keeps_absent_keys_and_zero_values() {
        let existing = stats(&[("redcards", "0", "0"), ("goals", "1", "0")]);
        let incoming = stats(&[("goals", "1", "1")]);
        let merged = merge_stats(Some(&existing), &incoming);
        assert_eq!(merged, stats(&[("goals", "1", "1"), ("redcards", "0", "0")]));

        assert_eq!(merge_stats(None, &incoming), incoming);
    }
}
