// services/match_store.rs
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::{debug, info};

use crate::errors::{AppError, Result};
use crate::models::football_match::{
    AdminMatchUpdate, FootballMatch, MatchPatch, MatchQuery, COLLECTION,
};

/// Persistence for mirrored matches, keyed by the provider id.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Fails when the store cannot be reached at all.
    async fn ping(&self) -> Result<()>;

    async fn find_by_bets_api_id(&self, bets_api_id: &str) -> Result<Option<FootballMatch>>;

    async fn find_matches(
        &self,
        query: &MatchQuery,
        skip: u64,
        limit: Option<i64>,
    ) -> Result<Vec<FootballMatch>>;

    async fn count_matches(&self, query: &MatchQuery) -> Result<u64>;

    async fn create(&self, record: FootballMatch) -> Result<FootballMatch>;

    async fn update_by_id(&self, id: ObjectId, patch: &MatchPatch) -> Result<FootballMatch>;

    async fn apply_admin_update(
        &self,
        id: ObjectId,
        update: &AdminMatchUpdate,
    ) -> Result<FootballMatch>;
}

#[derive(Clone)]
pub struct MongoMatchStore {
    db: Database,
    collection: Collection<FootballMatch>,
}

impl MongoMatchStore {
    pub fn new(db: &Database) -> Self {
        MongoMatchStore {
            db: db.clone(),
            collection: db.collection(COLLECTION),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "betsApiId": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder().keys(doc! { "time_status": 1 }).build(),
            IndexModel::builder().keys(doc! { "time": 1 }).build(),
        ];

        let result = self.collection.create_indexes(indexes).await?;
        info!("Ensured {} indexes on '{}'", result.index_names.len(), COLLECTION);
        Ok(())
    }
}

#[async_trait]
impl MatchRepository for MongoMatchStore {
    async fn ping(&self) -> Result<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("MongoDB unreachable: {}", e)))?;
        Ok(())
    }

    async fn find_by_bets_api_id(&self, bets_api_id: &str) -> Result<Option<FootballMatch>> {
        let found = self
            .collection
            .find_one(doc! { "betsApiId": bets_api_id })
            .await?;
        Ok(found)
    }

    async fn find_matches(
        &self,
        query: &MatchQuery,
        skip: u64,
        limit: Option<i64>,
    ) -> Result<Vec<FootballMatch>> {
        let filter = query.to_filter();
        debug!("   → Database filter: {:?}", filter);

        let mut find = self
            .collection
            .find(filter)
            .sort(doc! { "time": 1 })
            .skip(skip);
        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let matches: Vec<FootballMatch> = find.await?.try_collect().await?;
        Ok(matches)
    }

    async fn count_matches(&self, query: &MatchQuery) -> Result<u64> {
        let count = self.collection.count_documents(query.to_filter()).await?;
        Ok(count)
    }

    async fn create(&self, mut record: FootballMatch) -> Result<FootballMatch> {
        let now = BsonDateTime::now();
        record.id = None;
        record.created_at = Some(now);
        record.updated_at = Some(now);

        let inserted = self.collection.insert_one(&record).await?;
        let id = inserted
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AppError::persistence("Failed to get inserted ID"))?;

        record.id = Some(id);
        Ok(record)
    }

    async fn update_by_id(&self, id: ObjectId, patch: &MatchPatch) -> Result<FootballMatch> {
        let set = patch.to_set_document(BsonDateTime::now())?;

        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(AppError::DocumentNotFound)
    }

    async fn apply_admin_update(
        &self,
        id: ObjectId,
        update: &AdminMatchUpdate,
    ) -> Result<FootballMatch> {
        let set = update.to_set_document(BsonDateTime::now())?;

        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or(AppError::DocumentNotFound)
    }
}
