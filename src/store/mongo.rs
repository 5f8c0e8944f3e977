//! MongoDB-backed progress store
//!
//! Lazy creation uses `findOneAndUpdate` with upsert and `$setOnInsert`;
//! conditional writes pin `metadata.version` in the filter, so a lost race
//! comes back as no-match instead of a silent overwrite. The unique
//! (tenant, user, period) index backs the upsert.

use async_trait::async_trait;
use bson::doc;

use crate::db::schemas::{ProgressDoc, PROGRESS_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::store::{ProgressSeed, ProgressStore};
use crate::types::{QuestlineError, Result};

/// Progress store over the `quest_progress` collection
pub struct MongoProgressStore {
    collection: MongoCollection<ProgressDoc>,
}

impl MongoProgressStore {
    /// Create a store over the given client
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo
            .collection::<ProgressDoc>(PROGRESS_COLLECTION)
            .await
            .map_err(|e| QuestlineError::StoreUnavailable(e.to_string()))?;
        Ok(Self { collection })
    }
}

#[async_trait]
impl ProgressStore for MongoProgressStore {
    async fn find_or_init(
        &self,
        tenant_id: &str,
        user_id: &str,
        period_key: &str,
        seed: ProgressSeed,
    ) -> Result<ProgressDoc> {
        let seeded = ProgressDoc::seeded(
            tenant_id,
            user_id,
            seed.quest_type,
            period_key,
            seed.objectives,
        );

        let mut on_insert = bson::to_document(&seeded)
            .map_err(|e| QuestlineError::StoreUnavailable(format!("Seed encoding failed: {}", e)))?;
        on_insert.remove("_id");

        let doc = self
            .collection
            .find_one_and_update(
                doc! {
                    "tenant_id": tenant_id,
                    "user_id": user_id,
                    "period_key": period_key,
                },
                doc! { "$setOnInsert": on_insert },
                true,
            )
            .await
            .map_err(|e| QuestlineError::StoreUnavailable(e.to_string()))?;

        doc.ok_or_else(|| {
            QuestlineError::StoreUnavailable(format!(
                "Upsert returned no document for {}/{}/{}",
                tenant_id, user_id, period_key
            ))
        })
    }

    async fn find(
        &self,
        tenant_id: &str,
        user_id: &str,
        period_key: &str,
    ) -> Result<Option<ProgressDoc>> {
        self.collection
            .find_one(doc! {
                "tenant_id": tenant_id,
                "user_id": user_id,
                "period_key": period_key,
            })
            .await
            .map_err(|e| QuestlineError::StoreUnavailable(e.to_string()))
    }

    async fn replace(&self, doc: ProgressDoc) -> Result<ProgressDoc> {
        let expected = doc.metadata.version;

        let filter = doc! {
            "tenant_id": &doc.tenant_id,
            "user_id": &doc.user_id,
            "period_key": &doc.period_key,
            "metadata.version": expected,
        };

        let key = format!("{}/{}/{}", doc.tenant_id, doc.user_id, doc.period_key);

        self.collection
            .find_one_and_replace(filter, doc)
            .await
            .map_err(|e| QuestlineError::StoreUnavailable(e.to_string()))?
            .ok_or_else(|| {
                QuestlineError::PreconditionFailed(format!("version {} for {}", expected, key))
            })
    }

    async fn list_all(&self, tenant_id: &str) -> Result<Vec<ProgressDoc>> {
        self.collection
            .find_many(doc! { "tenant_id": tenant_id })
            .await
            .map_err(|e| QuestlineError::StoreUnavailable(e.to_string()))
    }
}
