//! MongoDB-backed objective catalog
//!
//! Reads the quest configuration documents maintained by the external CRUD
//! service. Malformed objectives (both thresholds zero) are skipped with a
//! warning rather than poisoning the whole quest.

use async_trait::async_trait;
use bson::doc;
use tracing::warn;

use crate::catalog::{ObjectiveCatalog, ObjectiveDef, QuestType};
use crate::db::schemas::{QuestDoc, StoredObjective, QUEST_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{QuestlineError, Result};

/// Objective catalog reading the `quests` collection
pub struct MongoCatalog {
    collection: MongoCollection<QuestDoc>,
}

impl MongoCatalog {
    /// Create a catalog reader over the given client
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let collection = mongo
            .collection::<QuestDoc>(QUEST_COLLECTION)
            .await
            .map_err(|e| QuestlineError::CatalogUnavailable(e.to_string()))?;
        Ok(Self { collection })
    }

    fn to_defs(tenant_id: &str, quest_type: QuestType, stored: &[StoredObjective]) -> Vec<ObjectiveDef> {
        let mut defs: Vec<ObjectiveDef> = stored
            .iter()
            .filter_map(|o| {
                let def = ObjectiveDef::from_thresholds(
                    o.objective_id.clone(),
                    o.message_threshold,
                    o.success_threshold,
                    o.xp_reward,
                    o.order,
                );
                if def.is_none() {
                    warn!(
                        tenant = %tenant_id,
                        quest_type = %quest_type,
                        objective = %o.objective_id,
                        "Skipping objective with no measurable threshold"
                    );
                }
                def
            })
            .collect();
        defs.sort_by_key(|d| d.order);
        defs
    }
}

#[async_trait]
impl ObjectiveCatalog for MongoCatalog {
    async fn list_active(
        &self,
        tenant_id: &str,
        quest_type: QuestType,
    ) -> Result<Vec<ObjectiveDef>> {
        let quest = self
            .collection
            .find_one(doc! {
                "tenant_id": tenant_id,
                "quest_type": quest_type.as_str(),
                "active": true,
            })
            .await
            .map_err(|e| QuestlineError::CatalogUnavailable(e.to_string()))?;

        Ok(quest
            .map(|q| Self::to_defs(tenant_id, quest_type, &q.objectives))
            .unwrap_or_default())
    }

    async fn list_all(&self, tenant_id: &str) -> Result<Vec<(QuestType, Vec<ObjectiveDef>)>> {
        let mut all = Vec::new();
        for quest_type in QuestType::ALL {
            let defs = self.list_active(tenant_id, quest_type).await?;
            if !defs.is_empty() {
                all.push((quest_type, defs));
            }
        }
        Ok(all)
    }
}
