//! In-memory objective catalog
//!
//! Used in development and tests, where catalog mutations need to be
//! simulated without a MongoDB instance.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::catalog::{ObjectiveCatalog, ObjectiveDef, QuestType};
use crate::types::Result;

/// Thread-safe in-memory catalog
#[derive(Default)]
pub struct MemoryCatalog {
    quests: DashMap<(String, QuestType), Vec<ObjectiveDef>>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active quest objectives for a tenant and quest type
    pub fn set_objectives(
        &self,
        tenant_id: &str,
        quest_type: QuestType,
        mut objectives: Vec<ObjectiveDef>,
    ) {
        objectives.sort_by_key(|d| d.order);
        self.quests
            .insert((tenant_id.to_string(), quest_type), objectives);
    }

    /// Remove a tenant's quest of the given type
    pub fn clear(&self, tenant_id: &str, quest_type: QuestType) {
        self.quests.remove(&(tenant_id.to_string(), quest_type));
    }
}

#[async_trait]
impl ObjectiveCatalog for MemoryCatalog {
    async fn list_active(
        &self,
        tenant_id: &str,
        quest_type: QuestType,
    ) -> Result<Vec<ObjectiveDef>> {
        Ok(self
            .quests
            .get(&(tenant_id.to_string(), quest_type))
            .map(|entry| entry.value().clone())
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GoalMetric;

    fn def(id: &str, order: u32) -> ObjectiveDef {
        ObjectiveDef {
            id: id.into(),
            goal: GoalMetric::Messages(5),
            xp_reward: 10,
            order,
        }
    }

    #[tokio::test]
    async fn test_list_active_sorted_by_order() {
        let catalog = MemoryCatalog::new();
        catalog.set_objectives("acme", QuestType::Daily, vec![def("b", 2), def("a", 1)]);

        let defs = catalog.list_active("acme", QuestType::Daily).await.unwrap();
        assert_eq!(defs[0].id, "a");
        assert_eq!(defs[1].id, "b");
    }

    #[tokio::test]
    async fn test_list_all_skips_unconfigured_types() {
        let catalog = MemoryCatalog::new();
        catalog.set_objectives("acme", QuestType::Weekly, vec![def("w", 1)]);

        let all = catalog.list_all("acme").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, QuestType::Weekly);
    }

    #[tokio::test]
    async fn test_unknown_tenant_is_empty() {
        let catalog = MemoryCatalog::new();
        assert!(catalog
            .list_active("nobody", QuestType::Daily)
            .await
            .unwrap()
            .is_empty());
    }
}
