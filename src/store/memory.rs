//! In-memory progress store
//!
//! DashMap-backed twin of the MongoDB store for development and tests.
//! Shard locks make `find_or_init` and the version-guarded `replace` atomic
//! the same way the MongoDB primitives are.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::db::schemas::ProgressDoc;
use crate::store::{ProgressSeed, ProgressStore};
use crate::types::{QuestlineError, Result};

type DocKey = (String, String, String);

/// Thread-safe in-memory progress store
#[derive(Default)]
pub struct MemoryProgressStore {
    docs: DashMap<DocKey, ProgressDoc>,
}

impl MemoryProgressStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents held (test helper)
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the store holds no documents
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn key(tenant_id: &str, user_id: &str, period_key: &str) -> DocKey {
        (
            tenant_id.to_string(),
            user_id.to_string(),
            period_key.to_string(),
        )
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn find_or_init(
        &self,
        tenant_id: &str,
        user_id: &str,
        period_key: &str,
        seed: ProgressSeed,
    ) -> Result<ProgressDoc> {
        let entry = self
            .docs
            .entry(Self::key(tenant_id, user_id, period_key))
            .or_insert_with(|| {
                ProgressDoc::seeded(
                    tenant_id,
                    user_id,
                    seed.quest_type,
                    period_key,
                    seed.objectives,
                )
            });
        Ok(entry.value().clone())
    }

    async fn find(
        &self,
        tenant_id: &str,
        user_id: &str,
        period_key: &str,
    ) -> Result<Option<ProgressDoc>> {
        Ok(self
            .docs
            .get(&Self::key(tenant_id, user_id, period_key))
            .map(|entry| entry.value().clone()))
    }

    async fn replace(&self, doc: ProgressDoc) -> Result<ProgressDoc> {
        let key = Self::key(&doc.tenant_id, &doc.user_id, &doc.period_key);

        match self.docs.get_mut(&key) {
            Some(mut entry) => {
                if entry.metadata.version != doc.metadata.version {
                    return Err(QuestlineError::PreconditionFailed(format!(
                        "version {} for {}/{}/{}",
                        doc.metadata.version, doc.tenant_id, doc.user_id, doc.period_key
                    )));
                }
                let mut next = doc;
                next.metadata.touch();
                *entry = next.clone();
                Ok(next)
            }
            None => Err(QuestlineError::PreconditionFailed(format!(
                "no document for {}/{}/{}",
                doc.tenant_id, doc.user_id, doc.period_key
            ))),
        }
    }

    async fn list_all(&self, tenant_id: &str) -> Result<Vec<ProgressDoc>> {
        Ok(self
            .docs
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .map(|entry| entry.value().clone())
            .collect())
    }
}
