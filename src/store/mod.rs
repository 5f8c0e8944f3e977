//! Progress store collaborator
//!
//! Durable home of the per-(tenant, user, period) progress documents. The
//! two write primitives are deliberately narrow: an atomic
//! upsert-with-defaults for lazy creation, and a version-guarded replace so
//! concurrent writers can never silently overwrite each other. Allows
//! swapping implementations (in-memory for dev, MongoDB for prod).

mod memory;
mod mongo;

pub use memory::MemoryProgressStore;
pub use mongo::MongoProgressStore;

use async_trait::async_trait;

use crate::catalog::QuestType;
use crate::db::schemas::{ObjectiveState, ProgressDoc};
use crate::types::Result;

/// Defaults used when a period's document does not exist yet
#[derive(Debug, Clone)]
pub struct ProgressSeed {
    /// Quest type the document tracks
    pub quest_type: QuestType,
    /// Objective snapshots copied from the active catalog quest
    pub objectives: Vec<ObjectiveState>,
}

/// Durable per-period progress storage
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load the document for a period, creating it from the seed when
    /// missing. Creation is atomic: concurrent callers for the same key
    /// observe one document.
    async fn find_or_init(
        &self,
        tenant_id: &str,
        user_id: &str,
        period_key: &str,
        seed: ProgressSeed,
    ) -> Result<ProgressDoc>;

    /// Load the document for a period without creating it
    async fn find(
        &self,
        tenant_id: &str,
        user_id: &str,
        period_key: &str,
    ) -> Result<Option<ProgressDoc>>;

    /// Replace the stored document iff its version still matches
    /// `doc.metadata.version`; bumps the version on success. A lost race
    /// surfaces as `PreconditionFailed` and the caller reloads.
    async fn replace(&self, doc: ProgressDoc) -> Result<ProgressDoc>;

    /// All progress documents of a tenant, for reconciliation sweeps
    async fn list_all(&self, tenant_id: &str) -> Result<Vec<ProgressDoc>>;
}
