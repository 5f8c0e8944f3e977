//! Catalog reconciliation
//!
//! When the quest catalog changes, historical progress documents drift:
//! they miss newly introduced objectives and carry stale thresholds,
//! rewards, and ranks. Reconciliation evolves a document to the current
//! catalog without losing earned progress or claimed rewards. States whose
//! objective left the catalog stay in place, so claimed reward history
//! survives.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{ObjectiveCatalog, ObjectiveDef, QuestType};
use crate::db::schemas::{ObjectiveState, ProgressDoc};
use crate::progress::doc::check_completion;
use crate::store::ProgressStore;
use crate::types::Result;

/// Bring one document in line with the catalog's current objectives
///
/// Returns None when the document already matches. Newly appended states
/// start unclaimed but are immediately evaluated against the running
/// totals, so an objective the user's counters already cover reads as
/// completed (the shared counters make no distinction about when the
/// progress happened).
pub fn reconcile(doc: &ProgressDoc, catalog: &[ObjectiveDef]) -> Option<ProgressDoc> {
    let mut next = doc.clone();
    let mut changed = false;

    for def in catalog {
        let existing = next
            .objectives
            .iter()
            .position(|s| s.objective_id == def.id);

        match existing {
            Some(i) => {
                let state = &mut next.objectives[i];
                let message_threshold = def.message_threshold();
                let success_threshold = def.success_threshold();
                let drifted = state.message_threshold != message_threshold
                    || state.success_threshold != success_threshold
                    || state.xp_reward != def.xp_reward
                    || state.order != def.order;

                if drifted {
                    state.message_threshold = message_threshold;
                    state.success_threshold = success_threshold;
                    state.xp_reward = def.xp_reward;
                    state.order = def.order;
                    changed = true;
                }
            }
            None => {
                next.objectives.push(ObjectiveState::from_def(def));
                changed = true;
            }
        }
    }

    if !changed {
        return None;
    }

    // Stable sort keeps orphaned states in their relative positions
    next.objectives.sort_by_key(|s| s.order);

    // A refreshed threshold or appended objective may already be satisfied
    Some(check_completion(next))
}

/// Outcome counts of a tenant-wide reconciliation sweep
#[derive(Serialize, Clone, Copy, Debug, Default)]
pub struct SweepReport {
    /// Documents examined
    pub examined: u64,
    /// Documents that drifted and were rewritten
    pub updated: u64,
    /// Documents whose write failed (picked up by the next sweep)
    pub failed: u64,
}

/// Reconciles a tenant's progress documents against the live catalog
pub struct CatalogReconciler {
    store: Arc<dyn ProgressStore>,
    catalog: Arc<dyn ObjectiveCatalog>,
}

impl CatalogReconciler {
    /// Create a reconciler over the given collaborators
    pub fn new(store: Arc<dyn ProgressStore>, catalog: Arc<dyn ObjectiveCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Reconcile every progress document of a tenant
    ///
    /// Each document is independent and best-effort: a failed write is
    /// counted and skipped, never fatal to the sweep.
    pub async fn sweep(&self, tenant_id: &str) -> Result<SweepReport> {
        let quests = self.catalog.list_all(tenant_id).await?;
        let by_type: HashMap<QuestType, Vec<ObjectiveDef>> = quests.into_iter().collect();

        let docs = self.store.list_all(tenant_id).await?;
        let mut report = SweepReport::default();

        for doc in docs {
            report.examined += 1;

            let Some(defs) = by_type.get(&doc.quest_type) else {
                continue;
            };

            let Some(next) = reconcile(&doc, defs) else {
                continue;
            };

            let period_key = next.period_key.clone();
            match self.store.replace(next).await {
                Ok(_) => {
                    debug!(
                        tenant = %tenant_id,
                        user = %doc.user_id,
                        period = %period_key,
                        "Reconciled progress document"
                    );
                    report.updated += 1;
                }
                Err(e) => {
                    warn!(
                        tenant = %tenant_id,
                        user = %doc.user_id,
                        period = %period_key,
                        "Skipping document after failed reconcile write: {}",
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            tenant = %tenant_id,
            examined = report.examined,
            updated = report.updated,
            failed = report.failed,
            "Catalog reconciliation sweep finished"
        );

        Ok(report)
    }
}
