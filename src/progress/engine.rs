//! Quest progress engine
//!
//! Request-driven core surface: record an event, claim a reward, mark
//! completions seen, build the quest view. Every write goes through the
//! store's version-guarded replace; a lost race is reloaded and retried a
//! bounded number of times before surfacing as a store failure.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::{ObjectiveCatalog, ObjectiveDef, QuestType};
use crate::db::schemas::{ObjectiveState, ProgressDoc};
use crate::period::PeriodClock;
use crate::progress::doc::{self, EventOutcome};
use crate::progress::reconcile::{self, CatalogReconciler, SweepReport};
use crate::progress::snapshot::QuestSnapshot;
use crate::store::{ProgressSeed, ProgressStore};
use crate::types::{QuestlineError, Result};

/// Version-race retries before a write is reported failed
const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Both documents touched by one recorded event
#[derive(Clone, Debug)]
pub struct EventRecorded {
    /// The active daily period's document after the event
    pub daily: ProgressDoc,
    /// The active weekly period's document after the event
    pub weekly: ProgressDoc,
}

/// Result of a successful reward claim
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedReward {
    /// The claimed objective
    pub objective_id: String,
    /// XP granted, as recorded in the objective's snapshot
    pub xp_reward: u32,
}

/// The user's current daily and weekly quest views
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshots {
    /// Daily quest view
    pub daily: QuestSnapshot,
    /// Weekly quest view
    pub weekly: QuestSnapshot,
}

/// Core quest progress operations
pub struct ProgressEngine {
    store: Arc<dyn ProgressStore>,
    catalog: Arc<dyn ObjectiveCatalog>,
    clock: PeriodClock,
    retry_budget: u32,
}

impl ProgressEngine {
    /// Create an engine over the given collaborators
    pub fn new(
        store: Arc<dyn ProgressStore>,
        catalog: Arc<dyn ObjectiveCatalog>,
        clock: PeriodClock,
    ) -> Self {
        Self {
            store,
            catalog,
            clock,
            retry_budget: DEFAULT_RETRY_BUDGET,
        }
    }

    /// Override the version-race retry budget
    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget.max(1);
        self
    }

    /// Record a message event against the active daily and weekly periods
    pub async fn record_event(
        &self,
        tenant_id: &str,
        user_id: &str,
        outcome: EventOutcome,
    ) -> Result<EventRecorded> {
        self.record_event_at(tenant_id, user_id, outcome, Utc::now())
            .await
    }

    /// Record a message event as of the given instant
    pub async fn record_event_at(
        &self,
        tenant_id: &str,
        user_id: &str,
        outcome: EventOutcome,
        at: DateTime<Utc>,
    ) -> Result<EventRecorded> {
        let daily = self
            .record_for(tenant_id, user_id, QuestType::Daily, outcome, at)
            .await?;
        let weekly = self
            .record_for(tenant_id, user_id, QuestType::Weekly, outcome, at)
            .await?;

        Ok(EventRecorded { daily, weekly })
    }

    async fn record_for(
        &self,
        tenant_id: &str,
        user_id: &str,
        quest_type: QuestType,
        outcome: EventOutcome,
        at: DateTime<Utc>,
    ) -> Result<ProgressDoc> {
        let period_key = self.clock.period_key(quest_type, at);
        let defs = self.catalog.list_active(tenant_id, quest_type).await?;

        let mut attempts = 0;
        loop {
            let stored = self
                .store
                .find_or_init(tenant_id, user_id, &period_key, Self::seed(quest_type, &defs))
                .await?;

            // Opportunistic reconcile keeps long-lived weekly documents
            // current without waiting for a sweep
            let current = reconcile::reconcile(&stored, &defs).unwrap_or(stored);
            let next = doc::check_completion(doc::apply_event(current, outcome));

            match self.store.replace(next).await {
                Ok(updated) => return Ok(updated),
                Err(QuestlineError::PreconditionFailed(reason)) => {
                    attempts += 1;
                    if attempts >= self.retry_budget {
                        return Err(QuestlineError::StoreUnavailable(format!(
                            "Retries exhausted recording event: {}",
                            reason
                        )));
                    }
                    debug!(
                        tenant = %tenant_id,
                        user = %user_id,
                        period = %period_key,
                        attempt = attempts,
                        "Retrying event record after lost version race"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Claim a completed objective's reward, exactly once
    pub async fn claim(
        &self,
        tenant_id: &str,
        user_id: &str,
        objective_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ClaimedReward> {
        let quests = self.catalog.list_all(tenant_id).await?;
        let quest_type = quests
            .iter()
            .find(|(_, defs)| defs.iter().any(|d| d.id == objective_id))
            .map(|(quest_type, _)| *quest_type)
            .ok_or_else(|| {
                QuestlineError::NotFound(format!("Objective {} not in catalog", objective_id))
            })?;

        let period_key = self.clock.period_key(quest_type, now);

        let mut attempts = 0;
        loop {
            let stored = self
                .store
                .find(tenant_id, user_id, &period_key)
                .await?
                .ok_or_else(|| {
                    QuestlineError::NotFound(format!(
                        "No progress for {}/{} in {}",
                        tenant_id, user_id, period_key
                    ))
                })?;

            let (next, xp_reward) = doc::claim_objective(stored, objective_id)?;

            match self.store.replace(next).await {
                Ok(_) => {
                    debug!(
                        tenant = %tenant_id,
                        user = %user_id,
                        objective = %objective_id,
                        xp = xp_reward,
                        "Objective reward claimed"
                    );
                    return Ok(ClaimedReward {
                        objective_id: objective_id.to_string(),
                        xp_reward,
                    });
                }
                Err(QuestlineError::PreconditionFailed(reason)) => {
                    // Reload; a concurrent claimer makes the next pass
                    // return AlreadyClaimed
                    attempts += 1;
                    if attempts >= self.retry_budget {
                        return Err(QuestlineError::StoreUnavailable(format!(
                            "Retries exhausted claiming reward: {}",
                            reason
                        )));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Mark the period's completions as seen
    ///
    /// Returns false when the period has no document yet; seeing nothing
    /// creates nothing.
    pub async fn mark_seen(
        &self,
        tenant_id: &str,
        user_id: &str,
        quest_type: QuestType,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let period_key = self.clock.period_key(quest_type, now);

        let mut attempts = 0;
        loop {
            let Some(stored) = self.store.find(tenant_id, user_id, &period_key).await? else {
                return Ok(false);
            };

            if stored.quest_seen {
                return Ok(true);
            }

            match self.store.replace(doc::mark_seen(stored)).await {
                Ok(_) => return Ok(true),
                Err(QuestlineError::PreconditionFailed(reason)) => {
                    attempts += 1;
                    if attempts >= self.retry_budget {
                        return Err(QuestlineError::StoreUnavailable(format!(
                            "Retries exhausted marking seen: {}",
                            reason
                        )));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Build the user's quest views for the active periods
    ///
    /// Reconciles each document against the latest catalog first, so the
    /// view never shows stale objectives.
    pub async fn snapshot(
        &self,
        tenant_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ProgressSnapshots> {
        let daily = self
            .snapshot_for(tenant_id, user_id, QuestType::Daily, now)
            .await?;
        let weekly = self
            .snapshot_for(tenant_id, user_id, QuestType::Weekly, now)
            .await?;

        Ok(ProgressSnapshots { daily, weekly })
    }

    async fn snapshot_for(
        &self,
        tenant_id: &str,
        user_id: &str,
        quest_type: QuestType,
        now: DateTime<Utc>,
    ) -> Result<QuestSnapshot> {
        let period_key = self.clock.period_key(quest_type, now);
        let defs = self.catalog.list_active(tenant_id, quest_type).await?;

        let mut attempts = 0;
        loop {
            let stored = self
                .store
                .find_or_init(tenant_id, user_id, &period_key, Self::seed(quest_type, &defs))
                .await?;

            let Some(next) = reconcile::reconcile(&stored, &defs) else {
                return Ok(QuestSnapshot::from_doc(&stored));
            };

            match self.store.replace(next).await {
                Ok(updated) => return Ok(QuestSnapshot::from_doc(&updated)),
                Err(QuestlineError::PreconditionFailed(reason)) => {
                    attempts += 1;
                    if attempts >= self.retry_budget {
                        return Err(QuestlineError::StoreUnavailable(format!(
                            "Retries exhausted reconciling snapshot: {}",
                            reason
                        )));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Run a catalog reconciliation sweep over a tenant's documents
    pub async fn reconcile_catalog_changes(&self, tenant_id: &str) -> Result<SweepReport> {
        CatalogReconciler::new(Arc::clone(&self.store), Arc::clone(&self.catalog))
            .sweep(tenant_id)
            .await
    }

    fn seed(quest_type: QuestType, defs: &[ObjectiveDef]) -> ProgressSeed {
        ProgressSeed {
            quest_type,
            objectives: defs.iter().map(ObjectiveState::from_def).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::store::MemoryProgressStore;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 12, 0, 0).unwrap()
    }

    fn engine_with(catalog: Arc<MemoryCatalog>) -> Arc<ProgressEngine> {
        Arc::new(ProgressEngine::new(
            Arc::new(MemoryProgressStore::new()),
            catalog,
            PeriodClock::utc(),
        ))
    }

    fn success_objective(id: &str, threshold: u32, xp: u32) -> ObjectiveDef {
        ObjectiveDef::from_thresholds(id, 0, threshold, xp, 1).unwrap()
    }

    fn message_objective(id: &str, threshold: u32, xp: u32, order: u32) -> ObjectiveDef {
        ObjectiveDef::from_thresholds(id, threshold, 0, xp, order).unwrap()
    }

    #[tokio::test]
    async fn test_single_success_objective_scenario() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![success_objective("s1", 1, 10)]);
        let engine = engine_with(catalog);

        // Three success events; the objective completes on the first
        for _ in 0..3 {
            let recorded = engine
                .record_event_at("acme", "u1", EventOutcome::Succeeded, noon())
                .await
                .unwrap();
            assert!(recorded.daily.objective("s1").unwrap().completed);
        }

        let reward = engine.claim("acme", "u1", "s1", noon()).await.unwrap();
        assert_eq!(reward.xp_reward, 10);

        let err = engine.claim("acme", "u1", "s1", noon()).await.unwrap_err();
        assert!(matches!(err, QuestlineError::AlreadyClaimed(_)));
    }

    #[tokio::test]
    async fn test_sent_events_do_not_feed_success_goal() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![success_objective("s1", 1, 10)]);
        let engine = engine_with(catalog);

        let recorded = engine
            .record_event_at("acme", "u1", EventOutcome::Sent, noon())
            .await
            .unwrap();

        assert_eq!(recorded.daily.total_messages, 1);
        assert_eq!(recorded.daily.total_success_messages, 0);
        assert!(!recorded.daily.objective("s1").unwrap().completed);
    }

    #[tokio::test]
    async fn test_event_feeds_daily_and_weekly() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![message_objective("d", 5, 10, 1)]);
        catalog.set_objectives("acme", QuestType::Weekly, vec![message_objective("w", 20, 50, 1)]);
        let engine = engine_with(catalog);

        let recorded = engine
            .record_event_at("acme", "u1", EventOutcome::Sent, noon())
            .await
            .unwrap();

        assert_eq!(recorded.daily.period_key, "2025-03-07");
        assert_eq!(recorded.weekly.period_key, "2025-W10");
        assert_eq!(recorded.daily.total_messages, 1);
        assert_eq!(recorded.weekly.total_messages, 1);
    }

    #[tokio::test]
    async fn test_concurrent_claims_yield_one_winner() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![success_objective("s1", 1, 10)]);
        let engine = engine_with(catalog);

        engine
            .record_event_at("acme", "u1", EventOutcome::Succeeded, noon())
            .await
            .unwrap();

        let a = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.claim("acme", "u1", "s1", noon()).await }
        });
        let b = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.claim("acme", "u1", "s1", noon()).await }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let dupes = results
            .iter()
            .filter(|r| matches!(r, Err(QuestlineError::AlreadyClaimed(_))))
            .count();

        assert_eq!(wins, 1);
        assert_eq!(dupes, 1);
    }

    #[tokio::test]
    async fn test_concurrent_events_lose_no_counts() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![message_objective("d", 100, 10, 1)]);
        let engine = Arc::new(
            ProgressEngine::new(
                Arc::new(MemoryProgressStore::new()),
                catalog,
                PeriodClock::utc(),
            )
            .with_retry_budget(32),
        );

        let mut handles = Vec::new();
        for _ in 0..4 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                for _ in 0..5 {
                    engine
                        .record_event_at("acme", "u1", EventOutcome::Sent, noon())
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshots = engine.snapshot("acme", "u1", noon()).await.unwrap();
        assert_eq!(snapshots.daily.objectives[0].progress, 20);
    }

    #[tokio::test]
    async fn test_claim_unknown_objective() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![success_objective("s1", 1, 10)]);
        let engine = engine_with(catalog);

        let err = engine.claim("acme", "u1", "ghost", noon()).await.unwrap_err();
        assert!(matches!(err, QuestlineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_claim_before_any_progress() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![success_objective("s1", 1, 10)]);
        let engine = engine_with(catalog);

        // Catalog knows the objective but no document exists for the period
        let err = engine.claim("acme", "u1", "s1", noon()).await.unwrap_err();
        assert!(matches!(err, QuestlineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_claim_incomplete_objective() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![success_objective("s1", 3, 10)]);
        let engine = engine_with(catalog);

        engine
            .record_event_at("acme", "u1", EventOutcome::Succeeded, noon())
            .await
            .unwrap();

        let err = engine.claim("acme", "u1", "s1", noon()).await.unwrap_err();
        assert!(matches!(err, QuestlineError::NotCompleted(_)));
    }

    #[tokio::test]
    async fn test_mark_seen_without_document() {
        let catalog = Arc::new(MemoryCatalog::new());
        let engine = engine_with(catalog);

        let seen = engine
            .mark_seen("acme", "u1", QuestType::Daily, noon())
            .await
            .unwrap();
        assert!(!seen);
    }

    #[tokio::test]
    async fn test_mark_seen_clears_badge() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![success_objective("s1", 1, 10)]);
        let engine = engine_with(catalog);

        let recorded = engine
            .record_event_at("acme", "u1", EventOutcome::Succeeded, noon())
            .await
            .unwrap();
        assert!(!recorded.daily.quest_seen);

        let seen = engine
            .mark_seen("acme", "u1", QuestType::Daily, noon())
            .await
            .unwrap();
        assert!(seen);

        let snapshots = engine.snapshot("acme", "u1", noon()).await.unwrap();
        assert!(snapshots.daily.quest_seen);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_catalog_changes() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![message_objective("a", 5, 10, 1)]);
        let engine = engine_with(Arc::clone(&catalog));

        // Build up progress past the future objective's threshold
        for _ in 0..12 {
            engine
                .record_event_at("acme", "u1", EventOutcome::Sent, noon())
                .await
                .unwrap();
        }

        catalog.set_objectives(
            "acme",
            QuestType::Daily,
            vec![message_objective("a", 5, 10, 1), message_objective("b", 10, 15, 2)],
        );

        let snapshots = engine.snapshot("acme", "u1", noon()).await.unwrap();
        let added = snapshots
            .daily
            .objectives
            .iter()
            .find(|o| o.objective_id == "b")
            .unwrap();
        assert!(added.completed);
        assert!(!added.claimed);
        assert_eq!(added.progress, 10);
    }

    #[tokio::test]
    async fn test_events_cross_period_boundaries() {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.set_objectives("acme", QuestType::Daily, vec![message_objective("d", 2, 10, 1)]);
        let engine = engine_with(catalog);

        let friday = noon();
        let saturday = Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap();

        engine
            .record_event_at("acme", "u1", EventOutcome::Sent, friday)
            .await
            .unwrap();
        let recorded = engine
            .record_event_at("acme", "u1", EventOutcome::Sent, saturday)
            .await
            .unwrap();

        // The new day starts from zero
        assert_eq!(recorded.daily.total_messages, 1);
        assert!(!recorded.daily.objective("d").unwrap().completed);
    }
}
