//! Quest progress document schema
//!
//! One document per (tenant, user, period). The period key is immutable
//! after creation; counters only grow; objective states snapshot their
//! catalog definition so a later reward change cannot retroactively alter
//! what a user partially earned.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::catalog::{GoalMetric, ObjectiveDef, QuestType};
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for quest progress
pub const PROGRESS_COLLECTION: &str = "quest_progress";

/// Per-objective state within a progress document
///
/// Carries a snapshot of the catalog definition (thresholds, reward, rank)
/// plus the completion flags. Exactly one threshold is nonzero for a
/// well-formed objective; both zero means it can never complete.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ObjectiveState {
    /// Catalog objective identifier
    pub objective_id: String,

    /// Messages-sent threshold (0 when successes is the metric)
    #[serde(default)]
    pub message_threshold: u32,

    /// Successful-messages threshold (0 when messages is the metric)
    #[serde(default)]
    pub success_threshold: u32,

    /// XP granted on claim, as configured when this state was snapshotted
    #[serde(default)]
    pub xp_reward: u32,

    /// Display rank copied from the catalog
    #[serde(default)]
    pub order: u32,

    /// Whether the objective's metric reached its threshold this period
    #[serde(default)]
    pub completed: bool,

    /// Whether the reward was claimed
    #[serde(default)]
    pub claimed: bool,
}

impl ObjectiveState {
    /// Fresh state snapshotted from a catalog definition
    pub fn from_def(def: &ObjectiveDef) -> Self {
        Self {
            objective_id: def.id.clone(),
            message_threshold: def.message_threshold(),
            success_threshold: def.success_threshold(),
            xp_reward: def.xp_reward,
            order: def.order,
            completed: false,
            claimed: false,
        }
    }

    /// The goal this objective is measured against, if any
    pub fn goal(&self) -> Option<GoalMetric> {
        if self.message_threshold > 0 {
            Some(GoalMetric::Messages(self.message_threshold))
        } else if self.success_threshold > 0 {
            Some(GoalMetric::Successes(self.success_threshold))
        } else {
            None
        }
    }
}

/// Quest progress document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProgressDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (timestamps, version counter)
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning tenant (company)
    pub tenant_id: String,

    /// Owning user
    pub user_id: String,

    /// Daily or weekly
    #[serde(default)]
    pub quest_type: QuestType,

    /// Period bucket this document covers; immutable after creation
    pub period_key: String,

    /// Messages sent this period
    #[serde(default)]
    pub total_messages: u64,

    /// Messages that succeeded this period
    #[serde(default)]
    pub total_success_messages: u64,

    /// Objective states, ordered by display rank
    #[serde(default)]
    pub objectives: Vec<ObjectiveState>,

    /// Whether the user has seen the latest completion
    #[serde(default)]
    pub quest_seen: bool,

    /// Completion notifications raised over the document's life
    #[serde(default)]
    pub notification_count: u32,
}

impl ProgressDoc {
    /// New document for a period, seeded with objective snapshots and
    /// zeroed counters
    pub fn seeded(
        tenant_id: &str,
        user_id: &str,
        quest_type: QuestType,
        period_key: &str,
        objectives: Vec<ObjectiveState>,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            quest_type,
            period_key: period_key.to_string(),
            total_messages: 0,
            total_success_messages: 0,
            objectives,
            quest_seen: true,
            notification_count: 0,
        }
    }

    /// Look up an objective state by id
    pub fn objective(&self, objective_id: &str) -> Option<&ObjectiveState> {
        self.objectives.iter().find(|o| o.objective_id == objective_id)
    }

    /// Mutable lookup of an objective state by id
    pub fn objective_mut(&mut self, objective_id: &str) -> Option<&mut ObjectiveState> {
        self.objectives.iter_mut().find(|o| o.objective_id == objective_id)
    }
}

impl IntoIndexes for ProgressDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One document per (tenant, user, period)
            (
                doc! { "tenant_id": 1, "user_id": 1, "period_key": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("tenant_user_period_unique".to_string())
                        .build(),
                ),
            ),
            // Tenant-wide reconciliation sweeps
            (
                doc! { "tenant_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("tenant_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ProgressDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_doc_zeroed() {
        let def = ObjectiveDef::from_thresholds("obj-1", 10, 0, 15, 1).unwrap();
        let doc = ProgressDoc::seeded(
            "acme",
            "u1",
            QuestType::Daily,
            "2025-03-07",
            vec![ObjectiveState::from_def(&def)],
        );

        assert_eq!(doc.total_messages, 0);
        assert_eq!(doc.total_success_messages, 0);
        assert_eq!(doc.metadata.version, 1);
        assert!(doc.quest_seen);

        let state = doc.objective("obj-1").unwrap();
        assert_eq!(state.message_threshold, 10);
        assert_eq!(state.xp_reward, 15);
        assert!(!state.completed);
        assert!(!state.claimed);
    }

    #[test]
    fn test_objective_goal() {
        let state = ObjectiveState {
            objective_id: "a".into(),
            success_threshold: 3,
            ..Default::default()
        };
        assert_eq!(state.goal(), Some(GoalMetric::Successes(3)));

        let inert = ObjectiveState {
            objective_id: "b".into(),
            ..Default::default()
        };
        assert_eq!(inert.goal(), None);
    }

    #[test]
    fn test_wire_shape() {
        let def = ObjectiveDef::from_thresholds("obj-1", 0, 1, 10, 1).unwrap();
        let doc = ProgressDoc::seeded(
            "acme",
            "u1",
            QuestType::Weekly,
            "2025-W10",
            vec![ObjectiveState::from_def(&def)],
        );

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["quest_type"], "weekly");
        assert_eq!(value["period_key"], "2025-W10");
        assert_eq!(value["objectives"][0]["success_threshold"], 1);
        assert_eq!(value["objectives"][0]["message_threshold"], 0);
    }
}
