//! Objective catalog collaborator
//!
//! The catalog is the source of truth for which objectives make up a
//! tenant's active daily and weekly quests. Quest configuration is owned by
//! an external CRUD service; this module only reads it.

mod memory;
mod mongo;

pub use memory::MemoryCatalog;
pub use mongo::MongoCatalog;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Result;

/// Time window a quest runs over
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuestType {
    /// Resets at local midnight
    #[default]
    Daily,
    /// Resets at the ISO week boundary (Monday, local time)
    Weekly,
}

impl QuestType {
    /// Both quest types, in display order
    pub const ALL: [QuestType; 2] = [QuestType::Daily, QuestType::Weekly];

    /// Lowercase name as stored in documents
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestType::Daily => "daily",
            QuestType::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for QuestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single metric an objective is measured against
///
/// Stored documents keep two threshold fields where only one is nonzero;
/// this union is the in-memory view of that shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalMetric {
    /// Total messages sent this period
    Messages(u32),
    /// Total messages that succeeded this period
    Successes(u32),
}

impl GoalMetric {
    /// The counter value the objective requires
    pub fn target(&self) -> u32 {
        match *self {
            GoalMetric::Messages(n) | GoalMetric::Successes(n) => n,
        }
    }

    /// Whether the document counters satisfy this goal
    pub fn met_by(&self, total_messages: u64, total_successes: u64) -> bool {
        match *self {
            GoalMetric::Messages(n) => n > 0 && total_messages >= u64::from(n),
            GoalMetric::Successes(n) => n > 0 && total_successes >= u64::from(n),
        }
    }

    /// Progress toward the goal, capped at the target
    pub fn progress_of(&self, total_messages: u64, total_successes: u64) -> u32 {
        let counter = match *self {
            GoalMetric::Messages(_) => total_messages,
            GoalMetric::Successes(_) => total_successes,
        };
        counter.min(u64::from(self.target())) as u32
    }
}

/// One objective within a quest, as configured in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectiveDef {
    /// Stable objective identifier
    pub id: String,
    /// Metric and threshold this objective is measured against
    pub goal: GoalMetric,
    /// XP granted when the objective's reward is claimed
    pub xp_reward: u32,
    /// Dense display rank (1-based); not a completion gate
    pub order: u32,
}

impl ObjectiveDef {
    /// Build a definition from the stored two-threshold shape
    ///
    /// Returns None when both thresholds are zero (an unmeasurable
    /// objective), so readers can skip malformed catalog entries.
    pub fn from_thresholds(
        id: impl Into<String>,
        message_threshold: u32,
        success_threshold: u32,
        xp_reward: u32,
        order: u32,
    ) -> Option<Self> {
        let goal = if message_threshold > 0 {
            GoalMetric::Messages(message_threshold)
        } else if success_threshold > 0 {
            GoalMetric::Successes(success_threshold)
        } else {
            return None;
        };

        Some(Self {
            id: id.into(),
            goal,
            xp_reward,
            order,
        })
    }

    /// Message threshold in the stored shape (0 when successes is the metric)
    pub fn message_threshold(&self) -> u32 {
        match self.goal {
            GoalMetric::Messages(n) => n,
            GoalMetric::Successes(_) => 0,
        }
    }

    /// Success threshold in the stored shape (0 when messages is the metric)
    pub fn success_threshold(&self) -> u32 {
        match self.goal {
            GoalMetric::Messages(_) => 0,
            GoalMetric::Successes(n) => n,
        }
    }
}

/// Read access to a tenant's quest configuration
///
/// Implementations must reflect the latest committed configuration;
/// staleness tolerance is the caller's concern.
#[async_trait]
pub trait ObjectiveCatalog: Send + Sync {
    /// Objectives of the tenant's active quest of the given type, ordered
    /// by display rank
    async fn list_active(&self, tenant_id: &str, quest_type: QuestType)
        -> Result<Vec<ObjectiveDef>>;

    /// Active objectives for every quest type the tenant has configured
    async fn list_all(&self, tenant_id: &str) -> Result<Vec<(QuestType, Vec<ObjectiveDef>)>>;
}
