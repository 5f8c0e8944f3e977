//! Quest catalog document schema
//!
//! Configuration written by the external quest CRUD service. Questline only
//! reads these documents; see `catalog::MongoCatalog`.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::catalog::QuestType;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for quest configuration
pub const QUEST_COLLECTION: &str = "quests";

/// One objective definition as stored in a quest document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StoredObjective {
    /// Stable objective identifier
    pub objective_id: String,

    /// Messages-sent threshold (0 when successes is the metric)
    #[serde(default)]
    pub message_threshold: u32,

    /// Successful-messages threshold (0 when messages is the metric)
    #[serde(default)]
    pub success_threshold: u32,

    /// XP granted on claim
    #[serde(default)]
    pub xp_reward: u32,

    /// Dense display rank
    #[serde(default)]
    pub order: u32,
}

/// Quest document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct QuestDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Owning tenant (company)
    pub tenant_id: String,

    /// Daily or weekly
    #[serde(default)]
    pub quest_type: QuestType,

    /// Whether this quest is the tenant's active one for its type
    #[serde(default)]
    pub active: bool,

    /// Objective definitions, ordered by display rank
    #[serde(default)]
    pub objectives: Vec<StoredObjective>,
}

impl IntoIndexes for QuestDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "tenant_id": 1, "quest_type": 1, "active": 1 },
            Some(
                IndexOptions::builder()
                    .name("tenant_quest_type_active".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for QuestDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
