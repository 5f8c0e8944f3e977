//! Database schemas for Questline
//!
//! Defines MongoDB document structures for quest progress and the quest
//! catalog read model.

mod metadata;
mod progress;
mod quest;

pub use metadata::Metadata;
pub use progress::{ObjectiveState, ProgressDoc, PROGRESS_COLLECTION};
pub use quest::{QuestDoc, StoredObjective, QUEST_COLLECTION};
