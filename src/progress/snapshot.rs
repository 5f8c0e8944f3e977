//! Quest snapshot read model
//!
//! Derived per response for the transport layer, never persisted. Titles
//! and descriptions are synthesized from the metric kind and threshold so
//! the catalog does not have to store display copy.

use serde::Serialize;

use crate::catalog::{GoalMetric, QuestType};
use crate::db::schemas::{ObjectiveState, ProgressDoc};

/// One objective as presented to the user
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveSnapshot {
    /// Catalog objective identifier
    pub objective_id: String,
    /// Synthesized display title
    pub title: String,
    /// Synthesized display description
    pub description: String,
    /// Counter progress toward the target, capped at the target
    pub progress: u32,
    /// The objective's threshold
    pub target: u32,
    /// XP granted on claim
    pub xp_reward: u32,
    /// Display rank
    pub order: u32,
    /// Whether the objective completed this period
    pub completed: bool,
    /// Whether the reward was claimed
    pub claimed: bool,
}

impl ObjectiveSnapshot {
    fn from_state(state: &ObjectiveState, quest_type: QuestType, doc: &ProgressDoc) -> Self {
        let (title, description, progress, target) = match state.goal() {
            Some(goal) => {
                let progress = goal.progress_of(doc.total_messages, doc.total_success_messages);
                let (title, description) = display_copy(goal, quest_type);
                (title, description, progress, goal.target())
            }
            // Both thresholds zero: nothing to measure, nothing to show
            None => (
                "Inactive objective".to_string(),
                "This objective is not currently measurable.".to_string(),
                0,
                0,
            ),
        };

        Self {
            objective_id: state.objective_id.clone(),
            title,
            description,
            progress,
            target,
            xp_reward: state.xp_reward,
            order: state.order,
            completed: state.completed,
            claimed: state.claimed,
        }
    }
}

fn display_copy(goal: GoalMetric, quest_type: QuestType) -> (String, String) {
    let window = match quest_type {
        QuestType::Daily => "today",
        QuestType::Weekly => "this week",
    };

    match goal {
        GoalMetric::Messages(n) => (
            format!("Send {} messages", n),
            format!("Send {} messages {}.", n, window),
        ),
        GoalMetric::Successes(n) => (
            format!("Deliver {} successful messages", n),
            format!("Have {} messages delivered successfully {}.", n, window),
        ),
    }
}

/// A user's quest view for one period
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuestSnapshot {
    /// Daily or weekly
    pub quest_type: QuestType,
    /// Period bucket the view covers
    pub period_key: String,
    /// Whether the latest completion was seen
    pub quest_seen: bool,
    /// Objectives ordered by display rank
    pub objectives: Vec<ObjectiveSnapshot>,
}

impl QuestSnapshot {
    /// Build the read model from a progress document
    pub fn from_doc(doc: &ProgressDoc) -> Self {
        let mut objectives: Vec<ObjectiveSnapshot> = doc
            .objectives
            .iter()
            .map(|state| ObjectiveSnapshot::from_state(state, doc.quest_type, doc))
            .collect();
        objectives.sort_by_key(|o| o.order);

        Self {
            quest_type: doc.quest_type,
            period_key: doc.period_key.clone(),
            quest_seen: doc.quest_seen,
            objectives,
        }
    }
}
