//! Pure transitions over a progress document
//!
//! Each function takes the document by value and returns the next value;
//! the store owns making the write atomic. Keeping these pure makes the
//! state machine testable without any I/O.

use serde::{Deserialize, Serialize};

use crate::db::schemas::ProgressDoc;
use crate::types::{QuestlineError, Result};

/// What happened to the message an event describes
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// A message was sent
    Sent,
    /// A sent message succeeded
    Succeeded,
}

/// Apply one event to the period counters
///
/// Counters only grow; a success event feeds the success counter only.
pub fn apply_event(mut doc: ProgressDoc, outcome: EventOutcome) -> ProgressDoc {
    match outcome {
        EventOutcome::Sent => doc.total_messages += 1,
        EventOutcome::Succeeded => doc.total_success_messages += 1,
    }
    doc
}

/// Evaluate every not-yet-completed objective against the counters
///
/// Idempotent: completed objectives are never re-evaluated, and the seen
/// flag and notification count move only on a fresh completion.
pub fn check_completion(mut doc: ProgressDoc) -> ProgressDoc {
    let messages = doc.total_messages;
    let successes = doc.total_success_messages;

    let mut fresh = 0u32;
    for state in doc.objectives.iter_mut().filter(|s| !s.completed) {
        if state.goal().is_some_and(|g| g.met_by(messages, successes)) {
            state.completed = true;
            fresh += 1;
        }
    }

    if fresh > 0 {
        doc.quest_seen = false;
        doc.notification_count += fresh;
    }
    doc
}

/// Flip an objective's reward to claimed
///
/// Returns the next document and the XP recorded in the objective's
/// snapshot. The reward is read from the snapshot, not the live catalog, so
/// a later configuration change cannot alter what was earned.
pub fn claim_objective(mut doc: ProgressDoc, objective_id: &str) -> Result<(ProgressDoc, u32)> {
    let xp = {
        let state = doc.objective_mut(objective_id).ok_or_else(|| {
            QuestlineError::NotFound(format!("No objective state for {}", objective_id))
        })?;

        if !state.completed {
            return Err(QuestlineError::NotCompleted(objective_id.to_string()));
        }
        if state.claimed {
            return Err(QuestlineError::AlreadyClaimed(objective_id.to_string()));
        }

        state.claimed = true;
        state.xp_reward
    };

    Ok((doc, xp))
}

/// Mark the latest completion as seen
pub fn mark_seen(mut doc: ProgressDoc) -> ProgressDoc {
    doc.quest_seen = true;
    doc
}
