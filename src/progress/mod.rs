//! Quest progress core
//!
//! The state machine lives in pure transition functions over the progress
//! document; the engine wires them to the store and catalog collaborators;
//! the reconciler evolves historical documents when the catalog changes.

pub mod doc;
pub mod engine;
pub mod reconcile;
pub mod snapshot;

pub use doc::EventOutcome;
pub use engine::{ClaimedReward, EventRecorded, ProgressEngine, ProgressSnapshots};
pub use reconcile::{CatalogReconciler, SweepReport};
pub use snapshot::{ObjectiveSnapshot, QuestSnapshot};
