//! Common metadata for all documents
//!
//! Tracks creation/update timestamps and the version counter that guards
//! conditional writes. Progress documents are never deleted, so there is no
//! deletion state here.

use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Common metadata for all documents
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Metadata {
    /// Monotonic version, bumped on every conditional write
    #[serde(default)]
    pub version: i64,

    /// When the document was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,

    /// When the document was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

impl Metadata {
    /// Create new metadata at version 1 with current timestamps
    pub fn new() -> Self {
        Self {
            version: 1,
            updated_at: Some(DateTime::now()),
            created_at: Some(DateTime::now()),
        }
    }

    /// Advance the version and refresh the update timestamp
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Some(DateTime::now());
    }
}
