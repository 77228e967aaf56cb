use serde::{Deserialize, Serialize};

use crate::model::common::election::{ElectionId, PartyId};

/// A party on an election's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    #[serde(rename = "_id")]
    pub id: PartyId,
    pub election_id: ElectionId,
    /// Short human-chosen code, e.g. "P1". Candidates refer to their party by it.
    pub code: String,
    pub name: String,
    /// Opaque reference to an uploaded symbol image.
    pub symbol: Option<String>,
    /// Cleared instead of deleting, so historical votes stay attributable.
    pub active: bool,
}
