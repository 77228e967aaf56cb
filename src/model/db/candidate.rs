use serde::{Deserialize, Serialize};

use crate::model::common::election::{CandidateId, ElectionId};

/// A candidate on an election's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    pub election_id: ElectionId,
    /// Code of the party this candidate stands for.
    pub party_code: String,
    pub name: String,
    /// Opaque reference to an uploaded photo.
    pub photo: Option<String>,
    pub active: bool,
}
