use serde::{Deserialize, Serialize};

use crate::model::common::election::{CandidateId, ElectionId};

/// A ballot submission. The voter is identified by CNIC alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub cnic: String,
    pub election_id: ElectionId,
    pub party_code: String,
    pub candidate_id: CandidateId,
}
