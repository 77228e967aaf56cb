use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::common::{
    cnic::Cnic,
    election::{CandidateId, ElectionId},
};

/// A cast vote, as stored in the database. The generated `_id` is never
/// needed, so it is not part of the type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub election_id: ElectionId,
    pub voter_cnic: Cnic,
    pub party_code: String,
    pub candidate_id: CandidateId,
    pub created_at: DateTime,
}

impl Vote {
    pub fn new(
        election_id: ElectionId,
        voter_cnic: Cnic,
        party_code: String,
        candidate_id: CandidateId,
    ) -> Self {
        Self {
            election_id,
            voter_cnic,
            party_code,
            candidate_id,
            created_at: DateTime::now(),
        }
    }
}
