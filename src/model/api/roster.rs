use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    api::{optional, required},
    common::election::{CandidateId, ElectionId, PartyId},
    db::{candidate::Candidate, party::Party},
};

/// A request to add a party to an election.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartySpec {
    pub election_id: ElectionId,
    pub code: String,
    pub name: String,
    /// Reference to an already-uploaded symbol image.
    #[serde(default)]
    pub symbol: Option<String>,
}

impl PartySpec {
    /// Trim every field, rejecting blank required ones.
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            election_id: self.election_id,
            code: required("Party code", &self.code)?,
            name: required("Party name", &self.name)?,
            symbol: optional(self.symbol.as_deref()),
        })
    }

    /// An active party with the given row ID.
    pub fn into_party(self, id: PartyId) -> Party {
        Party {
            id,
            election_id: self.election_id,
            code: self.code,
            name: self.name,
            symbol: self.symbol,
            active: true,
        }
    }
}

/// A request to add a candidate to an election.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub election_id: ElectionId,
    pub party_code: String,
    pub name: String,
    /// Reference to an already-uploaded photo.
    #[serde(default)]
    pub photo: Option<String>,
}

impl CandidateSpec {
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            election_id: self.election_id,
            party_code: required("Party code", &self.party_code)?,
            name: required("Candidate name", &self.name)?,
            photo: optional(self.photo.as_deref()),
        })
    }

    pub fn into_candidate(self, id: CandidateId) -> Candidate {
        Candidate {
            id,
            election_id: self.election_id,
            party_code: self.party_code,
            name: self.name,
            photo: self.photo,
            active: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyDescription {
    pub id: PartyId,
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
}

impl From<Party> for PartyDescription {
    fn from(party: Party) -> Self {
        Self {
            id: party.id,
            code: party.code,
            name: party.name,
            symbol: party.symbol,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: CandidateId,
    pub name: String,
    pub party_code: String,
    pub photo: Option<String>,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            party_code: candidate.party_code,
            photo: candidate.photo,
        }
    }
}

/// The active parties and candidates of an election: what a voter sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub election_id: ElectionId,
    pub parties: Vec<PartyDescription>,
    pub candidates: Vec<CandidateDescription>,
}

#[cfg(test)]
mod examples {
    use super::*;

    impl PartySpec {
        pub fn example(election_id: ElectionId) -> Self {
            Self {
                election_id,
                code: "P1".to_string(),
                name: "Alpha".to_string(),
                symbol: Some("uploads/alpha.png".to_string()),
            }
        }

        pub fn example2(election_id: ElectionId) -> Self {
            Self {
                election_id,
                code: "P2".to_string(),
                name: "Beta".to_string(),
                symbol: None,
            }
        }
    }

    impl CandidateSpec {
        pub fn example(election_id: ElectionId) -> Self {
            Self {
                election_id,
                party_code: "P1".to_string(),
                name: "Ann".to_string(),
                photo: Some("uploads/ann.jpg".to_string()),
            }
        }

        pub fn example2(election_id: ElectionId) -> Self {
            Self {
                election_id,
                party_code: "P2".to_string(),
                name: "Bob".to_string(),
                photo: None,
            }
        }
    }
}
