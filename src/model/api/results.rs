use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::{CandidateId, ElectionId},
    db::{candidate::Candidate, party::Party},
};

/// One line of an election's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate_id: CandidateId,
    /// Name of the candidate's party, absent if no party has its code.
    pub party: Option<String>,
    pub name: String,
    pub vote_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    pub election_id: ElectionId,
    /// Most votes first.
    pub candidates: Vec<CandidateResult>,
    pub total_votes: u64,
}

impl ElectionResults {
    /// Count `votes` (the candidate each vote went to) for every active
    /// candidate. Votes for anyone else are ignored.
    pub fn tabulate(
        election_id: ElectionId,
        parties: impl IntoIterator<Item = Party>,
        candidates: impl IntoIterator<Item = Candidate>,
        votes: impl IntoIterator<Item = CandidateId>,
    ) -> Self {
        // Active parties win over retired ones that once held the same code.
        let mut party_names = HashMap::new();
        for party in parties {
            if party.active || !party_names.contains_key(&party.code) {
                party_names.insert(party.code, party.name);
            }
        }

        let mut counts: HashMap<CandidateId, u64> = HashMap::new();
        for candidate_id in votes {
            *counts.entry(candidate_id).or_default() += 1;
        }

        let mut results = candidates
            .into_iter()
            .filter(|c| c.active)
            .map(|c| CandidateResult {
                candidate_id: c.id,
                party: party_names.get(&c.party_code).cloned(),
                name: c.name,
                vote_count: counts.get(&c.id).copied().unwrap_or(0),
            })
            .collect::<Vec<_>>();
        results.sort_by(|a, b| {
            b.vote_count
                .cmp(&a.vote_count)
                .then(a.candidate_id.cmp(&b.candidate_id))
        });

        let total_votes = results.iter().map(|r| r.vote_count).sum();
        Self {
            election_id,
            candidates: results,
            total_votes,
        }
    }
}
