use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    api::required,
    common::election::{ElectionId, ElectionStatus},
    db::election::Election,
};

/// The admin-editable part of an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSpec {
    pub name: String,
}

impl ElectionSpec {
    /// The trimmed name, or a validation error if there isn't one.
    pub fn validated_name(&self) -> Result<String> {
        required("Election name", &self.name)
    }
}

/// An API-friendly election summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub id: ElectionId,
    pub name: String,
    pub status: ElectionStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<Election> for ElectionSummary {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            name: election.name,
            status: election.status,
            created_at: election.created_at.to_chrono(),
            started_at: election.started_at.map(|t| t.to_chrono()),
            ended_at: election.ended_at.map(|t| t.to_chrono()),
        }
    }
}

/// An election summary plus the roster and vote counts admins see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionOverview {
    #[serde(flatten)]
    pub summary: ElectionSummary,
    /// Active parties.
    pub party_count: u64,
    /// Active candidates.
    pub candidate_count: u64,
    pub vote_count: u64,
}


#[cfg(test)]
mod tests {
    use mongodb::bson::DateTime as BsonDateTime;
    use rocket::serde::json::serde_json::{self, Value};

    use super::*;

    #[test]
    fn summary_serialises_status_and_missing_times() {
        let election = Election::new(3, "General 2025".to_string());
        let summary = ElectionSummary::from(election);
        let json: Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["status"], "CREATED");
        assert!(json["started_at"].is_null());
        assert!(json["ended_at"].is_null());
    }

    #[test]
    fn summary_keeps_transition_times() {
        let mut election = Election::new(3, "General 2025".to_string());
        let started = BsonDateTime::from_millis(1_700_000_000_000);
        election.status = ElectionStatus::Running;
        election.started_at = Some(started);
        let summary = ElectionSummary::from(election);
        assert_eq!(summary.started_at, Some(started.to_chrono()));
        assert_eq!(summary.ended_at, None);
    }

    #[test]
    fn blank_names_are_rejected() {
        let spec = ElectionSpec {
            name: "   ".to_string(),
        };
        assert!(spec.validated_name().is_err());
        assert_eq!(
            ElectionSpec::example().validated_name().unwrap(),
            "General 2025"
        );
    }
}
