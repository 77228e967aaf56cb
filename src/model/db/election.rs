use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::model::common::election::{ElectionId, ElectionStatus};

/// An election, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: ElectionId,
    pub name: String,
    pub status: ElectionStatus,
    pub created_at: DateTime,
    /// Set when the election is started, cleared on reset.
    pub started_at: Option<DateTime>,
    /// Set when the election is stopped, cleared on reset.
    pub ended_at: Option<DateTime>,
}

impl Election {
    /// A brand new election, waiting to be set up.
    pub fn new(id: ElectionId, name: String) -> Self {
        Self {
            id,
            name,
            status: ElectionStatus::Created,
            created_at: DateTime::now(),
            started_at: None,
            ended_at: None,
        }
    }
}
