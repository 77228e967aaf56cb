use std::fmt::{Display, Formatter};

use mongodb::bson::{to_bson, Bson};
use rocket::form::FromFormField;
use serde::{Deserialize, Serialize};

/// States in the election lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromFormField)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElectionStatus {
    /// Being set up; the roster can be edited but nobody can vote.
    #[field(value = "CREATED")]
    Created,
    /// Accepting votes.
    #[field(value = "RUNNING")]
    Running,
    /// Closed for voting; results are available.
    #[field(value = "ENDED")]
    Ended,
}

impl ElectionStatus {
    /// Only running elections accept votes.
    pub fn accepts_votes(self) -> bool {
        self == Self::Running
    }

    /// Results are only published once voting is over.
    pub fn results_available(self) -> bool {
        self == Self::Ended
    }

    /// Parties and candidates can be added until the election ends.
    pub fn roster_open(self) -> bool {
        self != Self::Ended
    }

    /// The name is frozen while voters are looking at the ballot.
    pub fn renamable(self) -> bool {
        self != Self::Running
    }
}

impl Display for ElectionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Ended => "ENDED",
        })
    }
}

impl From<ElectionStatus> for Bson {
    fn from(status: ElectionStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

/// An administrative action that moves an election between states.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Open voting. CREATED -> RUNNING.
    Start,
    /// Close voting. RUNNING -> ENDED.
    Stop,
    /// Discard all votes and go back to setup. Any state -> CREATED.
    Reset,
}

impl Transition {
    /// The states this transition may be applied from.
    pub fn sources(self) -> &'static [ElectionStatus] {
        use ElectionStatus::*;
        match self {
            Self::Start => &[Created],
            Self::Stop => &[Running],
            Self::Reset => &[Created, Running, Ended],
        }
    }

    /// The state this transition leads to.
    pub fn target(self) -> ElectionStatus {
        match self {
            Self::Start => ElectionStatus::Running,
            Self::Stop => ElectionStatus::Ended,
            Self::Reset => ElectionStatus::Created,
        }
    }

    /// Apply this transition to `from`, or `None` if it isn't allowed.
    pub fn apply(self, from: ElectionStatus) -> Option<ElectionStatus> {
        self.sources().contains(&from).then(|| self.target())
    }

    /// A `$in` filter matching the permitted source states.
    pub fn source_filter(self) -> Bson {
        let sources: Vec<Bson> = self.sources().iter().copied().map(Bson::from).collect();
        mongodb::bson::bson!({ "$in": sources })
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reset => "reset",
        })
    }
}
