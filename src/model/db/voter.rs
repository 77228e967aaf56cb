use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::model::{common::cnic::Cnic, mongodb::Id};

/// Core voter data, as stored in the database. Voters are never modified
/// after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Unique national identifier, in normalised form.
    pub cnic: Cnic,
    pub name: String,
    pub father_name: String,
    pub address: String,
    /// Filename of an uploaded profile picture, if any.
    pub profile_pic: Option<String>,
}

/// A voter without an ID.
pub type NewVoter = VoterCore;

/// A voter from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}
