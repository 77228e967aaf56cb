use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    api::{optional, required},
    common::cnic::Cnic,
    db::voter::NewVoter,
};

/// A voter registration form. The CNIC is taken as raw text so that a
/// malformed one is reported as a validation error rather than a parse
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterRegistration {
    pub cnic: String,
    pub name: String,
    pub father_name: String,
    pub address: String,
    /// Filename of an already-uploaded profile picture.
    #[serde(default)]
    pub profile_pic: Option<String>,
}

impl VoterRegistration {
    pub fn into_voter(self) -> Result<NewVoter> {
        Ok(NewVoter {
            cnic: self.cnic.parse::<Cnic>()?,
            name: required("Name", &self.name)?,
            father_name: required("Father's name", &self.father_name)?,
            address: required("Address", &self.address)?,
            profile_pic: optional(self.profile_pic.as_deref()),
        })
    }
}

/// Voter login: the CNIC is the whole credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterLogin {
    pub cnic: String,
}

/// Returned on successful registration or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterIdentity {
    pub cnic: Cnic,
    pub name: String,
}

impl From<NewVoter> for VoterIdentity {
    fn from(voter: NewVoter) -> Self {
        Self {
            cnic: voter.cnic,
            name: voter.name,
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl VoterRegistration {
        /// Registers [`NewVoter::example`], with the CNIC entered bare.
        pub fn example() -> Self {
            let voter = NewVoter::example();
            Self {
                cnic: "1234512345671".to_string(),
                name: voter.name,
                father_name: voter.father_name,
                address: voter.address,
                profile_pic: voter.profile_pic,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;

    #[test]
    fn registration_normalises_cnic() {
        let voter = VoterRegistration::example().into_voter().unwrap();
        assert_eq!(voter, NewVoter::example());
        assert_eq!(voter.cnic.as_str(), "12345-1234567-1");
    }

    #[test]
    fn registration_rejects_bad_input() {
        let mut form = VoterRegistration::example();
        form.cnic = "12345".to_string();
        assert!(matches!(form.into_voter(), Err(Error::Validation(_))));

        let mut form = VoterRegistration::example();
        form.father_name = "  ".to_string();
        assert!(matches!(form.into_voter(), Err(Error::Validation(_))));
    }
}
