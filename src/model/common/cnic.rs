use std::fmt::{Display, Formatter};
use std::str::FromStr;

use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error;

const DIGITS: usize = 13;
const SEPARATOR: char = '-';

/// A national identity card number, normalised to the grouped
/// `DDDDD-DDDDDDD-D` form regardless of how it was entered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cnic(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CnicError {
    #[error("CNIC is required")]
    Empty,
    #[error("CNIC must be 13 digits, optionally grouped as 12345-1234567-1")]
    Malformed,
}

impl Cnic {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Cnic {
    type Err = CnicError;

    /// Accepts exactly 13 digits, or 5-7-1 digit groups separated by hyphens.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CnicError::Empty);
        }

        let digits: String = if s.contains(SEPARATOR) {
            let groups: Vec<&str> = s.split(SEPARATOR).collect();
            let lengths: Vec<usize> = groups.iter().map(|g| g.len()).collect();
            if lengths != [5, 7, 1] {
                return Err(CnicError::Malformed);
            }
            groups.concat()
        } else {
            s.to_string()
        };

        if digits.len() != DIGITS || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CnicError::Malformed);
        }

        Ok(Self(format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}",
            &digits[..5],
            &digits[5..12],
            &digits[12..]
        )))
    }
}

impl TryFrom<String> for Cnic {
    type Error = CnicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cnic> for String {
    fn from(cnic: Cnic) -> Self {
        cnic.0
    }
}

impl From<Cnic> for Bson {
    fn from(cnic: Cnic) -> Self {
        Bson::String(cnic.0)
    }
}

impl Display for Cnic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CnicError> for Error {
    fn from(err: CnicError) -> Self {
        Error::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_forms_normalise_identically() {
        let bare: Cnic = "1234512345671".parse().unwrap();
        let grouped: Cnic = "12345-1234567-1".parse().unwrap();
        assert_eq!(bare, grouped);
        assert_eq!(bare.as_str(), "12345-1234567-1");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let cnic: Cnic = "  1234512345671\n".parse().unwrap();
        assert_eq!(cnic.to_string(), "12345-1234567-1");
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!("".parse::<Cnic>(), Err(CnicError::Empty));
        for bad in [
            "123451234567",
            "12345123456712",
            "12345-12345671",
            "1234-51234567-1",
            "12345-1234567-12",
            "12345-123456a-1",
            "abcdefghijklm",
            "12345--1234567-1",
        ] {
            assert_eq!(bad.parse::<Cnic>(), Err(CnicError::Malformed), "{bad}");
        }
    }

    #[test]
    fn deserialization_normalises() {
        let cnic: Cnic = rocket::serde::json::from_str("\"1234512345671\"").unwrap();
        assert_eq!(cnic.as_str(), "12345-1234567-1");
        assert!(rocket::serde::json::from_str::<Cnic>("\"42\"").is_err());
    }

    #[test]
    fn filters_by_reference_store_grouped_form() {
        let cnic: Cnic = "1234512345671".parse().unwrap();
        let filter = mongodb::bson::doc! { "cnic": &cnic };
        assert_eq!(
            filter.get("cnic"),
            Some(&Bson::String("12345-1234567-1".to_string()))
        );
    }

    #[test]
    fn malformed_is_a_validation_error() {
        let err: Error = CnicError::Malformed.into();
        assert!(matches!(err, Error::Validation(_)));
    }
}
