//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - Datetimes are serialised as RFC 3339 strings.
//! - CNICs are accepted in either form and echoed normalised.

pub mod admin;
pub mod auth;
pub mod election;
pub mod results;
pub mod roster;
pub mod vote;
pub mod voter;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Response to a request that created a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: u32,
}

/// Trim a required text field, rejecting it if nothing is left.
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Trim an optional text field, treating blank as absent.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", "  Alpha ").unwrap(), "Alpha");
        let err = required("name", "   ").unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg == "name is required"));
    }

    #[test]
    fn optional_drops_blank() {
        assert_eq!(optional(Some(" sym.png ")), Some("sym.png".to_string()));
        assert_eq!(optional(Some("")), None);
        assert_eq!(optional(None), None);
    }
}
