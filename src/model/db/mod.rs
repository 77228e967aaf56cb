//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - Datetimes are serialised in MongoDB's own format.
//! - Row IDs live in `_id`.

pub mod admin;
pub mod candidate;
pub mod election;
pub mod party;
pub mod vote;
pub mod voter;
