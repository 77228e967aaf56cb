//! Data types, split by where they are used.
//!
//! - [`api`]: what crosses the HTTP boundary.
//! - [`db`]: what is stored in MongoDB.
//! - [`common`]: types shared by both.
//! - [`mongodb`]: collection plumbing.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
