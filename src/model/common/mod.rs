//! Types shared between the API and database representations.

pub mod cnic;
pub mod election;
