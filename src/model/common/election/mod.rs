mod state;

pub use state::{ElectionStatus, Transition};

/// Election IDs are allocated from a counter.
pub type ElectionId = u32;
/// Party row IDs are allocated from a counter.
pub type PartyId = u32;
/// Candidate row IDs are allocated from a counter.
pub type CandidateId = u32;
