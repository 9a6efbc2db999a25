//! Shared data contracts for the catalog QA pipeline.
//!
//! These types cross crate boundaries: retrieval records flowing through the
//! fusion stage, the per-intent structured answer shapes served to clients,
//! and the request/response envelopes of the HTTP surface.

pub mod answers;
pub mod records;

pub use answers::*;
pub use records::*;
