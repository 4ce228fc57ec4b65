//! Domain models of the extraction pipeline.
//!
//! - `block`: a message block with its metadata resolved (`RawBlock`).
//! - `candidate`: a quote candidate emitted by the grammar engine.

pub mod block;
pub mod candidate;

pub use block::RawBlock;
pub use candidate::Candidate;
