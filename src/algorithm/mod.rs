//! # Algorithms
//!
//! The two consumers of a parsed certificate: the checker, which walks the derivation list and
//! validates every step, and the completion engine, which reconstructs missing multipliers in
//! under-specified derivations.
pub mod check;
pub mod complete;
pub mod error;
pub mod oracle;

pub use check::{verify, CheckOutcome};
pub use error::Verification;
