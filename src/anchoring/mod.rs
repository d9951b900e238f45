//! Anchoring: OTS proof format, upstream fan-out, Bitcoin tip tracking

pub mod bitcoin;
pub mod error;
pub mod fanout;
pub mod ots;

pub use error::AnchorError;
