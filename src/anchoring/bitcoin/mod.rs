//! Bitcoin tip height and confirmation tracking

mod source;
mod tracker;

pub use source::{ApiKind, HttpTipSource, TipSource, DEFAULT_PROVIDERS};
pub use tracker::{confirmations_at, BitcoinConfig, ConfirmationInfo, ConfirmationTracker};
