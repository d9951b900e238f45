//! Client-side timestamp tracking
//!
//! A [`PollingMachine`] stamps a Merkle root through the proxy and then polls
//! `upgrade` on a status-dependent cadence until the proof is confirmed in
//! Bitcoin. Transient failures back off with jitter; protocol failures park
//! the loop until a manual check.

pub mod api;
pub mod backoff;
pub mod config;
pub mod error;
pub mod machine;
pub mod session;
pub mod status;

pub use api::{HttpProxyClient, ProxyApi};
pub use backoff::Backoff;
pub use config::{Cadence, PollConfig, StageWindows};
pub use error::ClientError;
pub use machine::{next_delay, PollHandle, PollingMachine};
pub use session::{BlockInfo, TimestampSession};
pub use status::SessionStatus;
