//! Data Transfer Objects (DTOs)
//!
//! Shared by the server handlers and the polling client.

mod request;
mod response;

pub use request::{StampRequest, UpgradeRequest};
pub use response::{
    ErrorResponse, HealthResponse, ProofStatus, StampResponse, UpgradeResponse,
};
