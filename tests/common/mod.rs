//! Common test utilities and fixtures
//!
//! - App state wired to mock pool/calendar servers and fake tip sources
//! - Proof byte builders
//! - Request helpers for the router

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;

// Re-export frequently used external types for convenience
pub use axum::body::Body;
pub use axum::http::{Request, StatusCode};
pub use std::sync::Arc;
pub use tower::ServiceExt;
