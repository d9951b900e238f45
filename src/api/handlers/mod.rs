//! HTTP request handlers

mod health;
mod helpers;
mod stamp;
mod upgrade;

pub use health::health_check;
pub use helpers::{decode_byte_array, parse_json};
pub use stamp::stamp;
pub use upgrade::upgrade;
