//! Request body parsing helpers

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ServerError, ServerResult};

/// Parse a JSON body, mapping any failure to a validation error
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> ServerResult<T> {
    if body.is_empty() {
        return Err(ServerError::InvalidArgument("request body is empty".into()));
    }
    serde_json::from_slice(body).map_err(|e| ServerError::InvalidArgument(format!("invalid JSON: {e}")))
}

/// Decode a JSON array of integers 0..=255 into bytes
///
/// # Errors
///
/// `InvalidArgument` if `value` is not an array, holds more than `max_len`
/// elements, or any element is not an integer in byte range.
pub fn decode_byte_array(field: &str, value: Option<&Value>, max_len: usize) -> ServerResult<Vec<u8>> {
    let Some(value) = value else {
        return Err(ServerError::InvalidArgument(format!("missing field `{field}`")));
    };
    let Value::Array(items) = value else {
        return Err(ServerError::InvalidArgument(format!(
            "`{field}` must be an array of bytes"
        )));
    };
    if items.len() > max_len {
        return Err(ServerError::InvalidArgument(format!(
            "`{field}` is {} bytes, limit is {max_len}",
            items.len()
        )));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| {
                    ServerError::InvalidArgument(format!(
                        "`{field}[{i}]` is not a byte (0-255): {item}"
                    ))
                })
        })
        .collect()
}
