//! Base64 helpers for image payloads

use base64::{engine::general_purpose::STANDARD, Engine};
use crate::error::{AppError, Result};

/// Encode binary data to base64 string
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Strip a `data:image/...;base64,` header, leaving the bare payload
pub fn strip_data_url(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    if trimmed.starts_with("data:") {
        trimmed.split_once(',').map(|(_, data)| data).unwrap_or(trimmed)
    } else {
        trimmed
    }
}

/// Decode a base64 string or data URL, tolerating missing padding
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let data = strip_data_url(encoded);
    let padded;
    let data = match data.len() % 4 {
        0 => data,
        rem => {
            padded = format!("{}{}", data, "=".repeat(4 - rem));
            padded.as_str()
        }
    };

    STANDARD
        .decode(data)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid base64 data: {}", e)))
}

/// Check if a string is valid base64 (or a base64 data URL)
pub fn is_valid(data: &str) -> bool {
    !strip_data_url(data).is_empty() && decode(data).is_ok()
}

/// Get the image format from base64 data URL prefix
pub fn get_format_from_data_url(data_url: &str) -> Option<&str> {
    let rest = data_url.trim().strip_prefix("data:image/")?;
    let end = rest.find(';')?;
    Some(&rest[..end])
}
