//! Thin passthroughs to the LMS resource endpoints.
//!
//! Bodies are opaque JSON; the only client-side check is that ids are usable.
//! Every call goes through [`ApiClient`](crate::transport::ApiClient), so bearer
//! injection and the 401 reset apply.

pub mod admin;
pub mod assignments;
pub mod courses;
pub mod enrollments;

use serde_json::Value;

use crate::transport::ApiError;

/// Reject a blank id before any request is made.
pub(crate) fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ApiError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

/// An id ready to be placed in a URL path as exactly one segment.
pub(crate) fn path_segment(value: &str, field: &'static str) -> Result<String, ApiError> {
    let id = require(value, field)?;
    // Dot segments are resolved by the URL parser even when percent-encoded.
    if id == "." || id == ".." {
        return Err(ApiError::InvalidField(field));
    }
    Ok(urlencoding::encode(id).into_owned())
}

/// Top-level scalar fields of a JSON object as query pairs.
///
/// The backend reads create and update arguments from the query string; the
/// JSON body is sent alongside.
pub(crate) fn query_pairs(body: &Value) -> Vec<(String, String)> {
    let Some(fields) = body.as_object() else {
        return Vec::new();
    };
    fields
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), value))
        })
        .collect()
}
