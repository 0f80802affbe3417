//! Core Reddit API utilities.
//!
//! Low-level helpers shared by the authentication, upload and submission
//! code: log sanitizing and parsing of the submission envelope.

use log::{debug, error};
use serde_json::Value;

use super::post::SubmissionResult;
use crate::error::GatewayError;

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_len {
        let truncated: String = sanitized.chars().take(max_len).collect();
        format!(
            "{}... [truncated, {} total bytes]",
            truncated,
            text.len()
        )
    } else {
        sanitized
    }
}

/// Parses the `{json: {errors, data}}` envelope returned by `/api/submit`.
///
/// A non-empty `json.errors` list is a failure carrying the remote errors;
/// otherwise `json.data.{id, name, permalink}` are extracted. Missing data
/// fields are left as `None`.
pub(crate) fn parse_submission_envelope(body: &str) -> Result<SubmissionResult, GatewayError> {
    let envelope: Value = serde_json::from_str(body).map_err(|e| {
        error!("Submission response is not valid JSON: {}", e);
        debug!("Response: {}", sanitize_for_logging(body, 200));
        GatewayError::SubmissionFailure(format!("invalid response body: {}", e))
    })?;

    let json = envelope.get("json");

    if let Some(errors) = json.and_then(|j| j.get("errors")).and_then(Value::as_array) {
        if !errors.is_empty() {
            let errors = Value::Array(errors.clone()).to_string();
            error!("Error publishing: {}", sanitize_for_logging(&errors, 500));
            return Err(GatewayError::SubmissionFailure(errors));
        }
    }

    let data = json.and_then(|j| j.get("data"));
    let field = |name: &str| {
        data.and_then(|d| d.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    Ok(SubmissionResult::posted(
        field("id"),
        field("name"),
        field("permalink"),
    ))
}
