//! Error types for the redpost service.

use thiserror::Error;

/// Every failure the gateway can report.
///
/// Errors raised inside the Reddit client are logged where they occur and
/// turned into a `bool` or a [`SubmissionResult`](crate::reddit::SubmissionResult)
/// at the public boundary; handlers turn the rest into HTTP status codes.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bad credentials or a transport error during the token exchange.
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// An authorized call was attempted without a token.
    #[error("authentication required first")]
    Unauthenticated,

    /// The submit endpoint returned structured errors or a non-200 status.
    #[error("submission failed: {0}")]
    SubmissionFailure(String),

    #[error("upload lease failed: {0}")]
    UploadLeaseFailure(String),

    #[error("media download failed: {0}")]
    MediaFetchFailure(String),

    #[error("media upload failed: {0}")]
    MediaUploadFailure(String),

    /// The upload succeeded but the response carried no `<Location>`.
    #[error("no Location in upload response")]
    LocationParseFailure,

    /// Required credentials are missing or still at their placeholder values.
    #[error("{0}")]
    Configuration(String),

    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
