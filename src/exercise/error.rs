//! Error types for the exercise service client.
//!
//! Every operation funnels a status mismatch into
//! [`ExerciseError::UnexpectedStatus`], so callers handle create, upload and
//! status failures the same way.

use thiserror::Error;

/// Errors that can occur while talking to the exercise service.
#[derive(Debug, Error)]
pub enum ExerciseError {
    /// The service answered with a status other than the one the operation expects.
    #[error(
        "{operation} failed. Status: {status} {status_text}. Body: {body}. Expected status: {expected}."
    )]
    UnexpectedStatus {
        operation: &'static str,
        status: u16,
        status_text: String,
        body: String,
        expected: u16,
    },

    /// The request was rejected locally before anything was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure (DNS, connection refused, request timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ExerciseError {
    /// Observed and expected status codes, if this is a status mismatch.
    pub fn status_pair(&self) -> Option<(u16, u16)> {
        match self {
            Self::UnexpectedStatus {
                status, expected, ..
            } => Some((*status, *expected)),
            _ => None,
        }
    }
}
