use actix_web::{error::JsonPayloadError, http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Everything that can stop a concat request from producing a file.
#[derive(Debug, Error)]
pub enum ConcatError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Request body too large (limit: {limit} bytes)")]
    BodyTooLarge { limit: usize },

    #[error("No audio segments provided")]
    EmptyInput,

    #[error("Too many segments: {count} (maximum is {max})")]
    TooManySegments { count: usize, max: usize },

    #[error("Invalid output key: {0}")]
    InvalidKey(String),

    #[error("Requested and inline segment formats conflict")]
    MixedFormats,

    #[error("Segment #{index}: failed to decode inline audio: {reason}")]
    Decode { index: usize, reason: String },

    #[error("Segment #{index}: failed to fetch {url}: {reason}")]
    Fetch {
        index: usize,
        url: String,
        reason: String,
    },

    #[error("Segment #{segment}: too short to hold a WAV header")]
    TruncatedHeader { segment: usize },

    #[error("Segment #{segment}: no data chunk found")]
    MissingDataChunk { segment: usize },

    #[error("Concatenated output does not fit in a WAV header")]
    OutputTooLarge,

    #[error("Failed to store output: {0}")]
    Storage(#[from] std::io::Error),
}

impl ResponseError for ConcatError {
    fn status_code(&self) -> StatusCode {
        match self {
            ConcatError::InvalidBody(_)
            | ConcatError::EmptyInput
            | ConcatError::TooManySegments { .. }
            | ConcatError::InvalidKey(_)
            | ConcatError::MixedFormats
            | ConcatError::Decode { .. } => StatusCode::BAD_REQUEST,
            ConcatError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ConcatError::Fetch { .. } => StatusCode::BAD_GATEWAY,
            ConcatError::TruncatedHeader { .. }
            | ConcatError::MissingDataChunk { .. }
            | ConcatError::OutputTooLarge => StatusCode::UNPROCESSABLE_ENTITY,
            ConcatError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

impl From<JsonPayloadError> for ConcatError {
    fn from(err: JsonPayloadError) -> Self {
        match err {
            JsonPayloadError::OverflowKnownLength { limit, .. }
            | JsonPayloadError::Overflow { limit } => ConcatError::BodyTooLarge { limit },
            other => ConcatError::InvalidBody(other.to_string()),
        }
    }
}
