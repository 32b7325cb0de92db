use http::StatusCode;
use thiserror::Error;

/// Everything that can go wrong talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("could not reach the backend: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend rejected the payload (400 / 422).
    #[error("{}", describe(.detail, "the request was rejected"))]
    Validation {
        status: StatusCode,
        detail: Option<String>,
    },

    /// The credential is missing, invalid or expired. The session has already been reset.
    #[error("{}", describe(.detail, "not authenticated"))]
    Unauthorized { detail: Option<String> },

    #[error("{}", describe(.detail, "not found"))]
    NotFound { detail: Option<String> },

    /// Any other non-success status.
    #[error("backend returned {status}: {}", describe(.detail, "no detail"))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("backend returned an empty access token")]
    EmptyToken,

    /// A required value was blank, so no request was made.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// An id that would not survive as a single path segment (`.` or `..`).
    #[error("{0} is not a valid identifier")]
    InvalidField(&'static str),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

fn describe(detail: &Option<String>, fallback: &str) -> String {
    detail.clone().unwrap_or_else(|| fallback.to_string())
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_status(status: StatusCode, detail: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { detail },
            StatusCode::NOT_FOUND => ApiError::NotFound { detail },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation { status, detail }
            }
            _ => ApiError::Status { status, detail },
        }
    }

    /// The backend's human-readable `detail`, when it sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Validation { detail, .. }
            | ApiError::Unauthorized { detail }
            | ApiError::NotFound { detail }
            | ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Validation { status, .. } | ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Rejected locally, before any request was made.
    pub fn is_input_error(&self) -> bool {
        matches!(self, ApiError::MissingField(_) | ApiError::InvalidField(_))
    }
}
