use shared::{
    error::{ApiError, ErrorCode},
    validation::ValidationError,
};
use thiserror::Error;

/// Shown in place of transport details, which mean nothing to an operator.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Rejected before or by the server because the input is unusable.
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    NotFound(String),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    /// Server-side failure; the `error` text is shown as received.
    #[error("{0}")]
    Server(String),
    /// Network failure, timeout, or a body that was not the expected JSON.
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("another change is still being saved")]
    Busy,
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Text suitable for an operator-facing notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        match err.code {
            ErrorCode::Validation => Self::Validation(ValidationError {
                fields: err.fields,
                message: err.message,
            }),
            ErrorCode::NotFound => Self::NotFound(err.message),
            ErrorCode::Unauthorized | ErrorCode::Forbidden => Self::Unauthorized(err.message),
            ErrorCode::Internal => Self::Server(err.message),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
