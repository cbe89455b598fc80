use thiserror::Error;

use bizdesk_auth::{ErrorDisposition, LOGIN_ROUTE, StoreError, classify_status};

use crate::config::ConfigError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a backend call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Status {
        status: u16,
        message: String,
        disposition: ErrorDisposition,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("not authenticated")]
    Unauthenticated,

    #[error("session store: {0}")]
    Store(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid request: {0}")]
    Invalid(String),
}

impl ApiError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
            disposition: classify_status(status),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// What the UI layer should do about this error.
    pub fn disposition(&self) -> ErrorDisposition {
        match self {
            ApiError::Status { disposition, .. } => disposition.clone(),
            ApiError::Unauthenticated => ErrorDisposition::Logout {
                redirect_to: LOGIN_ROUTE.to_string(),
            },
            _ => ErrorDisposition::Surface,
        }
    }

    /// Text for a toast or dialog.
    pub fn user_message(&self) -> String {
        match self.disposition() {
            ErrorDisposition::Logout { .. } => "Your session has expired. Please sign in again.".to_string(),
            ErrorDisposition::PermissionDenied => {
                "You do not have permission to perform this action.".to_string()
            }
            ErrorDisposition::Surface => match self {
                ApiError::Status { message, .. } => message.clone(),
                other => other.to_string(),
            },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
