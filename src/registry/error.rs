use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("the registry requires authentication")]
    Unauthorized,
    #[error("the registry does not allow this operation")]
    MethodNotAllowed,
    #[error("the registry responded with {0}")]
    Other(StatusCode),
    #[error("invalid {kind} name '{name}'")]
    InvalidName { kind: &'static str, name: String },
    #[error("invalid authentication challenge: {0}")]
    Challenge(String),
    #[error("failed to talk to the registry")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::METHOD_NOT_ALLOWED => Self::MethodNotAllowed,
            status => Self::Other(status),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Other(StatusCode::NOT_FOUND))
    }
}
