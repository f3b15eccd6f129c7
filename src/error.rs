use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::{
    deletion::{DeletionError, FEATURE_DISABLED},
    registry::ClientError,
    views::html,
};

pub(crate) enum BrowserError {
    BadRequest { message: String },
    FeatureDisabled,
    AuthRequired,
    NotFound { what: String },
    Unhandled(anyhow::Error),
}

fn format_error(e: &anyhow::Error) -> String {
    let mut s = String::new();
    s.push_str(&format!("{}", e));
    for cause in e.chain().skip(1) {
        s.push_str(&format!("\nCaused by: {}", cause));
    }
    s
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!("<p class=\"error\">{}</p>", html::escape(message));
    (status, Html(html::page(status.as_str(), None, &body))).into_response()
}

impl IntoResponse for BrowserError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest { message } => error_page(StatusCode::BAD_REQUEST, &message),
            Self::FeatureDisabled => error_page(StatusCode::FORBIDDEN, FEATURE_DISABLED),
            Self::AuthRequired => error_page(
                StatusCode::BAD_GATEWAY,
                "The registry rejected the configured credentials.",
            ),
            Self::NotFound { what } => {
                error_page(StatusCode::NOT_FOUND, &format!("{what} not found."))
            }
            Self::Unhandled(err) => {
                error!(
                    error = %format_error(&err),
                    backtrace = ?err.backtrace(),
                    "Browser error"
                );
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong talking to the registry.",
                )
            }
        }
    }
}

impl From<ClientError> for BrowserError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized => Self::AuthRequired,
            err @ ClientError::InvalidName { .. } => Self::BadRequest {
                message: format!("{}.", capitalize(&err.to_string())),
            },
            err => Self::Unhandled(err.into()),
        }
    }
}

impl From<DeletionError> for BrowserError {
    fn from(err: DeletionError) -> Self {
        match err {
            DeletionError::FeatureDisabled => Self::FeatureDisabled,
            DeletionError::AuthRequired => Self::AuthRequired,
            DeletionError::Client(err) => err.into(),
        }
    }
}
