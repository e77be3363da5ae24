//! Error types shared across the crate.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Startup configuration failures. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The provider credential is absent or blank.
    #[error("missing required environment variable {0}")]
    MissingCredential(&'static str),

    /// The provider base URL does not parse.
    #[error("invalid LLM base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Command line could not be parsed, or asked for help/version output.
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// Layered config could not be built or deserialized.
    #[error(transparent)]
    Load(#[from] config::ConfigError),
}

/// Failures of a single call to the model provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("could not reach the model provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("the model provider rejected the API credential (HTTP {status})")]
    Auth { status: u16 },

    #[error("the model provider is rate limiting requests, try again shortly")]
    RateLimited,

    #[error("the model provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("the model provider reported an error: {0}")]
    Api(String),

    #[error("malformed reply from the model provider: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("the model provider returned an empty reply")]
    EmptyReply,
}

/// Why a chat turn did not produce an assistant reply.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Empty or whitespace-only input. Nothing was recorded.
    #[error("message is empty")]
    EmptyMessage,

    /// The user message was recorded but no reply was produced.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown chat: {0}")]
    UnknownSession(String),

    #[error(transparent)]
    Turn(#[from] TurnError),
}

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownSession(_) => StatusCode::NOT_FOUND,
            Self::Turn(TurnError::EmptyMessage) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Turn(TurnError::Provider(_)) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
