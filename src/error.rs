use axum::{extract::ws::Message, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::types::MessageServer;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("missing authentication")]
    MissingAuth,
    #[error("bad header")]
    BadHeader,
    #[error("session not yet authenticated")]
    UnauthSession,
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    MissingPermissions,
    #[error("conflict")]
    Conflict,
    #[error("bad request: {0}")]
    BadStatic(&'static str),
    #[error("validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("invite is expired")]
    InviteExpired,
    #[error("invite usage limit reached")]
    InviteLimitReached,
    #[error("this invite is for someone else")]
    NotInviteTarget,
    #[error("internal error: {0}")]
    Internal(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("store timed out, try again")]
    StoreTimeout,
    #[error("internal error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("axum error")]
    Axum(#[from] axum::Error),
    #[error("migrate error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
    #[error("tracing subscriber error: {0}")]
    TracingSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("log format parse error: {0}")]
    LogFormatParse(#[from] tracing_subscriber::filter::ParseError),
    #[error("figment error: {0}")]
    Figment(#[from] figment::Error),
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Error::NotFound,
            err => Error::Store(err.to_string()),
        }
    }
}

impl From<axum::http::header::ToStrError> for Error {
    fn from(_value: axum::http::header::ToStrError) -> Self {
        Error::BadHeader
    }
}

impl Error {
    fn get_status(&self) -> StatusCode {
        match self {
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::BadHeader => StatusCode::BAD_REQUEST,
            Error::BadStatic(_) => StatusCode::BAD_REQUEST,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Serde(_) => StatusCode::BAD_REQUEST,
            Error::MissingAuth => StatusCode::UNAUTHORIZED,
            Error::UnauthSession => StatusCode::UNAUTHORIZED,
            Error::MissingPermissions => StatusCode::FORBIDDEN,
            Error::NotInviteTarget => StatusCode::FORBIDDEN,
            Error::Conflict => StatusCode::CONFLICT,
            Error::InviteLimitReached => StatusCode::CONFLICT,
            Error::InviteExpired => StatusCode::GONE,
            Error::StoreTimeout => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Errors aren't Clone, but moka hands back `Arc<Error>`s
    pub fn fake_clone(&self) -> Error {
        match self {
            Error::MissingAuth => Error::MissingAuth,
            Error::BadHeader => Error::BadHeader,
            Error::UnauthSession => Error::UnauthSession,
            Error::NotFound => Error::NotFound,
            Error::MissingPermissions => Error::MissingPermissions,
            Error::Conflict => Error::Conflict,
            Error::BadStatic(s) => Error::BadStatic(s),
            Error::Validation(errs) => Error::Validation(errs.clone()),
            Error::InviteExpired => Error::InviteExpired,
            Error::InviteLimitReached => Error::InviteLimitReached,
            Error::NotInviteTarget => Error::NotInviteTarget,
            Error::Store(s) => Error::Store(s.clone()),
            Error::StoreTimeout => Error::StoreTimeout,
            _ => Error::Internal(self.to_string()),
        }
    }

    /// what the client is told; store/internal detail stays in the logs
    fn public_message(&self) -> String {
        match self {
            Error::Internal(_) | Error::Store(_) | Error::IoError(_) | Error::Axum(_) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        error!(
            "Response error: status {}, message {:?}",
            self.get_status(),
            self
        );
        (
            self.get_status(),
            Json(json!({ "error": self.public_message() })),
        )
            .into_response()
    }
}

impl From<Error> for Message {
    fn from(val: Error) -> Self {
        Message::text(
            serde_json::to_string(&MessageServer::Error {
                error: val.public_message(),
            })
            .expect("error should always be able to be serialized"),
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
