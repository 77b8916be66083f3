use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use domain::error::{
    DomainErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

/// Render an error body in the JSON shape the frontend expects.
pub(crate) fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

// Domain errors that reach this boundary untranslated surface as JSON; the
// OAuth callback controller handles its redirect-class failures before they
// get here.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
                InternalErrorKind::Config => {
                    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Service not configured")
                }
                InternalErrorKind::Other(_) => {
                    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
            },
            DomainErrorKind::External(external_error_kind) => match external_error_kind {
                ExternalErrorKind::Network => {
                    json_error(StatusCode::BAD_GATEWAY, "Upstream request failed")
                }
                ExternalErrorKind::RateLimited(message) => {
                    json_error(StatusCode::TOO_MANY_REQUESTS, &message)
                }
                ExternalErrorKind::OutOfCredits(message) => {
                    json_error(StatusCode::PAYMENT_REQUIRED, &message)
                }
                ExternalErrorKind::TokenExchange(message)
                | ExternalErrorKind::AccountStore(message)
                | ExternalErrorKind::SessionIssuance(message)
                | ExternalErrorKind::Other(message) => {
                    json_error(StatusCode::INTERNAL_SERVER_ERROR, &message)
                }
            },
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
