//! Controller for the GitHub sign-in callback.
//!
//! Note: OAuth endpoints don't require custom headers because they work via
//! browser redirects which cannot set them.

use crate::error::json_error;
use crate::AppState;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use domain::error::{DomainErrorKind, ExternalErrorKind, InternalErrorKind};
use log::*;
use serde::Deserialize;

/// Query parameters for the GitHub OAuth callback
#[derive(Debug, Deserialize)]
pub struct GitHubCallback {
    pub code: Option<String>,
    pub redirect_url: Option<String>,
}

/// GET /auth/github/callback
///
/// Completes GitHub sign-in: exchanges the authorization code, reconciles the
/// GitHub identity against the account store, and redirects back to the
/// frontend with a one-time session token in the URL fragment.
///
/// Failures before the code is validated surface as JSON; failures after the
/// user has been through GitHub's consent screen surface as a redirect
/// carrying an `error` parameter, so the originating page can render it.
#[utoipa::path(
    get,
    path = "/auth/github/callback",
    params(
        ("code" = Option<String>, Query, description = "Authorization code issued by GitHub"),
        ("redirect_url" = Option<String>, Query, description = "Frontend URL to redirect back to; defaults to the configured application origin"),
    ),
    responses(
        (status = 302, description = "Redirect back to the frontend, with a session fragment on success or an error parameter on upstream failure"),
        (status = 400, description = "No authorization code provided"),
        (status = 500, description = "OAuth not configured or internal error"),
    )
)]
pub async fn github_callback(
    State(app_state): State<AppState>,
    Query(params): Query<GitHubCallback>,
) -> Response {
    let redirect_url = params
        .redirect_url
        .unwrap_or_else(|| app_state.config.oauth_success_redirect_url().to_string());

    // No redirect target is trustworthy without a code, so this failure is
    // reported in place rather than via redirect.
    let Some(code) = params.code else {
        warn!("GitHub callback arrived without an authorization code");
        return json_error(StatusCode::BAD_REQUEST, "No authorization code provided");
    };

    let Some(gateway) = app_state.identity_gateway() else {
        error!("GitHub OAuth credentials not configured");
        return json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "GitHub OAuth not configured",
        );
    };

    match gateway.link_identity(&code).await {
        Ok(session) => found_redirect(&format!(
            "{}#access_token={}&type=magiclink",
            redirect_url, session.access_token
        )),
        Err(e) => match e.error_kind {
            // The user arrived via redirect and must leave via redirect.
            DomainErrorKind::External(ExternalErrorKind::TokenExchange(message))
            | DomainErrorKind::External(ExternalErrorKind::AccountStore(message))
            | DomainErrorKind::External(ExternalErrorKind::SessionIssuance(message)) => {
                warn!("GitHub sign-in failed: {message}");
                found_redirect(&format!(
                    "{}?error={}",
                    redirect_url,
                    urlencoding::encode(&message)
                ))
            }
            other => {
                error!("GitHub sign-in failed: {other:?}");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &internal_error_message(other),
                )
            }
        },
    }
}

/// 302 redirect. The session token travels in a URL fragment, which browsers
/// keep client-side and never send back to any server.
fn found_redirect(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

fn internal_error_message(error_kind: DomainErrorKind) -> String {
    match error_kind {
        DomainErrorKind::Internal(InternalErrorKind::Other(message))
        | DomainErrorKind::External(ExternalErrorKind::Other(message)) => message,
        DomainErrorKind::Internal(InternalErrorKind::Config) => {
            "GitHub OAuth not configured".to_string()
        }
        _ => "Unknown error".to_string(),
    }
}
