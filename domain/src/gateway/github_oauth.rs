//! GitHub OAuth and REST API client.
//!
//! This module provides an HTTP client for exchanging GitHub authorization
//! codes for access tokens and fetching the signed-in user's profile and
//! email addresses.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind};
use log::*;
use serde::{Deserialize, Serialize};

/// User-Agent header value required by the GitHub REST API.
const USER_AGENT: &str = "BackZauber-App";

/// GitHub user profile from `GET /user`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// One email record from `GET /user/emails`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
}

/// Request to exchange an authorization code for an access token
#[derive(Debug, Serialize)]
struct TokenExchangeRequest {
    client_id: String,
    client_secret: String,
    code: String,
}

/// Token response from GitHub. GitHub reports exchange failures with a 200
/// status and an `error` field in the body, so both shapes live here.
#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Configuration for GitHub endpoint URLs
#[derive(Debug, Clone)]
pub struct GitHubOAuthUrls {
    pub token_url: String,
    pub user_url: String,
    pub emails_url: String,
}

impl GitHubOAuthUrls {
    /// Compose endpoint URLs from the OAuth and REST API base URLs.
    pub fn from_base_urls(oauth_base_url: &str, api_base_url: &str) -> Self {
        Self {
            token_url: format!("{}/login/oauth/access_token", oauth_base_url),
            user_url: format!("{}/user", api_base_url),
            emails_url: format!("{}/user/emails", api_base_url),
        }
    }
}

/// GitHub OAuth client for the authorization-code exchange and profile lookups
#[derive(Debug)]
pub struct GitHubOAuthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    urls: GitHubOAuthUrls,
}

impl GitHubOAuthClient {
    /// Create a new GitHub OAuth client with configurable URLs
    pub fn new(client_id: &str, client_secret: &str, urls: GitHubOAuthUrls) -> Result<Self, Error> {
        let client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            urls,
        })
    }

    /// Exchange an authorization code for an access token.
    ///
    /// The token is used in-process for the profile lookups and never persisted.
    pub async fn exchange_code(&self, code: &str) -> Result<String, Error> {
        let request = TokenExchangeRequest {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            code: code.to_string(),
        };

        debug!("Exchanging GitHub authorization code for an access token");

        let response = self
            .client
            .post(&self.urls.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to exchange GitHub authorization code: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
                }
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("GitHub token endpoint error: {}", error_text);
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::TokenExchange(error_text)),
            });
        }

        let token_response: TokenExchangeResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub token response: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                    "Invalid response from GitHub OAuth".to_string(),
                )),
            }
        })?;

        // GitHub reports a rejected or replayed code inside a 200 body.
        if let Some(error) = token_response.error {
            let description = token_response.error_description.unwrap_or(error);
            warn!("GitHub token error: {}", description);
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::TokenExchange(description)),
            });
        }

        match token_response.access_token {
            Some(access_token) => {
                info!("Successfully exchanged GitHub authorization code");
                Ok(access_token)
            }
            None => {
                warn!("GitHub token response carried neither token nor error");
                Err(Error {
                    source: None,
                    error_kind: DomainErrorKind::External(ExternalErrorKind::TokenExchange(
                        "No access token in response".to_string(),
                    )),
                })
            }
        }
    }

    /// Get the authenticated user's profile using the access token
    pub async fn get_user(&self, access_token: &str) -> Result<GitHubUser, Error> {
        let response = self
            .get_api(&self.urls.user_url, access_token)
            .await
            .map_err(|e| {
                warn!("Failed to get GitHub user profile: {:?}", e);
                e
            })?;

        let user: GitHubUser = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub user profile: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                    "Invalid response from GitHub".to_string(),
                )),
            }
        })?;
        debug!("Fetched GitHub profile for {}", user.login);
        Ok(user)
    }

    /// Get the authenticated user's email addresses using the access token
    pub async fn get_user_emails(&self, access_token: &str) -> Result<Vec<GitHubEmail>, Error> {
        let response = self
            .get_api(&self.urls.emails_url, access_token)
            .await
            .map_err(|e| {
                warn!("Failed to get GitHub user emails: {:?}", e);
                e
            })?;

        let emails: Vec<GitHubEmail> = response.json().await.map_err(|e| {
            warn!("Failed to parse GitHub user emails: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                    "Invalid response from GitHub".to_string(),
                )),
            }
        })?;
        debug!("Fetched {} GitHub email record(s)", emails.len());
        Ok(emails)
    }

    /// Issue a GET against the GitHub REST API, failing on non-success statuses.
    async fn get_api(&self, url: &str, access_token: &str) -> Result<reqwest::Response, Error> {
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(error_text)),
            })
        }
    }
}
