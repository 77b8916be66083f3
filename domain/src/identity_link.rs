//! Identity-linking flow for GitHub sign-in.
//!
//! Receives an authorization code from the GitHub callback, exchanges it for
//! an access token, fetches the user's profile and emails, reconciles them
//! against the account store, and returns a one-time sign-in token for the
//! redirect back to the frontend.

use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use crate::gateway::account_store::{AccountMetadata, AccountStore, GoTrueAdminClient};
use crate::gateway::github_oauth::{GitHubEmail, GitHubOAuthClient, GitHubOAuthUrls, GitHubUser};
use log::*;
use service::config::Config;
use std::sync::Arc;
use url::Url;

/// One-time sign-in artifact issued by the account store. The token is
/// embedded in the redirect fragment and never stored by this service.
#[derive(Debug)]
pub struct LinkedSession {
    pub access_token: String,
}

/// Gateway linking a GitHub identity to an account in the store.
///
/// Provider credentials and the account-store admin client are validated once
/// at construction, not per request.
pub struct IdentityLinkGateway {
    github: GitHubOAuthClient,
    store: Arc<dyn AccountStore>,
}

impl std::fmt::Debug for IdentityLinkGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityLinkGateway")
            .field("github", &self.github)
            .finish_non_exhaustive()
    }
}

impl IdentityLinkGateway {
    /// Build the gateway from process configuration.
    ///
    /// Fails with a config error when any of the GitHub client credentials or
    /// account-store admin credentials are missing.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let client_id = config.github_client_id().ok_or_else(|| Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        })?;

        let client_secret = config.github_client_secret().ok_or_else(|| Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        })?;

        let store_url = config.account_store_url().ok_or_else(|| Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        })?;

        let service_key = config.account_store_service_key().ok_or_else(|| Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        })?;

        let urls = GitHubOAuthUrls::from_base_urls(
            config.github_oauth_base_url(),
            config.github_api_base_url(),
        );
        let github = GitHubOAuthClient::new(&client_id, &client_secret, urls)?;
        let store = GoTrueAdminClient::new(&store_url, &service_key)?;

        Ok(Self::new(github, Arc::new(store)))
    }

    /// Build the gateway from explicit collaborators.
    pub fn new(github: GitHubOAuthClient, store: Arc<dyn AccountStore>) -> Self {
        Self { github, store }
    }

    /// Run the linking flow for one authorization code.
    ///
    /// Exactly one account is selected or created per execution, and exactly
    /// one sign-in link is requested for it. All upstream calls are
    /// single-attempt; replaying a consumed code fails at the token exchange.
    pub async fn link_identity(&self, code: &str) -> Result<LinkedSession, Error> {
        let access_token = self.github.exchange_code(code).await?;

        let profile = self.github.get_user(&access_token).await?;
        let emails = self.github.get_user_emails(&access_token).await?;
        let primary_email = select_primary_email(&emails, profile.id);
        debug!(
            "Resolved primary email for GitHub user {}",
            profile.login
        );

        let metadata = provider_metadata(&profile);

        let existing = self
            .store
            .find_account(&primary_email, &profile.login)
            .await?;

        let session_email = match existing {
            Some(account) => {
                info!("Existing account {} matched, signing in", account.id);
                self.store
                    .update_account_metadata(account.id, &metadata)
                    .await?;
                // A handle match may carry a different stored email than the
                // one GitHub now reports; the sign-in link must target the
                // account that actually matched.
                account.email.unwrap_or(primary_email)
            }
            None => {
                info!("No matching account for {}, creating one", profile.login);
                let account = self.store.create_account(&primary_email, &metadata).await?;
                account.email.unwrap_or(primary_email)
            }
        };

        let action_link = self.store.issue_session_link(&session_email).await?;
        let session_token = extract_session_token(&action_link)?;

        info!("Issued one-time sign-in token for {}", profile.login);
        Ok(LinkedSession {
            access_token: session_token,
        })
    }
}

/// Metadata written to the matched or created account, overwriting whatever
/// the previous sign-in recorded.
fn provider_metadata(profile: &GitHubUser) -> AccountMetadata {
    AccountMetadata {
        username: Some(
            profile
                .name
                .clone()
                .unwrap_or_else(|| profile.login.clone()),
        ),
        github_username: Some(profile.login.clone()),
        avatar_url: profile.avatar_url.clone(),
    }
}

/// Select the account email from the provider's records: the record flagged
/// primary, else the first record, else a synthesized placeholder address.
fn select_primary_email(emails: &[GitHubEmail], github_id: i64) -> String {
    emails
        .iter()
        .find(|record| record.primary)
        .or_else(|| emails.first())
        .map(|record| record.email.clone())
        .unwrap_or_else(|| format!("{}@github.user", github_id))
}

/// Extract the one-time token from the store's magic-link action URL.
fn extract_session_token(action_link: &str) -> Result<String, Error> {
    let parsed = Url::parse(action_link).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: DomainErrorKind::External(ExternalErrorKind::SessionIssuance(
            "Failed to sign in".to_string(),
        )),
    })?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| Error {
            source: None,
            error_kind: DomainErrorKind::External(ExternalErrorKind::SessionIssuance(
                "Failed to sign in".to_string(),
            )),
        })
}
