//! Account store client.
//!
//! The account store is an external GoTrue-style auth service that owns user
//! accounts, credentials, and session issuance. This module defines the
//! `AccountStore` capability the identity-linking flow depends on, plus the
//! HTTP implementation against the store's admin API (service-role key).

use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};
use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account metadata written on every completed sign-in, last-provider-write-wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// An account as reported by the store. Externally owned; read here only to
/// decide between the reuse and create branches of the linking flow.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: AccountMetadata,
}

/// The account-store capability used by the identity-linking flow.
///
/// `find_account` is the single lookup operation covering both match
/// predicates (primary email, stored provider handle), so the flow's
/// two-branch logic stays testable against an in-memory fake.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find an account whose email equals `email` or whose stored metadata
    /// carries `github_login` as the provider handle.
    async fn find_account(
        &self,
        email: &str,
        github_login: &str,
    ) -> Result<Option<Account>, Error>;

    /// Create a pre-verified account for `email` carrying `metadata`.
    async fn create_account(&self, email: &str, metadata: &AccountMetadata)
        -> Result<Account, Error>;

    /// Overwrite the provider-owned metadata fields of an existing account.
    async fn update_account_metadata(
        &self,
        id: Uuid,
        metadata: &AccountMetadata,
    ) -> Result<(), Error>;

    /// Generate a one-time magic-link sign-in URL for `email`.
    async fn issue_session_link(&self, email: &str) -> Result<String, Error>;
}

#[derive(Debug, Deserialize)]
struct ListAccountsResponse {
    #[serde(default)]
    users: Vec<Account>,
}

#[derive(Debug, Serialize)]
struct CreateAccountRequest<'a> {
    email: &'a str,
    email_confirm: bool,
    user_metadata: &'a AccountMetadata,
}

#[derive(Debug, Serialize)]
struct UpdateMetadataRequest<'a> {
    user_metadata: &'a AccountMetadata,
}

#[derive(Debug, Serialize)]
struct GenerateLinkRequest<'a> {
    #[serde(rename = "type")]
    link_type: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateLinkResponse {
    action_link: String,
}

/// HTTP client for the account store's admin API
pub struct GoTrueAdminClient {
    client: reqwest::Client,
    base_url: String,
}

impl GoTrueAdminClient {
    /// Create a new admin client authenticated with the service-role key
    pub fn new(base_url: &str, service_key: &str) -> Result<Self, Error> {
        let headers = build_auth_headers(service_key)?;

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/admin/{}", self.base_url, path)
    }
}

#[async_trait]
impl AccountStore for GoTrueAdminClient {
    async fn find_account(
        &self,
        email: &str,
        github_login: &str,
    ) -> Result<Option<Account>, Error> {
        let response = self
            .client
            .get(self.admin_url("users"))
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to list accounts: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::AccountStore(
                        "Failed to look up account".to_string(),
                    )),
                }
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Account store list error: {}", error_text);
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::AccountStore(
                    "Failed to look up account".to_string(),
                )),
            });
        }

        let listing: ListAccountsResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse account listing: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::AccountStore(
                    "Failed to look up account".to_string(),
                )),
            }
        })?;

        let matched = listing.users.into_iter().find(|account| {
            account.email.as_deref() == Some(email)
                || account.user_metadata.github_username.as_deref() == Some(github_login)
        });

        Ok(matched)
    }

    async fn create_account(
        &self,
        email: &str,
        metadata: &AccountMetadata,
    ) -> Result<Account, Error> {
        let request = CreateAccountRequest {
            email,
            // The identity provider already confirmed this address (or we
            // synthesized a placeholder), so the account starts verified.
            email_confirm: true,
            user_metadata: metadata,
        };

        let response = self
            .client
            .post(self.admin_url("users"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to create account: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::AccountStore(
                        "Failed to create account".to_string(),
                    )),
                }
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Account store create error: {}", error_text);
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::AccountStore(
                    "Failed to create account".to_string(),
                )),
            });
        }

        let account: Account = response.json().await.map_err(|e| {
            warn!("Failed to parse created account: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::AccountStore(
                    "Failed to create account".to_string(),
                )),
            }
        })?;
        info!("Created account {} in the store", account.id);
        Ok(account)
    }

    async fn update_account_metadata(
        &self,
        id: Uuid,
        metadata: &AccountMetadata,
    ) -> Result<(), Error> {
        let request = UpdateMetadataRequest {
            user_metadata: metadata,
        };

        let response = self
            .client
            .put(self.admin_url(&format!("users/{}", id)))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to update account metadata: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::AccountStore(
                        "Failed to update account".to_string(),
                    )),
                }
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Account store update error for {}: {}", id, error_text);
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::AccountStore(
                    "Failed to update account".to_string(),
                )),
            });
        }

        debug!("Updated metadata for account {}", id);
        Ok(())
    }

    async fn issue_session_link(&self, email: &str) -> Result<String, Error> {
        let request = GenerateLinkRequest {
            link_type: "magiclink",
            email,
        };

        let response = self
            .client
            .post(self.admin_url("generate_link"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to generate magic link: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::External(ExternalErrorKind::SessionIssuance(
                        "Failed to sign in".to_string(),
                    )),
                }
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Account store generate_link error: {}", error_text);
            return Err(Error {
                source: None,
                error_kind: DomainErrorKind::External(ExternalErrorKind::SessionIssuance(
                    "Failed to sign in".to_string(),
                )),
            });
        }

        let link: GenerateLinkResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse generate_link response: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::SessionIssuance(
                    "Failed to sign in".to_string(),
                )),
            }
        })?;

        Ok(link.action_link)
    }
}

/// Build authentication headers for the account store admin API
fn build_auth_headers(service_key: &str) -> Result<reqwest::header::HeaderMap, Error> {
    let mut headers = reqwest::header::HeaderMap::new();

    let auth_value = format!("Bearer {}", service_key);
    let mut auth_header = reqwest::header::HeaderValue::from_str(&auth_value).map_err(|err| {
        warn!("Failed to create authorization header value: {err:?}");
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to create authorization header value".to_string(),
            )),
        }
    })?;
    auth_header.set_sensitive(true);
    headers.insert(reqwest::header::AUTHORIZATION, auth_header);

    let mut apikey_header =
        reqwest::header::HeaderValue::from_str(service_key).map_err(|err| Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to create apikey header value".to_string(),
            )),
        })?;
    apikey_header.set_sensitive(true);
    headers.insert("apikey", apikey_header);

    headers.insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(server: &mockito::ServerGuard) -> GoTrueAdminClient {
        GoTrueAdminClient::new(&server.url(), "service_key_123").unwrap()
    }

    #[tokio::test]
    async fn test_find_account_matches_by_email() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/admin/users")
            .match_header("authorization", "Bearer service_key_123")
            .match_header("apikey", "service_key_123")
            .with_status(200)
            .with_body(
                r#"{"users":[
                    {"id":"7f1a7b73-2a12-4a55-8b3c-0c8b0e9d5a01","email":"other@example.com"},
                    {"id":"a3e8b1c4-5d6f-4e2a-9b0c-1d2e3f4a5b6c","email":"octo@example.com"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server);
        let account = client
            .find_account("octo@example.com", "octocat")
            .await
            .unwrap()
            .expect("account should match by email");
        assert_eq!(account.email.as_deref(), Some("octo@example.com"));
    }

    #[tokio::test]
    async fn test_find_account_matches_by_github_handle() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/admin/users")
            .with_status(200)
            .with_body(
                r#"{"users":[
                    {"id":"7f1a7b73-2a12-4a55-8b3c-0c8b0e9d5a01",
                     "email":"registered-long-ago@example.com",
                     "user_metadata":{"github_username":"octocat"}}
                ]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server);
        let account = client
            .find_account("octo@example.com", "octocat")
            .await
            .unwrap()
            .expect("account should match by stored handle");
        assert_eq!(
            account.user_metadata.github_username.as_deref(),
            Some("octocat")
        );
    }

    #[tokio::test]
    async fn test_find_account_no_match() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/admin/users")
            .with_status(200)
            .with_body(r#"{"users":[]}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let account = client.find_account("octo@example.com", "octocat").await.unwrap();
        assert!(account.is_none());
    }

    #[tokio::test]
    async fn test_create_account_marks_email_confirmed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/admin/users")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "email": "octo@example.com",
                "email_confirm": true,
                "user_metadata": {
                    "username": "The Octocat",
                    "github_username": "octocat"
                }
            })))
            .with_status(200)
            .with_body(
                r#"{"id":"a3e8b1c4-5d6f-4e2a-9b0c-1d2e3f4a5b6c",
                    "email":"octo@example.com",
                    "user_metadata":{"username":"The Octocat","github_username":"octocat"}}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server);
        let metadata = AccountMetadata {
            username: Some("The Octocat".to_string()),
            github_username: Some("octocat".to_string()),
            avatar_url: None,
        };
        let account = client
            .create_account("octo@example.com", &metadata)
            .await
            .unwrap();
        assert_eq!(account.email.as_deref(), Some("octo@example.com"));
        assert_eq!(account.user_metadata, metadata);
    }

    #[tokio::test]
    async fn test_create_account_failure_maps_to_account_store_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/admin/users")
            .with_status(422)
            .with_body(r#"{"msg":"email already registered"}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let err = client
            .create_account("octo@example.com", &AccountMetadata::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::AccountStore(
                "Failed to create account".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_update_account_metadata_puts_to_user_resource() {
        let mut server = mockito::Server::new_async().await;
        let id: Uuid = "a3e8b1c4-5d6f-4e2a-9b0c-1d2e3f4a5b6c".parse().unwrap();
        let _mock = server
            .mock("PUT", "/admin/users/a3e8b1c4-5d6f-4e2a-9b0c-1d2e3f4a5b6c")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "user_metadata": {
                    "username": "The Octocat",
                    "github_username": "octocat",
                    "avatar_url": "https://example.com/a.png"
                }
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = test_client(&server);
        let metadata = AccountMetadata {
            username: Some("The Octocat".to_string()),
            github_username: Some("octocat".to_string()),
            avatar_url: Some("https://example.com/a.png".to_string()),
        };
        client.update_account_metadata(id, &metadata).await.unwrap();
    }

    #[tokio::test]
    async fn test_issue_session_link_returns_action_link() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/admin/generate_link")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "type": "magiclink",
                "email": "octo@example.com"
            })))
            .with_status(200)
            .with_body(
                r#"{"action_link":"https://store.example.com/verify?token=one-time-token&type=magiclink"}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server);
        let link = client.issue_session_link("octo@example.com").await.unwrap();
        assert!(link.contains("token=one-time-token"));
    }

    #[tokio::test]
    async fn test_issue_session_link_failure_maps_to_session_issuance() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/admin/generate_link")
            .with_status(500)
            .with_body(r#"{"msg":"smtp unavailable"}"#)
            .create_async()
            .await;

        let client = test_client(&server);
        let err = client
            .issue_session_link("octo@example.com")
            .await
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::SessionIssuance(
                "Failed to sign in".to_string()
            ))
        );
    }
}
