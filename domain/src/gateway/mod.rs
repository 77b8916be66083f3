//! Gateway modules to external collaborators: the GitHub identity provider,
//! the account store's admin API, and the AI completion gateway.

pub mod account_store;
pub mod ai_gateway;
pub mod github_oauth;
