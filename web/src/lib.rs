pub mod controller;
pub mod error;
pub mod params;
pub mod router;

pub use error::{Error, Result};

use domain::IdentityLinkGateway;
use log::*;
use service::config::Config;
use std::sync::Arc;

/// Application state shared with every controller via the axum Router.
/// Needs to implement Clone to be able to be passed into Router as State.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    identity_gateway: Option<Arc<IdentityLinkGateway>>,
}

impl AppState {
    /// `identity_gateway` is `None` when the provider or account-store
    /// credentials were incomplete at startup; the callback endpoint then
    /// reports the configuration error per request.
    pub fn new(config: Config, identity_gateway: Option<Arc<IdentityLinkGateway>>) -> Self {
        Self {
            config,
            identity_gateway,
        }
    }

    pub fn identity_gateway(&self) -> Option<&Arc<IdentityLinkGateway>> {
        self.identity_gateway.as_ref()
    }
}

/// Bind the configured interface/port and serve the API router until shutdown.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let listen_addr = format!("{}:{}", interface, app_state.config.port);

    info!("Server starting... listening for connections on http://{listen_addr}");

    let router = router::define_routes(app_state);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    axum::serve(listener, router).await
}
