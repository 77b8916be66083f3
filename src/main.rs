use domain::IdentityLinkGateway;
use log::*;
use service::config::Config;
use service::logging::Logger;
use std::sync::Arc;
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!(
        "Starting BackZauber platform API in {} mode",
        config.runtime_env()
    );

    // Provider and account-store credentials are validated once here. When
    // they are incomplete the server still starts (health and summarization
    // stay available) and the callback endpoint reports the configuration
    // error per request.
    let identity_gateway = match IdentityLinkGateway::from_config(&config) {
        Ok(gateway) => Some(Arc::new(gateway)),
        Err(e) => {
            warn!("GitHub identity linking disabled: {e}");
            None
        }
    };

    let app_state = AppState::new(config, identity_gateway);

    web::init_server(app_state)
        .await
        .expect("Failed to run the backend web server");
}
