use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;

/// Default GitHub base URL for the OAuth authorization-code exchange.
/// Override in tests to point at a mock server.
pub const DEFAULT_GITHUB_OAUTH_BASE_URL: &str = "https://github.com";

/// Default GitHub REST API base URL used to fetch user profiles and emails.
/// Override in tests to point at a mock server.
pub const DEFAULT_GITHUB_API_BASE_URL: &str = "https://api.github.com";

/// Default AI gateway base URL for recipe summarization.
/// Override in tests to point at a mock server.
pub const DEFAULT_AI_GATEWAY_BASE_URL: &str = "https://ai.gateway.lovable.dev";

/// Default frontend origin users are redirected back to after sign-in.
pub const DEFAULT_OAUTH_SUCCESS_REDIRECT_URL: &str = "https://backzauber.lovable.app/";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The GitHub OAuth application client ID.
    #[arg(long, env)]
    github_client_id: Option<String>,

    /// The GitHub OAuth application client secret.
    #[arg(long, env)]
    github_client_secret: Option<String>,

    /// The base URL of GitHub's OAuth endpoints (token exchange).
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_GITHUB_OAUTH_BASE_URL)]
    github_oauth_base_url: String,

    /// The base URL of the GitHub REST API (user profile and emails).
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_GITHUB_API_BASE_URL)]
    github_api_base_url: String,

    /// The base URL of the account store's auth admin API.
    #[arg(long, env)]
    account_store_url: Option<String>,

    /// The service-role key authorizing admin calls against the account store.
    #[arg(long, env)]
    account_store_service_key: Option<String>,

    /// The frontend URL users are redirected back to after sign-in when the
    /// callback request carries no explicit redirect_url parameter.
    #[arg(long, env, default_value = DEFAULT_OAUTH_SUCCESS_REDIRECT_URL)]
    oauth_success_redirect_url: String,

    /// The base URL of the OpenAI-compatible AI gateway used for recipe summaries.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_AI_GATEWAY_BASE_URL)]
    ai_gateway_base_url: String,

    /// The API key to use when calling the AI gateway.
    #[arg(long, env)]
    ai_gateway_api_key: Option<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn github_client_id(&self) -> Option<String> {
        self.github_client_id.clone()
    }

    pub fn github_client_secret(&self) -> Option<String> {
        self.github_client_secret.clone()
    }

    /// Returns the base URL of GitHub's OAuth endpoints.
    pub fn github_oauth_base_url(&self) -> &str {
        &self.github_oauth_base_url
    }

    /// Returns the base URL of the GitHub REST API.
    pub fn github_api_base_url(&self) -> &str {
        &self.github_api_base_url
    }

    /// Returns the account store's auth admin API base URL, if configured.
    pub fn account_store_url(&self) -> Option<String> {
        self.account_store_url.clone()
    }

    /// Returns the account store service-role key, if configured.
    pub fn account_store_service_key(&self) -> Option<String> {
        self.account_store_service_key.clone()
    }

    /// Returns the default frontend redirect URL for completed sign-ins.
    pub fn oauth_success_redirect_url(&self) -> &str {
        &self.oauth_success_redirect_url
    }

    /// Returns the AI gateway base URL.
    pub fn ai_gateway_base_url(&self) -> &str {
        &self.ai_gateway_base_url
    }

    /// Returns the AI gateway API key, if configured.
    pub fn ai_gateway_api_key(&self) -> Option<String> {
        self.ai_gateway_api_key.clone()
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        // This could check an environment variable, or a config field
        self.runtime_env() == RustEnv::Production
    }
}
