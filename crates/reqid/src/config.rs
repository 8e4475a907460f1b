//! Configuration types and loading logic.

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use reqid_tracing::TracingConfig;
use serde::Deserialize;

/// Header read from requests and echoed on responses when none is configured.
pub const DEFAULT_HEADER_NAME: &str = "x-request-id";

/// Top-level configuration for the echo service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub request_id: RequestIdConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Server listen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

/// Request identifier assignment options.
///
/// The identifier generator is code, not configuration; set it through
/// [`Assigner::builder`](crate::Assigner::builder).
#[derive(Debug, Clone, Deserialize)]
pub struct RequestIdConfig {
    /// Header used both to read an incoming identifier and to echo the
    /// resolved one. Matched case-insensitively.
    #[serde(default = "default_header_name")]
    pub header_name: String,

    /// Whether to write the resolved identifier onto the response.
    #[serde(default = "default_true")]
    pub set_response_header: bool,
}

fn default_listen_address() -> String {
    "0.0.0.0:3080".to_string()
}

fn default_header_name() -> String {
    DEFAULT_HEADER_NAME.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
        }
    }
}

impl Default for RequestIdConfig {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            set_response_header: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (REQID_ prefix, __ for nesting)
    /// 2. TOML config file (skipped if it does not exist)
    /// 3. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("REQID_").split("__"))
            .extract()?;

        Ok(config)
    }
}
