//! Endpoint and storage configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Account login endpoint.
pub const DEFAULT_LOGIN_URL: &str = "https://www.hatena.ne.jp/login";

/// Base URL for the per-user bookmark pages.
pub const DEFAULT_BASE_URL: &str = "http://b.hatena.ne.jp";

/// Per-request timeout. Every round trip is bounded; nothing is retried.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

pub const USER_AGENT: &str = concat!("hatebu/", env!("CARGO_PKG_VERSION"));

/// Resolved endpoints and storage location.
#[derive(Debug, Clone)]
pub struct Config {
    pub login_url: String,
    pub base_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    /// Build from `HATEBU_LOGIN_URL`, `HATEBU_BASE_URL` and `HATEBU_DATA_DIR`,
    /// falling back to the service endpoints and the platform data directory.
    pub fn from_env() -> Self {
        let login_url =
            env::var("HATEBU_LOGIN_URL").unwrap_or_else(|_| DEFAULT_LOGIN_URL.to_string());
        let base_url =
            env::var("HATEBU_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let data_dir = env::var_os("HATEBU_DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|d| d.join("hatebu")))
            .unwrap_or_else(|| PathBuf::from(".hatebu"));

        Self {
            login_url,
            base_url,
            data_dir,
        }
    }
}

/// Base HTTP client builder shared by both clients: explicit timeout and
/// user agent; callers pick the redirect policy.
pub fn http_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
}
