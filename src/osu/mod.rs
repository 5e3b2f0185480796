pub mod auth;
pub mod data;
pub mod download;
pub mod fetch;

use reqwest::Client;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::error::Result;

/// Authenticated API context, built once per run and passed along explicitly.
#[derive(Debug, Clone)]
pub struct Session {
    pub base_url: String,
    pub access_token: String,
}

impl Session {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }
}

/// Shared client for search and download requests; every request gets the timeout.
pub fn http_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}
