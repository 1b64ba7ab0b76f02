//! Client construction for OpenAI-compatible endpoints.
//!
//! The language model and the optional remote embedder both speak the OpenAI
//! wire format, so one helper builds either client from a base URL and the
//! name of the environment variable that holds its key.

use crate::error::{ResolvError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Read an API key from the environment, rejecting empty values.
pub fn api_key_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(ResolvError::Config(format!(
            "{} is empty. Set it in your environment or in a .env file.",
            var
        ))),
        Err(_) => Err(ResolvError::Config(format!(
            "{} not found. Set it in your environment or in a .env file.",
            var
        ))),
    }
}

/// Create a client for the given base URL with the key read from `api_key_env`.
pub fn create_client(
    api_base: &str,
    api_key_env: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let api_key = api_key_from_env(api_key_env)?;
    create_client_with_key(api_base, &api_key, timeout)
}

/// Create a client with an explicit key.
pub fn create_client_with_key(
    api_base: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
