//! HTTP access to the live-client endpoint

use crate::config::LiveConfig;
use crate::schema::AllGameData;
use crate::Result;
use anyhow::Context;
use log::trace;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected payload from {url}")]
    Decode { url: String },
}

/// Anything that can report the current game state.
///
/// `None` means "no information this cycle", whatever the reason.
pub trait GameStateSource {
    fn fetch(&self) -> Option<AllGameData>;
}

/// Blocking client for the local live-client endpoint.
///
/// The endpoint serves a self-signed certificate on localhost, so
/// certificate verification is disabled.
#[derive(Debug, Clone)]
pub struct LiveClient {
    http: reqwest::blocking::Client,
    url: String,
}

impl LiveClient {
    /// Build the client. Fails only if the TLS backend cannot initialize.
    pub fn new(config: &LiveConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(config.timeout())
            .build()
            .context("Failed to build live client HTTP client")?;
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One request, with the failure reason kept
    pub fn try_fetch(&self) -> std::result::Result<AllGameData, LiveError> {
        let request_error = |source| LiveError::Request {
            url: self.url.clone(),
            source,
        };
        let bytes = self
            .http
            .get(&self.url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(request_error)?;
        AllGameData::from_slice(&bytes).ok_or_else(|| LiveError::Decode {
            url: self.url.clone(),
        })
    }
}

impl GameStateSource for LiveClient {
    fn fetch(&self) -> Option<AllGameData> {
        match self.try_fetch() {
            Ok(data) => Some(data),
            Err(err) => {
                trace!("live poll skipped: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_endpoint_is_no_data() -> Result<()> {
        let config = LiveConfig {
            // Port 9 (discard) on localhost: refused or timed out, never a payload
            url: "https://127.0.0.1:9/liveclientdata/allgamedata".to_string(),
            timeout_ms: 100,
            ..Default::default()
        };
        let client = LiveClient::new(&config)?;
        assert!(client.fetch().is_none());
        assert!(matches!(client.try_fetch(), Err(LiveError::Request { .. })));
        Ok(())
    }
}
