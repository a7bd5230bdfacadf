//! Wazuh manager API client for the agent count.
//!
//! Two blocking requests per run: authenticate for a bearer token, then list
//! agents. Managers ship with a self-signed certificate, so TLS verification
//! is off unless `verify_tls` is set.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::{Config, Credentials};
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct AgentClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl AgentClient {
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| Error::AgentQuery(format!("cannot build http client: {e}")))?;

        Ok(AgentClient {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Number of agents currently registered with the manager.
    pub fn agent_count(&self) -> Result<u64> {
        let token = self.authenticate()?;
        self.fetch_agent_count(&token)
    }

    fn authenticate(&self) -> Result<String> {
        let url = format!("{}/security/user/authenticate", self.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .map_err(|e| Error::AgentQuery(format!("authentication request failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::AgentQuery(format!("authentication rejected: {e}")))?;

        let body: Value = response
            .json()
            .map_err(|e| Error::AgentQuery(format!("bad authentication response: {e}")))?;

        body.pointer("/data/token")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| Error::AgentQuery("token missing from authentication response".to_string()))
    }

    fn fetch_agent_count(&self, token: &str) -> Result<u64> {
        let url = format!("{}/agents", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .map_err(|e| Error::AgentQuery(format!("agent listing failed: {e}")))?
            .error_for_status()
            .map_err(|e| Error::AgentQuery(format!("agent listing rejected: {e}")))?;

        let body: Value = response
            .json()
            .map_err(|e| Error::AgentQuery(format!("bad agent listing response: {e}")))?;

        // older managers return `items` instead of `affected_items`
        body.pointer("/data/affected_items")
            .or_else(|| body.pointer("/data/items"))
            .and_then(Value::as_array)
            .map(|items| items.len() as u64)
            .ok_or_else(|| Error::AgentQuery("agent list missing from response".to_string()))
    }
}
