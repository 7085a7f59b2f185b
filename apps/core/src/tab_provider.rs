use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::discovery::{DiscoveryProvider, ProviderError};
use crate::logging;
use crate::model::{Item, TabRecord};

/// One entry of the remote-debugging `/json/list` response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DevtoolsTarget {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub target_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "faviconUrl", default)]
    pub favicon_url: Option<String>,
}

/// Keeps ordinary web pages, dropping workers, extensions, internal `chrome://` pages and
/// targets without an id.
pub fn page_tabs(targets: Vec<DevtoolsTarget>) -> Vec<TabRecord> {
    targets
        .into_iter()
        .filter(|target| {
            !target.id.trim().is_empty()
                && target.target_type == "page"
                && is_web_url(&target.url)
        })
        .map(|target| TabRecord {
            id: target.id,
            title: target.title,
            url: target.url,
            favicon_url: target.favicon_url,
        })
        .collect()
}

fn is_web_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Client for a browser's remote-debugging HTTP endpoint.
pub struct TabProvider {
    base_url: String,
    timeout: Duration,
    client: OnceLock<Client>,
}

impl TabProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client: OnceLock::new(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.devtools_base_url(), cfg.provider_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client(&self) -> Result<&Client, ProviderError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .build()
            .map_err(|e| ProviderError::new(format!("failed to build devtools client: {e}")))?;
        Ok(self.client.get_or_init(|| client))
    }

    pub fn list_records(&self) -> Result<Vec<TabRecord>, ProviderError> {
        let url = format!("{}/json/list", self.base_url);
        let response = self
            .client()?
            .get(&url)
            .send()
            .map_err(|e| request_error(&url, e))?;
        if !response.status().is_success() {
            return Err(ProviderError::new(format!(
                "{url} returned status {}",
                response.status()
            )));
        }
        let targets: Vec<DevtoolsTarget> = response
            .json()
            .map_err(|e| ProviderError::new(format!("invalid target list from {url}: {e}")))?;
        Ok(page_tabs(targets))
    }

    pub fn list_tabs(&self) -> Vec<Item> {
        match self.list_records() {
            Ok(records) => records.into_iter().map(Item::from_tab).collect(),
            Err(error) => {
                logging::info(&format!("browser tabs unavailable: {error}"));
                Vec::new()
            }
        }
    }

    /// Switches the browser to the tab with the provider-native id.
    pub fn activate_tab(&self, native_id: &str) -> Result<(), ProviderError> {
        self.target_command("activate", native_id)
    }

    pub fn close_tab(&self, native_id: &str) -> Result<(), ProviderError> {
        self.target_command("close", native_id)
    }

    fn target_command(&self, command: &str, native_id: &str) -> Result<(), ProviderError> {
        let native_id = native_id.trim();
        if native_id.is_empty() {
            return Err(ProviderError::new("empty tab id"));
        }
        let url = format!("{}/json/{command}/{native_id}", self.base_url);
        let response = self
            .client()?
            .get(&url)
            .send()
            .map_err(|e| request_error(&url, e))?;
        if !response.status().is_success() {
            return Err(ProviderError::new(format!(
                "{command} tab {native_id} returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn request_error(url: &str, error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::timeout(format!("{url} timed out: {error}"))
    } else if error.is_connect() {
        ProviderError::unavailable(format!(
            "remote debugging endpoint not reachable at {url}: {error}"
        ))
    } else {
        ProviderError::new(format!("{url} request failed: {error}"))
    }
}

impl DiscoveryProvider for TabProvider {
    fn provider_name(&self) -> &'static str {
        "tabs"
    }

    fn discover(&self) -> Result<Vec<Item>, ProviderError> {
        self.list_records()
            .map(|records| records.into_iter().map(Item::from_tab).collect())
    }
}
