use super::SuggestionService;
use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::*;

pub const DEFAULT_SUGGEST_ENDPOINT: &str = "http://suggestqueries.google.com/complete/search";

#[derive(Debug, Clone)]
pub struct WebSuggestConfig {
    pub endpoint: String,
    pub language: String,
    /// `None` leaves the request unbounded; callers wanting a deadline set one here.
    pub timeout: Option<Duration>,
}

impl Default for WebSuggestConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SUGGEST_ENDPOINT.to_string(),
            language: "en".to_string(),
            timeout: None,
        }
    }
}

/// Web autocomplete service speaking the `output=firefox` JSON dialect:
/// `["query", ["suggestion 1", "suggestion 2", ...], ...]`.
pub struct WebSuggest {
    client: Client,
    config: WebSuggestConfig,
}

impl WebSuggest {
    pub fn new(config: WebSuggestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build suggestion HTTP client")?;
        Ok(Self { client, config })
    }
}

impl SuggestionService for WebSuggest {
    fn suggest(&self, query: &str) -> Result<Vec<String>> {
        debug!("Requesting suggestions for {} from {}", query, self.config.endpoint);
        let body = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("output", "firefox"),
                ("hl", self.config.language.as_str()),
                ("q", query),
            ])
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .context(format!("Suggestion request for {query} failed"))?;
        parse_suggestions(&body)
    }
}

/// Extracts the suggestion list (second element) from a `firefox`-style response body.
pub fn parse_suggestions(body: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(body).context("Suggestion response is not JSON")?;
    let Some(list) = value.get(1).and_then(Value::as_array) else {
        bail!("Suggestion response has no suggestion list: {}", body);
    };
    list.iter()
        .map(|s| {
            s.as_str()
                .map(str::to_owned)
                .ok_or_else(|| anyhow!("Suggestion is not a string: {}", s))
        })
        .collect()
}
