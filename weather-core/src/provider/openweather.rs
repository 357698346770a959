use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::{
    config::RelaySettings,
    error::{Outcome, RelayError},
    model::{Endpoint, Location},
};

use super::WeatherProvider;

const UNITS: &str = "metric";

/// OpenWeatherMap 2.5 REST API, authenticated with a query-string key.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(settings: RelaySettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self { api_key: settings.api_key, base_url: settings.base_url, http })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    fn query(&self, location: &Location) -> Vec<(&'static str, String)> {
        let mut pairs = location.query_pairs();
        pairs.push(("appid", self.api_key.clone()));
        pairs.push(("units", UNITS.to_string()));
        pairs
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, endpoint: Endpoint, location: &Location) -> Outcome {
        let res = self
            .http
            .get(self.url(endpoint))
            .query(&self.query(location))
            .send()
            .await
            .map_err(RelayError::from_transport)?;

        let status = res.status();
        let body = res.text().await.map_err(RelayError::from_transport)?;

        if !status.is_success() {
            tracing::debug!(%endpoint, %status, body = %truncate_body(&body), "OpenWeather returned an error");
            return Err(RelayError::upstream(status, error_message(&body)));
        }

        serde_json::from_str::<Value>(&body).map_err(|e| {
            RelayError::internal(format!(
                "Failed to parse OpenWeather {endpoint} JSON: {e}; body: {}",
                truncate_body(&body)
            ))
        })
    }
}

/// The provider reports failures as `{"cod": ..., "message": "..."}`.
fn error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed.get("message")?.as_str().map(str::to_string)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
