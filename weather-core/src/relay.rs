use std::sync::Arc;

use crate::{
    config::RelaySettings,
    error::{Outcome, RelayError},
    model::{Endpoint, WeatherQuery},
    provider::{WeatherProvider, openweather::OpenWeatherProvider},
};

/// Forwards weather queries to the upstream provider and hands back its
/// payload, or a failure the HTTP layer can render directly.
///
/// Holds no per-request state; cloning shares the same provider.
#[derive(Debug, Clone)]
pub struct WeatherRelay {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherRelay {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Relay backed by OpenWeatherMap.
    pub fn openweather(settings: RelaySettings) -> anyhow::Result<Self> {
        let provider = OpenWeatherProvider::new(settings)?;
        Ok(Self::new(Arc::new(provider)))
    }

    /// Current conditions for the query's location.
    pub async fn resolve(&self, query: &WeatherQuery) -> Outcome {
        self.relay(Endpoint::Current, query).await
    }

    /// Multi-day forecast for the query's location.
    pub async fn resolve_forecast(&self, query: &WeatherQuery) -> Outcome {
        self.relay(Endpoint::Forecast, query).await
    }

    async fn relay(&self, endpoint: Endpoint, query: &WeatherQuery) -> Outcome {
        tracing::debug!(
            %endpoint,
            lat = ?query.latitude,
            lon = ?query.longitude,
            city = ?query.city,
            "Received weather query"
        );

        let location = query
            .location()
            .inspect_err(|err| log_failure(endpoint, "-", err))?;

        let outcome = self.provider.fetch(endpoint, &location).await;

        if let Err(err) = &outcome {
            log_failure(endpoint, &location.to_string(), err);
        }

        outcome
    }
}

fn log_failure(endpoint: Endpoint, location: &str, err: &RelayError) {
    if err.is_client_error() {
        tracing::debug!(%endpoint, error = %err, "Rejected weather query");
        return;
    }

    match err {
        RelayError::Internal { detail } => {
            tracing::error!(%endpoint, %location, %detail, "Unexpected relay failure");
        }
        RelayError::Unavailable(source) | RelayError::Timeout(source) => {
            tracing::warn!(%endpoint, %location, error = %source, "Weather provider unreachable");
        }
        RelayError::Upstream { status, message } => {
            tracing::warn!(%endpoint, %location, %status, %message, "Weather provider rejected request");
        }
        RelayError::MissingLocation | RelayError::InvalidParameter { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every call and answers with a canned outcome per endpoint.
    #[derive(Debug, Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<(Endpoint, Location)>>,
        fail_with: Option<StatusCode>,
    }

    impl RecordingProvider {
        fn calls(&self) -> Vec<(Endpoint, Location)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for RecordingProvider {
        async fn fetch(&self, endpoint: Endpoint, location: &Location) -> Outcome {
            self.calls.lock().unwrap().push((endpoint, location.clone()));
            match self.fail_with {
                Some(status) => Err(RelayError::upstream(status, Some("nope".into()))),
                None => Ok(json!({ "endpoint": endpoint.path(), "location": location.to_string() })),
            }
        }
    }

    fn relay_with(provider: Arc<RecordingProvider>) -> WeatherRelay {
        WeatherRelay::new(provider)
    }

    #[tokio::test]
    async fn invalid_query_never_reaches_provider() {
        let provider = Arc::new(RecordingProvider::default());
        let relay = relay_with(provider.clone());

        let err = relay.resolve(&WeatherQuery::default()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = relay.resolve_forecast(&WeatherQuery::default()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn resolve_and_forecast_select_endpoints() {
        let provider = Arc::new(RecordingProvider::default());
        let relay = relay_with(provider.clone());

        relay.resolve(&WeatherQuery::city("Kyiv")).await.unwrap();
        relay.resolve_forecast(&WeatherQuery::coordinates(0.0, 0.0)).await.unwrap();

        assert_eq!(
            provider.calls(),
            vec![
                (Endpoint::Current, Location::City("Kyiv".into())),
                (Endpoint::Forecast, Location::Coordinates { lat: 0.0, lon: 0.0 }),
            ]
        );
    }

    #[tokio::test]
    async fn provider_payload_passes_through() {
        let relay = relay_with(Arc::new(RecordingProvider::default()));

        let payload = relay.resolve(&WeatherQuery::city("Rome")).await.unwrap();
        assert_eq!(payload, json!({ "endpoint": "weather", "location": "'Rome'" }));
    }

    #[tokio::test]
    async fn provider_failure_passes_through() {
        let provider =
            Arc::new(RecordingProvider { fail_with: Some(StatusCode::NOT_FOUND), ..Default::default() });
        let relay = relay_with(provider);

        let err = relay.resolve_forecast(&WeatherQuery::city("Atlantis")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "nope");
    }

    #[tokio::test]
    async fn concurrent_calls_do_not_interfere() {
        let relay = relay_with(Arc::new(RecordingProvider::default()));

        let tokyo = WeatherQuery::city("Tokyo");
        let sydney = WeatherQuery::coordinates(-33.9, 151.2);

        let (a, b) = tokio::join!(relay.resolve(&tokyo), relay.resolve_forecast(&sydney));

        assert_eq!(a.unwrap()["location"], "'Tokyo'");
        let b = b.unwrap();
        assert_eq!(b["endpoint"], "forecast");
        assert_eq!(b["location"], "(-33.9, 151.2)");
    }
}
