use serde::Deserialize;

use crate::error::RelayError;

/// Raw query-string parameters as they arrive on `/api/weather` and `/api/forecast`.
///
/// Kept as strings so that a malformed number is reported as such instead of
/// silently being treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub city: Option<String>,
}

/// A validated-for-type inbound query.
///
/// A field is `Some` when the caller supplied it, whatever its value:
/// `0.0` is a perfectly good latitude.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
}

/// What the upstream request is keyed by.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Coordinates { lat: f64, lon: f64 },
    City(String),
}

/// Upstream endpoint selected by the public operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    /// Path segment under the provider's base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

impl WeatherQuery {
    pub fn coordinates(lat: f64, lon: f64) -> Self {
        Self { latitude: Some(lat), longitude: Some(lon), city: None }
    }

    pub fn city(city: impl Into<String>) -> Self {
        Self { city: Some(city.into()), ..Self::default() }
    }

    /// Pick what the upstream request is keyed by.
    ///
    /// Coordinates win when both are present, otherwise the city is used.
    /// Neither is a client error.
    pub fn location(&self) -> Result<Location, RelayError> {
        match (self.latitude, self.longitude, &self.city) {
            (Some(lat), Some(lon), _) => Ok(Location::Coordinates { lat, lon }),
            (_, _, Some(city)) => Ok(Location::City(city.clone())),
            _ => Err(RelayError::MissingLocation),
        }
    }
}

impl TryFrom<QueryParams> for WeatherQuery {
    type Error = RelayError;

    fn try_from(params: QueryParams) -> Result<Self, Self::Error> {
        Ok(Self {
            latitude: parse_coordinate("lat", params.lat)?,
            longitude: parse_coordinate("lon", params.lon)?,
            city: params.city,
        })
    }
}

impl Location {
    /// Query pairs identifying this location to the provider.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Location::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
            Location::City(city) => vec![("q", city.clone())],
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Coordinates { lat, lon } => write!(f, "({lat}, {lon})"),
            Location::City(city) => write!(f, "'{city}'"),
        }
    }
}

fn parse_coordinate(name: &'static str, raw: Option<String>) -> Result<Option<f64>, RelayError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(RelayError::InvalidParameter { name, value: raw }),
    }
}
