//! Core library for the `weather-relay` service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Inbound query model and the upstream location policy
//! - Abstraction over the upstream weather provider
//! - The relay itself, mapping upstream outcomes to client-facing ones
//!
//! It is used by the `weather-relay` binary, but can also be embedded in other services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod relay;

pub use config::{Config, RelaySettings, ServerConfig, UpstreamConfig};
pub use error::{Outcome, RelayError};
pub use model::{Endpoint, Location, QueryParams, WeatherQuery};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use relay::WeatherRelay;
