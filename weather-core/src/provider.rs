use crate::{
    error::Outcome,
    model::{Endpoint, Location},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// The upstream weather service, as seen by the relay.
///
/// Implementations perform exactly one outbound call per `fetch` and map
/// whatever happens to an [`Outcome`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, endpoint: Endpoint, location: &Location) -> Outcome;
}
