use crate::{
    Config, CityQuery, Forecast, Location, Suggestion, WeatherError, WeatherSnapshot,
    provider::open_meteo::OpenMeteoProvider,
};
use anyhow::Context;
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod open_meteo;

/// A source of geocoding and forecast data.
///
/// Implementations own the provider's wire format; everything they return is
/// already in the crate's data model.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Up to `max_results` candidates for `query`, best match first.
    ///
    /// No match is `Ok(vec![])`, not an error.
    async fn suggest(
        &self,
        query: &CityQuery,
        max_results: usize,
    ) -> Result<Vec<Suggestion>, WeatherError>;

    /// Normalized current, hourly and daily weather at the given coordinates.
    async fn fetch_forecast(&self, latitude: f64, longitude: f64)
    -> Result<Forecast, WeatherError>;

    async fn resolve_location(
        &self,
        query: &CityQuery,
        max_results: usize,
    ) -> Result<Vec<Location>, WeatherError> {
        let suggestions = self.suggest(query, max_results).await?;
        Ok(suggestions.into_iter().map(|s| s.location).collect())
    }

    /// Fetch a fresh snapshot for an already resolved location.
    async fn fetch_snapshot(&self, location: Location) -> Result<WeatherSnapshot, WeatherError> {
        let forecast = self
            .fetch_forecast(location.latitude, location.longitude)
            .await?;
        Ok(WeatherSnapshot::new(location, forecast))
    }
}

/// Construct the Open-Meteo provider using the timeout from `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let provider =
        OpenMeteoProvider::new(timeout).context("Failed to initialise the HTTP client")?;

    Ok(Box::new(provider))
}
