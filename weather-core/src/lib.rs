//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - City resolution and forecast normalization against Open-Meteo
//! - The normalized weather data model and WMO condition table
//! - Search sequencing and suggestion debouncing for interactive front ends
//! - Configuration handling
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod codes;
pub mod config;
pub mod debounce;
pub mod error;
pub mod model;
pub mod provider;
pub mod search;

pub use codes::describe_code;
pub use config::Config;
pub use debounce::Debouncer;
pub use error::{ErrorKind, WeatherError};
pub use model::{
    CityQuery, CurrentConditions, DailyEntry, Forecast, HourlyEntry, Location, Suggestion,
    WeatherSnapshot,
};
pub use provider::{ForecastProvider, open_meteo::OpenMeteoProvider, provider_from_config};
pub use search::{SearchOutcome, SearchTicket, ViewUpdate, WeatherView, search_city};
