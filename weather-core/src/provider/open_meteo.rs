use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    codes::describe_code,
    error::{WeatherError, truncate_body},
    model::{
        CityQuery, CurrentConditions, DailyEntry, Forecast, HourlyEntry, Location, Suggestion,
    },
};

use super::ForecastProvider;

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const GEOCODING: &str = "geocoding";
const FORECAST: &str = "forecast";

const USER_AGENT: &str = concat!("weather-cli/", env!("CARGO_PKG_VERSION"));

/// The geocoder refuses counts above this.
const MAX_GEOCODING_COUNT: usize = 100;

const CURRENT_FIELDS: &str =
    "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,pressure_msl,wind_speed_10m";
const HOURLY_FIELDS: &str =
    "temperature_2m,weather_code,precipitation_probability,visibility,wind_speed_10m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset,\
                            precipitation_probability_mean";

/// Used when the provider reports no visibility, in metres.
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl OpenMeteoProvider {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Self::with_endpoints(GEOCODING_URL, FORECAST_URL, timeout)
    }

    /// Point the provider at other hosts, e.g. a local mock server.
    pub fn with_endpoints(
        geocoding_url: impl Into<String>,
        forecast_url: impl Into<String>,
        timeout: Duration,
    ) -> reqwest::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            geocoding_url: geocoding_url.into(),
            forecast_url: forecast_url.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| WeatherError::Network { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| WeatherError::Network { endpoint, source })?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| WeatherError::parse(endpoint, e.to_string()))
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn suggest(
        &self,
        query: &CityQuery,
        max_results: usize,
    ) -> Result<Vec<Suggestion>, WeatherError> {
        let count = max_results.clamp(1, MAX_GEOCODING_COUNT);
        debug!(query = %query, count, "geocoding request");

        let parsed: GeoResponse = self
            .get_json(
                GEOCODING,
                &self.geocoding_url,
                &[
                    ("name", query.as_str().to_string()),
                    ("count", count.to_string()),
                    ("language", "en".to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        let suggestions: Vec<Suggestion> = parsed
            .results
            .into_iter()
            .take(count)
            .map(Suggestion::from)
            .collect();

        info!(query = %query, matches = suggestions.len(), "geocoding finished");
        Ok(suggestions)
    }

    async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Forecast, WeatherError> {
        debug!(latitude, longitude, "forecast request");

        let raw: OmForecastResponse = self
            .get_json(
                FORECAST,
                &self.forecast_url,
                &[
                    ("latitude", latitude.to_string()),
                    ("longitude", longitude.to_string()),
                    ("current", CURRENT_FIELDS.to_string()),
                    ("hourly", HOURLY_FIELDS.to_string()),
                    ("daily", DAILY_FIELDS.to_string()),
                    ("timezone", "auto".to_string()),
                ],
            )
            .await?;

        let forecast = normalize(raw)?;
        info!(
            latitude,
            longitude,
            days = forecast.daily.len(),
            hours = forecast.hourly.len(),
            "forecast normalized"
        );
        Ok(forecast)
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    /// Absent when nothing matched.
    #[serde(default)]
    results: Vec<GeoResult>,
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: String,
    #[serde(default)]
    country: String,
    latitude: f64,
    longitude: f64,
    admin1: Option<String>,
}

impl From<GeoResult> for Suggestion {
    fn from(r: GeoResult) -> Self {
        Suggestion {
            location: Location {
                name: r.name,
                country: r.country,
                latitude: r.latitude,
                longitude: r.longitude,
            },
            region: r.admin1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current: Option<OmCurrent>,
    hourly: Option<OmHourly>,
    daily: Option<OmDaily>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: String,
    temperature_2m: f64,
    apparent_temperature: f64,
    weather_code: i64,
    wind_speed_10m: f64,
    relative_humidity_2m: u8,
    pressure_msl: f64,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    weather_code: Vec<i64>,
    wind_speed_10m: Vec<f64>,
    #[serde(default)]
    precipitation_probability: Option<Vec<Option<f64>>>,
    #[serde(default)]
    visibility: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    weather_code: Vec<i64>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    sunrise: Vec<String>,
    sunset: Vec<String>,
    #[serde(default)]
    precipitation_probability_mean: Option<Vec<Option<f64>>>,
}

fn normalize(raw: OmForecastResponse) -> Result<Forecast, WeatherError> {
    let current = raw.current.ok_or_else(|| missing_block("current"))?;
    let hourly = raw.hourly.ok_or_else(|| missing_block("hourly"))?;
    let daily = raw.daily.ok_or_else(|| missing_block("daily"))?;

    let visibility_m = hourly
        .visibility
        .as_ref()
        .and_then(|v| v.first().copied().flatten())
        .unwrap_or(DEFAULT_VISIBILITY_M);

    let current = CurrentConditions {
        observed_at: parse_timestamp("current.time", &current.time)?,
        temperature: round_i32(current.temperature_2m),
        feels_like: round_i32(current.apparent_temperature),
        condition: describe_code(current.weather_code).to_string(),
        wind_speed: round_u32(current.wind_speed_10m),
        humidity: current.relative_humidity_2m,
        pressure: round_u32(current.pressure_msl),
        visibility: round_u32(visibility_m / 1000.0),
    };

    Ok(Forecast {
        current,
        daily: normalize_daily(daily)?,
        hourly: normalize_hourly(hourly)?,
    })
}

fn normalize_hourly(h: OmHourly) -> Result<Vec<HourlyEntry>, WeatherError> {
    let len = h.time.len();
    check_aligned("hourly.temperature_2m", h.temperature_2m.len(), len)?;
    check_aligned("hourly.weather_code", h.weather_code.len(), len)?;
    check_aligned("hourly.wind_speed_10m", h.wind_speed_10m.len(), len)?;
    if let Some(p) = &h.precipitation_probability {
        check_aligned("hourly.precipitation_probability", p.len(), len)?;
    }
    if let Some(v) = &h.visibility {
        check_aligned("hourly.visibility", v.len(), len)?;
    }

    h.time
        .iter()
        .take(Forecast::HOURLY_LIMIT)
        .enumerate()
        .map(|(i, time)| -> Result<HourlyEntry, WeatherError> {
            Ok(HourlyEntry {
                time: parse_timestamp("hourly.time", time)?,
                temperature: round_i32(h.temperature_2m[i]),
                condition: describe_code(h.weather_code[i]).to_string(),
                precipitation_probability: percent(optional_at(&h.precipitation_probability, i)),
                wind_speed: round_u32(h.wind_speed_10m[i]),
            })
        })
        .collect()
}

fn normalize_daily(d: OmDaily) -> Result<Vec<DailyEntry>, WeatherError> {
    let len = d.time.len();
    check_aligned("daily.weather_code", d.weather_code.len(), len)?;
    check_aligned("daily.temperature_2m_max", d.temperature_2m_max.len(), len)?;
    check_aligned("daily.temperature_2m_min", d.temperature_2m_min.len(), len)?;
    check_aligned("daily.sunrise", d.sunrise.len(), len)?;
    check_aligned("daily.sunset", d.sunset.len(), len)?;
    if let Some(p) = &d.precipitation_probability_mean {
        check_aligned("daily.precipitation_probability_mean", p.len(), len)?;
    }

    d.time
        .iter()
        .enumerate()
        .map(|(i, date)| -> Result<DailyEntry, WeatherError> {
            Ok(DailyEntry {
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                    WeatherError::parse(FORECAST, format!("daily.time `{date}`: {e}"))
                })?,
                max_temp: round_i32(d.temperature_2m_max[i]),
                min_temp: round_i32(d.temperature_2m_min[i]),
                condition: describe_code(d.weather_code[i]).to_string(),
                precipitation_probability: percent(optional_at(
                    &d.precipitation_probability_mean,
                    i,
                )),
                sunrise: parse_timestamp("daily.sunrise", &d.sunrise[i])?,
                sunset: parse_timestamp("daily.sunset", &d.sunset[i])?,
            })
        })
        .collect()
}

fn missing_block(name: &str) -> WeatherError {
    WeatherError::parse(FORECAST, format!("missing `{name}` block"))
}

fn check_aligned(field: &str, actual: usize, expected: usize) -> Result<(), WeatherError> {
    if actual == expected {
        Ok(())
    } else {
        Err(WeatherError::parse(
            FORECAST,
            format!("{field} has {actual} values for {expected} timestamps"),
        ))
    }
}

fn optional_at(values: &Option<Vec<Option<f64>>>, i: usize) -> Option<f64> {
    values.as_ref().and_then(|v| v.get(i).copied().flatten())
}

/// Open-Meteo emits `2024-01-15T07:15`; seconds are accepted too.
fn parse_timestamp(field: &str, raw: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| WeatherError::parse(FORECAST, format!("{field} `{raw}`: {e}")))
}

// f64::round rounds half away from zero; `as` saturates at the integer bounds.
fn round_i32(v: f64) -> i32 {
    v.round() as i32
}

fn round_u32(v: f64) -> u32 {
    v.round() as u32
}

fn percent(v: Option<f64>) -> u8 {
    v.unwrap_or(0.0).round().clamp(0.0, 100.0) as u8
}
