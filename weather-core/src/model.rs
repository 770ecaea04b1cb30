use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Free-text city query, trimmed and known to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery(String);

impl CityQuery {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters, used for the suggestion threshold.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for CityQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A geocoding candidate shown while the user is still typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub location: Location,
    /// First-level subdivision (state, region), only used to tell candidates apart.
    pub region: Option<String>,
}

impl Suggestion {
    /// "Springfield, Illinois, United States"
    pub fn label(&self) -> String {
        match self.region.as_deref().filter(|r| !r.is_empty()) {
            Some(region) => format!(
                "{}, {}, {}",
                self.location.name, region, self.location.country
            ),
            None => format!("{}, {}", self.location.name, self.location.country),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub observed_at: NaiveDateTime,
    /// Degrees Celsius.
    pub temperature: i32,
    pub feels_like: i32,
    pub condition: String,
    /// km/h
    pub wind_speed: u32,
    /// Percent.
    pub humidity: u8,
    /// hPa, mean sea level.
    pub pressure: u32,
    /// Kilometres.
    pub visibility: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub max_temp: i32,
    pub min_temp: i32,
    pub condition: String,
    pub precipitation_probability: u8,
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyEntry {
    pub time: NaiveDateTime,
    pub temperature: i32,
    pub condition: String,
    pub precipitation_probability: u8,
    pub wind_speed: u32,
}

/// Normalized forecast for a pair of coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forecast {
    pub current: CurrentConditions,
    /// Chronological, as many days as the provider returned.
    pub daily: Vec<DailyEntry>,
    /// Chronological, at most [`Forecast::HOURLY_LIMIT`] entries.
    pub hourly: Vec<HourlyEntry>,
}

impl Forecast {
    pub const HOURLY_LIMIT: usize = 24;
}

/// Everything displayed for one successful search.
///
/// Never updated in place: a new search produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub current: CurrentConditions,
    pub daily: Vec<DailyEntry>,
    pub hourly: Vec<HourlyEntry>,
}

impl WeatherSnapshot {
    pub const DISPLAY_DAYS: usize = 7;

    pub fn new(location: Location, forecast: Forecast) -> Self {
        let Forecast {
            current,
            daily,
            hourly,
        } = forecast;

        Self {
            location,
            current,
            daily,
            hourly,
        }
    }

    /// The days a 7-day view shows.
    pub fn week(&self) -> &[DailyEntry] {
        &self.daily[..self.daily.len().min(Self::DISPLAY_DAYS)]
    }

    pub fn today(&self) -> Option<&DailyEntry> {
        self.daily.first()
    }
}
