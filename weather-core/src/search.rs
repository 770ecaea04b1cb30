//! One search: resolve a city, then fetch its weather.
//!
//! [`WeatherView`] owns what is currently displayed and decides which search
//! results are allowed to replace it.

use tracing::{debug, info, warn};

use crate::{
    CityQuery, ForecastProvider, WeatherError, WeatherSnapshot,
    error::ErrorKind,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(WeatherSnapshot),
    /// The geocoder had no match for the query.
    NotFound,
}

/// Resolve `query` to its best match and fetch a fresh snapshot for it.
///
/// The forecast is only requested once resolution succeeded with a match.
pub async fn search_city(
    provider: &dyn ForecastProvider,
    query: &CityQuery,
) -> Result<SearchOutcome, WeatherError> {
    let Some(location) = provider.resolve_location(query, 1).await?.into_iter().next() else {
        info!(query = %query, "no city found");
        return Ok(SearchOutcome::NotFound);
    };

    debug!(
        "Resolved {query} to {}, {} ({:.4}, {:.4})",
        location.name, location.country, location.latitude, location.longitude
    );

    let snapshot = provider.fetch_snapshot(location).await?;
    Ok(SearchOutcome::Found(snapshot))
}

/// Identifies one search started through [`WeatherView::begin_search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

/// What applying a search result did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewUpdate {
    /// The snapshot was replaced wholesale.
    Replaced,
    /// No match; the previous snapshot, if any, is still shown.
    NotFound,
    /// The search failed; the previous snapshot, if any, is still shown.
    Failed(ErrorKind),
    /// A newer search was started after this one; the result was dropped.
    Superseded,
}

/// Display state: the snapshot on screen and the latest search issued.
#[derive(Debug, Default)]
pub struct WeatherView {
    snapshot: Option<WeatherSnapshot>,
    issued: u64,
}

impl WeatherView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    /// Start a search. Any ticket issued earlier becomes stale.
    pub fn begin_search(&mut self) -> SearchTicket {
        self.issued += 1;
        SearchTicket(self.issued)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        ticket.0 == self.issued
    }

    pub fn apply(
        &mut self,
        ticket: SearchTicket,
        result: Result<SearchOutcome, WeatherError>,
    ) -> ViewUpdate {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, latest = self.issued, "dropping superseded search result");
            return ViewUpdate::Superseded;
        }

        match result {
            Ok(SearchOutcome::Found(snapshot)) => {
                self.snapshot = Some(snapshot);
                ViewUpdate::Replaced
            }
            Ok(SearchOutcome::NotFound) => ViewUpdate::NotFound,
            Err(err) => {
                warn!("Search failed: {err}");
                ViewUpdate::Failed(err.kind())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Forecast, Location, Suggestion,
        model::CurrentConditions,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct StubProvider {
        matches: Vec<Suggestion>,
        fail_forecast: bool,
        forecast_calls: AtomicUsize,
    }

    #[async_trait]
    impl ForecastProvider for StubProvider {
        async fn suggest(
            &self,
            _query: &CityQuery,
            max_results: usize,
        ) -> Result<Vec<Suggestion>, WeatherError> {
            Ok(self.matches.iter().take(max_results).cloned().collect())
        }

        async fn fetch_forecast(
            &self,
            _latitude: f64,
            _longitude: f64,
        ) -> Result<Forecast, WeatherError> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_forecast {
                return Err(WeatherError::parse("forecast", "missing `daily` block"));
            }
            Ok(forecast(7))
        }
    }

    fn forecast(temperature: i32) -> Forecast {
        Forecast {
            current: CurrentConditions {
                observed_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                    .unwrap()
                    .and_hms_opt(12, 0, 0)
                    .unwrap(),
                temperature,
                feels_like: temperature - 3,
                condition: "Clear sky".into(),
                wind_speed: 5,
                humidity: 60,
                pressure: 1020,
                visibility: 10,
            },
            daily: Vec::new(),
            hourly: Vec::new(),
        }
    }

    fn location(name: &str) -> Location {
        Location {
            name: name.into(),
            country: "France".into(),
            latitude: 48.85,
            longitude: 2.35,
        }
    }

    fn snapshot(name: &str, temperature: i32) -> WeatherSnapshot {
        WeatherSnapshot::new(location(name), forecast(temperature))
    }

    fn query(s: &str) -> CityQuery {
        CityQuery::parse(s).unwrap()
    }

    #[tokio::test]
    async fn search_without_match_skips_forecast() {
        let provider = StubProvider::default();

        let outcome = search_city(&provider, &query("Atlantis")).await.unwrap();
        assert_eq!(outcome, SearchOutcome::NotFound);
        assert_eq!(provider.forecast_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_uses_best_match() {
        let provider = StubProvider {
            matches: vec![
                Suggestion {
                    location: location("Paris"),
                    region: None,
                },
                Suggestion {
                    location: location("Paris, TX"),
                    region: None,
                },
            ],
            ..Default::default()
        };

        let SearchOutcome::Found(snapshot) = search_city(&provider, &query("Paris")).await.unwrap()
        else {
            panic!("expected a snapshot");
        };
        assert_eq!(snapshot.location.name, "Paris");
        assert_eq!(snapshot.current.temperature, 7);
        assert_eq!(provider.forecast_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn search_surfaces_forecast_errors() {
        let provider = StubProvider {
            matches: vec![Suggestion {
                location: location("Paris"),
                region: None,
            }],
            fail_forecast: true,
            ..Default::default()
        };

        let err = search_city(&provider, &query("Paris")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn found_replaces_snapshot() {
        let mut view = WeatherView::new();
        let ticket = view.begin_search();

        let update = view.apply(ticket, Ok(SearchOutcome::Found(snapshot("Paris", 7))));
        assert_eq!(update, ViewUpdate::Replaced);
        assert_eq!(view.snapshot().unwrap().location.name, "Paris");
    }

    #[test]
    fn not_found_and_failure_keep_previous_snapshot() {
        let mut view = WeatherView::new();
        let first = view.begin_search();
        view.apply(first, Ok(SearchOutcome::Found(snapshot("Paris", 7))));

        let second = view.begin_search();
        assert_eq!(view.apply(second, Ok(SearchOutcome::NotFound)), ViewUpdate::NotFound);
        assert_eq!(view.snapshot().unwrap().location.name, "Paris");

        let third = view.begin_search();
        let update = view.apply(third, Err(WeatherError::parse("forecast", "truncated")));
        assert_eq!(update, ViewUpdate::Failed(ErrorKind::Parse));
        assert_eq!(view.snapshot().unwrap().current.temperature, 7);
    }

    #[test]
    fn late_result_from_older_search_is_dropped() {
        let mut view = WeatherView::new();
        let slow = view.begin_search();
        let fast = view.begin_search();

        assert_eq!(
            view.apply(fast, Ok(SearchOutcome::Found(snapshot("Berlin", 2)))),
            ViewUpdate::Replaced
        );
        assert_eq!(
            view.apply(slow, Ok(SearchOutcome::Found(snapshot("Paris", 7)))),
            ViewUpdate::Superseded
        );
        assert_eq!(view.snapshot().unwrap().location.name, "Berlin");
    }

    #[test]
    fn tickets_increase_monotonically() {
        let mut view = WeatherView::new();
        let a = view.begin_search();
        let b = view.begin_search();
        assert!(b > a);
        assert!(!view.is_current(a));
        assert!(view.is_current(b));
    }
}
