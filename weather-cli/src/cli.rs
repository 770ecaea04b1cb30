use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, InquireError, Text};
use std::sync::Arc;
use tracing::debug;
use weather_core::{
    CityQuery, Config, ErrorKind, ForecastProvider, SearchOutcome, ViewUpdate, WeatherError,
    WeatherView, provider_from_config, search_city,
};

use crate::{autocomplete::CityAutocomplete, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Log requests and responses to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the default city and lookup preferences.
    Configure,

    /// Show current conditions, highlights, hourly and 7-day forecast for a city.
    Show {
        /// City name; the configured default city when omitted.
        city: Option<String>,

        /// Print the normalized snapshot as JSON instead.
        #[arg(long)]
        json: bool,
    },

    /// List cities matching a partial name.
    Suggest {
        /// Beginning of a city name.
        text: String,
    },

    /// Search repeatedly with autocomplete, starting from the default city.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Show { city, json } => {
                let city = city.unwrap_or_else(|| config.default_city.clone());
                show(&config, &city, json).await
            }
            Command::Suggest { text } => suggest(&config, &text).await,
            Command::Interactive => interactive(config).await,
        }
    }
}

async fn show(config: &Config, city: &str, json: bool) -> anyhow::Result<()> {
    let query = CityQuery::parse(city).ok_or_else(|| anyhow!("City name must not be empty"))?;
    let provider = provider_from_config(config)?;

    let outcome = search_city(provider.as_ref(), &query)
        .await
        .context("Error fetching weather. Please try again later.")?;

    let SearchOutcome::Found(snapshot) = outcome else {
        bail!("City not found: '{query}'. Please check the city name and try again.");
    };

    if json {
        let out = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize weather snapshot")?;
        println!("{out}");
    } else {
        print!("{}", render::snapshot(&snapshot));
    }

    Ok(())
}

async fn suggest(config: &Config, text: &str) -> anyhow::Result<()> {
    let Some(query) = CityQuery::parse(text).filter(|q| q.char_len() >= config.suggestion_min_chars)
    else {
        println!(
            "Type at least {} characters to get suggestions.",
            config.suggestion_min_chars
        );
        return Ok(());
    };

    let provider = provider_from_config(config)?;
    let suggestions = provider
        .suggest(&query, config.suggestion_limit)
        .await
        .context("Failed to look up city suggestions")?;

    if suggestions.is_empty() {
        println!("No cities found");
    }
    for s in suggestions {
        println!("{}", s.label());
    }

    Ok(())
}

async fn interactive(config: Config) -> anyhow::Result<()> {
    let provider: Arc<dyn ForecastProvider> = Arc::from(provider_from_config(&config)?);
    let (completer, debounce_task) = CityAutocomplete::spawn(provider.clone(), &config);
    let mut view = WeatherView::new();

    let mut next = Some(config.default_city.clone());

    loop {
        let input = match next.take() {
            Some(city) => city,
            None => match prompt_city(completer.clone()).await? {
                Some(city) => city,
                None => break,
            },
        };

        let ticket = view.begin_search();
        let Some(result) = search_input(provider.as_ref(), &completer, &input).await else {
            break;
        };

        match view.apply(ticket, result) {
            ViewUpdate::Replaced => {
                if let Some(snapshot) = view.snapshot() {
                    print!("{}", render::snapshot(snapshot));
                }
            }
            ViewUpdate::NotFound => {
                eprintln!("City not found. Please check the city name and try again.");
            }
            ViewUpdate::Failed(ErrorKind::Network) => {
                eprintln!("Error fetching weather. Please check your connection and try again.");
            }
            ViewUpdate::Failed(ErrorKind::Parse) => {
                eprintln!("Error fetching weather. The service returned unexpected data.");
            }
            ViewUpdate::Superseded => debug!("Search result superseded by a newer search"),
        }
    }

    drop(completer);
    debounce_task.abort();
    Ok(())
}

/// A picked suggestion is fetched for its exact location; anything else typed
/// is resolved as a city name. `None` for blank input.
async fn search_input(
    provider: &dyn ForecastProvider,
    completer: &CityAutocomplete,
    input: &str,
) -> Option<Result<SearchOutcome, WeatherError>> {
    if let Some(location) = completer.location_for(input) {
        debug!("Using selected suggestion {input}");
        return Some(provider.fetch_snapshot(location).await.map(SearchOutcome::Found));
    }

    let query = CityQuery::parse(input)?;
    Some(search_city(provider, &query).await)
}

/// `None` when the user leaves the prompt empty, presses Esc or Ctrl-C.
async fn prompt_city(completer: CityAutocomplete) -> anyhow::Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(move || {
        Text::new("City:")
            .with_autocomplete(completer)
            .with_help_message("Enter to search, empty input or Esc to quit")
            .prompt()
    })
    .await
    .context("Prompt task panicked")?;

    match answer {
        Ok(city) if city.trim().is_empty() => Ok(None),
        Ok(city) => Ok(Some(city)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e).context("Failed to read city"),
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let current_city = config.default_city.clone();
    config.default_city = Text::new("Default city:")
        .with_default(&current_city)
        .prompt()
        .context("Failed to read default city")?
        .trim()
        .to_string();

    config.request_timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.request_timeout_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()
        .context("Failed to read request timeout")?;

    config.suggestion_limit = CustomType::<usize>::new("Number of suggestions:")
        .with_default(config.suggestion_limit)
        .with_error_message("Please enter a whole number")
        .prompt()
        .context("Failed to read suggestion limit")?;

    config.suggestion_min_chars = CustomType::<usize>::new("Minimum characters before suggesting:")
        .with_default(config.suggestion_min_chars)
        .with_error_message("Please enter a whole number")
        .prompt()
        .context("Failed to read suggestion threshold")?;

    config.debounce_ms = CustomType::<u64>::new("Suggestion delay (milliseconds):")
        .with_default(config.debounce_ms)
        .with_error_message("Please enter a whole number of milliseconds")
        .prompt()
        .context("Failed to read suggestion delay")?;

    config.validate()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use inquire::Autocomplete;
    use std::{sync::Mutex, time::Duration};
    use weather_core::{CurrentConditions, Forecast, Location, Suggestion};

    /// Two cities named Springfield; records which coordinates were fetched.
    #[derive(Debug, Default)]
    struct Springfields {
        fetched: Mutex<Vec<f64>>,
    }

    #[async_trait]
    impl ForecastProvider for Springfields {
        async fn suggest(
            &self,
            _query: &CityQuery,
            max_results: usize,
        ) -> Result<Vec<Suggestion>, WeatherError> {
            let found = [("Illinois", 39.8), ("Missouri", 37.2)]
                .into_iter()
                .map(|(region, latitude)| Suggestion {
                    location: Location {
                        name: "Springfield".into(),
                        country: "United States".into(),
                        latitude,
                        longitude: -90.0,
                    },
                    region: Some(region.into()),
                })
                .take(max_results)
                .collect();
            Ok(found)
        }

        async fn fetch_forecast(
            &self,
            latitude: f64,
            _longitude: f64,
        ) -> Result<Forecast, WeatherError> {
            self.fetched.lock().unwrap().push(latitude);
            Ok(Forecast {
                current: CurrentConditions {
                    observed_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                        .unwrap()
                        .and_hms_opt(12, 0, 0)
                        .unwrap(),
                    temperature: 3,
                    feels_like: 0,
                    condition: "Overcast".into(),
                    wind_speed: 10,
                    humidity: 70,
                    pressure: 1015,
                    visibility: 10,
                },
                daily: Vec::new(),
                hourly: Vec::new(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn picked_suggestion_fetches_its_own_coordinates() {
        let provider = Arc::new(Springfields::default());
        let (mut completer, _task) = CityAutocomplete::spawn(provider.clone(), &Config::default());

        completer.get_suggestions("Springfield").unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let outcome = search_input(
            provider.as_ref(),
            &completer,
            "Springfield, Missouri, United States",
        )
        .await
        .unwrap()
        .unwrap();

        let SearchOutcome::Found(snapshot) = outcome else {
            panic!("expected a snapshot");
        };
        assert_eq!(snapshot.location.latitude, 37.2);
        assert_eq!(*provider.fetched.lock().unwrap(), vec![37.2]);
    }

    #[tokio::test(start_paused = true)]
    async fn typed_name_resolves_best_match() {
        let provider = Arc::new(Springfields::default());
        let (completer, _task) = CityAutocomplete::spawn(provider.clone(), &Config::default());

        let outcome = search_input(provider.as_ref(), &completer, " Springfield ")
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(outcome, SearchOutcome::Found(_)));
        assert_eq!(*provider.fetched.lock().unwrap(), vec![39.8]);
        assert!(search_input(provider.as_ref(), &completer, "   ").await.is_none());
    }
}
