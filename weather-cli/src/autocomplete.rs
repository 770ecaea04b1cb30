use inquire::{CustomUserError, autocompletion::Replacement};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU64, Ordering},
};
use tokio::task::JoinHandle;
use tracing::debug;
use weather_core::{CityQuery, Config, Debouncer, ForecastProvider, Location, Suggestion};

/// City autocomplete for the interactive prompt.
///
/// Keystrokes are pushed through a [`Debouncer`]; lookups run on the tokio
/// runtime. Every pushed query carries a sequence number and a finished lookup
/// only replaces the list when it belongs to a newer query than the one shown.
#[derive(Debug, Clone)]
pub struct CityAutocomplete {
    debouncer: Debouncer<(u64, CityQuery)>,
    typed: Arc<AtomicU64>,
    shown: Arc<Mutex<Shown>>,
    min_chars: usize,
}

#[derive(Debug, Default)]
struct Shown {
    seq: u64,
    suggestions: Vec<Suggestion>,
}

impl Shown {
    /// False when `seq` is older than what is already displayed.
    fn replace(&mut self, seq: u64, suggestions: Vec<Suggestion>) -> bool {
        if seq < self.seq {
            return false;
        }
        self.seq = seq;
        self.suggestions = suggestions;
        true
    }
}

impl CityAutocomplete {
    pub fn spawn(provider: Arc<dyn ForecastProvider>, config: &Config) -> (Self, JoinHandle<()>) {
        let shown = Arc::new(Mutex::new(Shown::default()));
        let limit = config.suggestion_limit;

        let slot = shown.clone();
        let (debouncer, task) =
            Debouncer::spawn(config.debounce(), move |(seq, query): (u64, CityQuery)| {
                let provider = provider.clone();
                let slot = slot.clone();
                async move {
                    match provider.suggest(&query, limit).await {
                        Ok(found) => {
                            if let Ok(mut shown) = slot.lock() {
                                if !shown.replace(seq, found) {
                                    debug!(seq, "Dropping suggestions for superseded query '{query}'");
                                }
                            }
                        }
                        Err(err) => debug!("Suggestion lookup for '{query}' failed: {err}"),
                    }
                }
            });

        let completer = Self {
            debouncer,
            typed: Arc::new(AtomicU64::new(0)),
            shown,
            min_chars: config.suggestion_min_chars,
        };
        (completer, task)
    }

    /// The location behind a submitted suggestion label, if it is one.
    pub fn location_for(&self, input: &str) -> Option<Location> {
        self.current()
            .into_iter()
            .find(|s| s.label() == input)
            .map(|s| s.location)
    }

    fn current(&self) -> Vec<Suggestion> {
        self.shown
            .lock()
            .map(|shown| shown.suggestions.clone())
            .unwrap_or_default()
    }
}

impl inquire::Autocomplete for CityAutocomplete {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        let Some(query) = CityQuery::parse(input).filter(|q| q.char_len() >= self.min_chars)
        else {
            return Ok(Vec::new());
        };

        let seq = self.typed.fetch_add(1, Ordering::SeqCst) + 1;
        self.debouncer.push((seq, query));
        Ok(self.current().iter().map(Suggestion::label).collect())
    }

    /// Completing keeps the full label so the exact candidate can be looked up.
    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}
