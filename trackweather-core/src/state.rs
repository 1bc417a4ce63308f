//! UI-facing state assembled from cache emissions and fetch sequences.
//!
//! Mirrors what a weather screen needs: the latest payloads, per-side
//! loading flags, and per-side error messages. Observers receive whole
//! [`WeatherUiState`] snapshots over a watch channel, so a reader never
//! sees a half-applied transition.

use std::sync::Arc;
use tokio::{sync::watch, task::JoinSet};

use crate::{
    model::{Coordinate, Resource, WeatherForecast, WeatherUiState},
    repository::WeatherRepository,
};

/// Holds and publishes the merged weather-screen state.
///
/// On creation it subscribes to both live cache views for its lifetime;
/// dropping the holder aborts every task it spawned (the `JoinSet` takes
/// care of in-flight loads too). Must be created inside a tokio runtime.
pub struct WeatherViewModel {
    repository: Arc<WeatherRepository>,
    state_tx: Arc<watch::Sender<WeatherUiState>>,
    tasks: JoinSet<()>,
}

impl WeatherViewModel {
    pub fn new(repository: Arc<WeatherRepository>) -> Self {
        let state_tx = Arc::new(watch::channel(WeatherUiState::default()).0);
        let mut tasks = JoinSet::new();

        // Cached weather: a stored record overwrites only the weather side.
        {
            let state_tx = Arc::clone(&state_tx);
            let mut rx = repository.cached_current_weather();
            tasks.spawn(async move {
                loop {
                    let cached = rx.borrow_and_update().clone();
                    if let Some(weather) = cached {
                        state_tx.send_modify(|state| {
                            state.weather = Some(weather);
                            state.is_loading = false;
                        });
                    }
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
            });
        }

        // Cached forecast: every emission overwrites the forecast side.
        {
            let state_tx = Arc::clone(&state_tx);
            let mut rx = repository.cached_forecast();
            tasks.spawn(async move {
                loop {
                    let daily = rx.borrow_and_update().clone();
                    state_tx.send_modify(|state| {
                        state.forecast = Some(WeatherForecast { daily });
                        state.is_forecast_loading = false;
                    });
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
            });
        }

        Self {
            repository,
            state_tx,
            tasks,
        }
    }

    /// Watch whole-state snapshots: the current one, then every change.
    pub fn subscribe(&self) -> watch::Receiver<WeatherUiState> {
        self.state_tx.subscribe()
    }

    /// The current state snapshot.
    pub fn state(&self) -> WeatherUiState {
        self.state_tx.borrow().clone()
    }

    /// Start a current-weather fetch and fold its events into the state.
    pub fn load_weather(&mut self, coordinate: Coordinate) {
        let mut rx = self.repository.fetch_current_weather(coordinate);
        let state_tx = Arc::clone(&self.state_tx);

        self.tasks.spawn(async move {
            while let Some(resource) = rx.recv().await {
                match resource {
                    Resource::Loading => state_tx.send_modify(|state| {
                        state.is_loading = true;
                        state.error = None;
                    }),
                    Resource::Success(weather) => state_tx.send_modify(|state| {
                        state.weather = Some(weather);
                        state.is_loading = false;
                        state.error = None;
                    }),
                    // Keep whatever is already displayed; only surface the
                    // message.
                    Resource::Error(message) => state_tx.send_modify(|state| {
                        state.is_loading = false;
                        state.error = Some(message);
                    }),
                }
            }
        });
    }

    /// Start a forecast fetch and fold its events into the state.
    pub fn load_forecast(&mut self, coordinate: Coordinate) {
        let mut rx = self.repository.fetch_forecast(coordinate);
        let state_tx = Arc::clone(&self.state_tx);

        self.tasks.spawn(async move {
            while let Some(resource) = rx.recv().await {
                match resource {
                    Resource::Loading => state_tx.send_modify(|state| {
                        state.is_forecast_loading = true;
                        state.forecast_error = None;
                    }),
                    Resource::Success(forecast) => state_tx.send_modify(|state| {
                        state.forecast = Some(forecast);
                        state.is_forecast_loading = false;
                        state.forecast_error = None;
                    }),
                    Resource::Error(message) => state_tx.send_modify(|state| {
                        state.is_forecast_loading = false;
                        state.forecast_error = Some(message);
                    }),
                }
            }
        });
    }

    /// Re-run both loads. Overlapping refreshes race; per side, the last
    /// terminal event wins.
    pub fn refresh(&mut self, coordinate: Coordinate) {
        self.load_weather(coordinate.clone());
        self.load_forecast(coordinate);
    }

    pub fn clear_error(&self) {
        self.state_tx.send_modify(|state| state.error = None);
    }

    pub fn clear_forecast_error(&self) {
        self.state_tx.send_modify(|state| state.forecast_error = None);
    }
}
