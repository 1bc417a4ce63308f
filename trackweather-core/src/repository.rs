//! Cache-then-network refresh flow for current weather and forecast.
//!
//! Each fetch operation produces a short, cold sequence of [`Resource`]
//! events over a channel: an optional `Loading`, then exactly one terminal
//! `Success` or `Error`. Closing the channel signals completion. Successful
//! payloads are written to the cache before `Success` is emitted, so the
//! live cache views and the result sequence never disagree.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::{
    cache::WeatherCache,
    connectivity::NetworkMonitor,
    forecast::group_by_day,
    model::{Coordinate, CurrentWeather, DailyForecast, Resource, WeatherForecast},
    provider::{ProviderError, WeatherProvider},
};

const NOT_CONNECTED: &str = "Not connected to the internet";
const WEATHER_FETCH_FAILED: &str = "Failed to fetch weather data";
const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

const CHANNEL_CAPACITY: usize = 4;

/// Orchestrates fetches: connectivity gate, one network call, cache write,
/// tri-state result sequence.
///
/// All collaborators are injected; the repository owns no global state.
pub struct WeatherRepository {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<WeatherCache>,
    monitor: Arc<dyn NetworkMonitor>,
}

impl WeatherRepository {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        cache: Arc<WeatherCache>,
        monitor: Arc<dyn NetworkMonitor>,
    ) -> Self {
        Self {
            provider,
            cache,
            monitor,
        }
    }

    /// Fetch current weather for `coordinate`.
    ///
    /// Every call performs a fresh fetch; nothing is memoized. Dropping the
    /// receiver abandons the in-flight sequence.
    pub fn fetch_current_weather(
        &self,
        coordinate: Coordinate,
    ) -> mpsc::Receiver<Resource<CurrentWeather>> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let monitor = Arc::clone(&self.monitor);

        tokio::spawn(async move {
            if !monitor.is_connected().await {
                let _ = tx.send(Resource::Error(NOT_CONNECTED.to_string())).await;
                return;
            }

            if tx.send(Resource::Loading).await.is_err() {
                return;
            }

            let terminal = match provider.current_weather(&coordinate).await {
                Ok(weather) => match cache.replace_current(&weather) {
                    Ok(()) => Resource::Success(weather),
                    Err(e) => Resource::Error(fault_message(&e.to_string())),
                },
                Err(err) => {
                    tracing::warn!(error = %err, "current weather fetch failed");
                    Resource::Error(match err {
                        ProviderError::Status { .. } | ProviderError::Decode(_) => {
                            WEATHER_FETCH_FAILED.to_string()
                        }
                        ProviderError::Network(e) => fault_message(&e.to_string()),
                    })
                }
            };

            let _ = tx.send(terminal).await;
        });

        rx
    }

    /// Fetch the forecast for `coordinate`, aggregated into daily summaries.
    pub fn fetch_forecast(
        &self,
        coordinate: Coordinate,
    ) -> mpsc::Receiver<Resource<WeatherForecast>> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let monitor = Arc::clone(&self.monitor);

        tokio::spawn(async move {
            if !monitor.is_connected().await {
                let _ = tx.send(Resource::Error(NOT_CONNECTED.to_string())).await;
                return;
            }

            if tx.send(Resource::Loading).await.is_err() {
                return;
            }

            let terminal = match provider.forecast_samples(&coordinate).await {
                Ok(samples) => {
                    let forecast = WeatherForecast {
                        daily: group_by_day(&samples),
                    };
                    match cache.replace_forecast(&forecast.daily) {
                        Ok(()) => Resource::Success(forecast),
                        Err(e) => Resource::Error(fault_message(&e.to_string())),
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "forecast fetch failed");
                    Resource::Error(match err {
                        // This path surfaces the generic message, not the
                        // weather-specific one.
                        ProviderError::Status { .. } | ProviderError::Decode(_) => {
                            UNEXPECTED_ERROR.to_string()
                        }
                        ProviderError::Network(e) => fault_message(&e.to_string()),
                    })
                }
            };

            let _ = tx.send(terminal).await;
        });

        rx
    }

    /// Live view over the cached current weather.
    pub fn cached_current_weather(&self) -> watch::Receiver<Option<CurrentWeather>> {
        self.cache.watch_current()
    }

    /// Live view over the cached daily forecast.
    pub fn cached_forecast(&self) -> watch::Receiver<Vec<DailyForecast>> {
        self.cache.watch_forecast()
    }
}

fn fault_message(message: &str) -> String {
    if message.is_empty() {
        UNEXPECTED_ERROR.to_string()
    } else {
        message.to_string()
    }
}
