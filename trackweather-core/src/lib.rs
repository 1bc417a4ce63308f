//! Core library for the `trackweather` app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider and the connectivity check
//! - Shared domain models and the daily forecast aggregation
//! - The SQLite cache with live-update subscriptions
//! - The refresh repository and the UI-facing state holder
//!
//! It is used by `trackweather-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod connectivity;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod repository;
pub mod state;

pub use cache::WeatherCache;
pub use config::Config;
pub use connectivity::{NetworkMonitor, TcpProbe};
pub use forecast::{Condition, ForecastSample, group_by_day};
pub use model::{
    Coordinate, CurrentWeather, DailyForecast, Resource, WeatherForecast, WeatherUiState,
};
pub use provider::{ProviderError, WeatherProvider, provider_from_config};
pub use repository::WeatherRepository;
pub use state::WeatherViewModel;
