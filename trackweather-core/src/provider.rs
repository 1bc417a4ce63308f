use crate::{
    config::Config,
    forecast::ForecastSample,
    model::{Coordinate, CurrentWeather},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub mod openweather;

/// What can go wrong talking to the remote weather API.
///
/// The repository layer maps these onto the user-visible messages, so the
/// variants distinguish exactly the cases that message mapping needs.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Network(#[from] reqwest::Error),
}

/// Remote source of weather data for a coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(
        &self,
        coordinate: &Coordinate,
    ) -> Result<CurrentWeather, ProviderError>;

    async fn forecast_samples(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<ForecastSample>, ProviderError>;
}

/// Construct the provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = config.api_key.as_deref().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
             Hint: run `trackweather configure` and enter your OpenWeather API key."
        )
    })?;

    Ok(OpenWeatherProvider::new(
        api_key.to_owned(),
        config.base_url.clone(),
    ))
}
