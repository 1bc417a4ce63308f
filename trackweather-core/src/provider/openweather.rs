use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    forecast::{Condition, ForecastSample},
    model::{Coordinate, CurrentWeather},
};

use super::{ProviderError, WeatherProvider};

/// Public OpenWeather REST API, version 2.5.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        coordinate: &Coordinate,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::debug!(endpoint, status = status.as_u16(), "OpenWeather request failed");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(
        &self,
        coordinate: &Coordinate,
    ) -> Result<CurrentWeather, ProviderError> {
        let parsed: OwCurrentResponse = self.get_json("weather", coordinate).await?;

        let first = parsed.weather.first();

        Ok(CurrentWeather {
            id: first.map(|w| w.id).unwrap_or(0),
            city_name: parsed.name,
            description: first.map(|w| w.description.clone()).unwrap_or_default(),
            temperature_c: parsed.main.temp,
            feels_like_c: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            pressure_hpa: parsed.main.pressure,
            wind_speed_mps: parsed.wind.speed,
            icon_code: first.map(|w| w.icon.clone()).unwrap_or_default(),
            // The API reports epoch seconds; the domain keeps milliseconds.
            observed_at_ms: parsed.dt * 1000,
            latitude: parsed.coord.lat,
            longitude: parsed.coord.lon,
        })
    }

    async fn forecast_samples(
        &self,
        coordinate: &Coordinate,
    ) -> Result<Vec<ForecastSample>, ProviderError> {
        let parsed: OwForecastResponse = self.get_json("forecast", coordinate).await?;

        Ok(parsed
            .list
            .into_iter()
            .map(|entry| ForecastSample {
                timestamp: entry.dt,
                temp_min_c: entry.main.temp_min,
                temp_max_c: entry.main.temp_max,
                conditions: entry
                    .weather
                    .into_iter()
                    .map(|w| Condition {
                        id: w.id,
                        description: w.description,
                        icon_code: w.icon,
                    })
                    .collect(),
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    id: i64,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
    pressure: i32,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    weather: Vec<OwCondition>,
    main: OwMain,
    wind: OwWind,
    name: String,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}
