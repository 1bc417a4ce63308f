use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use trackweather_core::{
    Config, Coordinate, CurrentWeather, DailyForecast, Resource, TcpProbe, WeatherCache,
    WeatherRepository, WeatherUiState, WeatherViewModel, provider_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "trackweather", version, about = "Weather tracking CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key.
    Configure,

    /// Show current weather and the 5-day forecast for a coordinate.
    Show {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Optional city name to show alongside the coordinate.
        #[arg(long)]
        city: Option<String>,
    },

    /// Keep the display fresh: refresh on an interval, re-render on change.
    Watch {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Optional city name to show alongside the coordinate.
        #[arg(long)]
        city: Option<String>,

        /// Minutes between refreshes.
        #[arg(long, default_value_t = 10)]
        interval_mins: u64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                latitude,
                longitude,
                city,
            } => show(coordinate(latitude, longitude, city)).await,
            Command::Watch {
                latitude,
                longitude,
                city,
                interval_mins,
            } => watch(coordinate(latitude, longitude, city), interval_mins).await,
        }
    }
}

fn coordinate(latitude: f64, longitude: f64, city: Option<String>) -> Coordinate {
    Coordinate {
        latitude,
        longitude,
        city_name: city,
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key);
    config.save()?;

    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn build_repository(config: &Config) -> Result<WeatherRepository> {
    let provider = provider_from_config(config)?;
    let cache = WeatherCache::new(Config::database_path()?)?;
    let monitor = TcpProbe::for_base_url(&config.base_url);

    Ok(WeatherRepository::new(
        Arc::new(provider),
        Arc::new(cache),
        Arc::new(monitor),
    ))
}

async fn show(coordinate: Coordinate) -> Result<()> {
    let config = Config::load()?;
    let repository = build_repository(&config)?;

    let weather_rx = repository.fetch_current_weather(coordinate.clone());
    let forecast_rx = repository.fetch_forecast(coordinate);

    let (weather, forecast) = tokio::join!(terminal_result(weather_rx), terminal_result(forecast_rx));

    match weather {
        Ok(weather) => print_current(&weather),
        Err(message) => println!("Weather unavailable: {message}"),
    }

    println!();

    match forecast {
        Ok(forecast) => print_forecast(&forecast.daily),
        Err(message) => println!("Forecast unavailable: {message}"),
    }

    Ok(())
}

async fn watch(coordinate: Coordinate, interval_mins: u64) -> Result<()> {
    let config = Config::load()?;
    let repository = Arc::new(build_repository(&config)?);

    let mut vm = WeatherViewModel::new(repository);
    let mut state_rx = vm.subscribe();

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_mins.max(1) * 60));

    println!("Watching the weather; press Ctrl-C to stop.");

    loop {
        tokio::select! {
            _ = ticker.tick() => vm.refresh(coordinate.clone()),
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                render(&state);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// Drain one fetch sequence and keep its terminal result.
async fn terminal_result<T>(mut rx: mpsc::Receiver<Resource<T>>) -> std::result::Result<T, String> {
    let mut outcome = Err("An unexpected error occurred".to_string());
    while let Some(event) = rx.recv().await {
        match event {
            Resource::Loading => {}
            Resource::Success(value) => outcome = Ok(value),
            Resource::Error(message) => outcome = Err(message),
        }
    }
    outcome
}

fn render(state: &WeatherUiState) {
    println!();

    if state.is_loading {
        println!("Refreshing current weather...");
    }
    if let Some(error) = &state.error {
        println!("Weather unavailable: {error}");
    }
    if let Some(weather) = &state.weather {
        print_current(weather);
    }

    if state.is_forecast_loading {
        println!("Refreshing forecast...");
    }
    if let Some(error) = &state.forecast_error {
        println!("Forecast unavailable: {error}");
    }
    if let Some(forecast) = &state.forecast {
        print_forecast(&forecast.daily);
    }
}

fn print_current(weather: &CurrentWeather) {
    let city = if weather.city_name.is_empty() {
        format!("{:.2}, {:.2}", weather.latitude, weather.longitude)
    } else {
        weather.city_name.clone()
    };

    println!("{city} — {}", weather.description);
    println!(
        "  {}°C (feels like {}°C)",
        weather.display_temperature(),
        weather.display_feels_like()
    );
    println!(
        "  Humidity {}%  Pressure {} hPa  Wind {:.1} m/s",
        weather.humidity_pct, weather.pressure_hpa, weather.wind_speed_mps
    );

    if let Some(observed) = DateTime::from_timestamp_millis(weather.observed_at_ms) {
        println!(
            "  Observed {}",
            observed.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_forecast(daily: &[DailyForecast]) {
    if daily.is_empty() {
        println!("No forecast cached yet.");
        return;
    }

    for day in daily {
        let label = DateTime::from_timestamp(day.day_start, 0)
            .map(|start| start.with_timezone(&Local).format("%a %d %b").to_string())
            .unwrap_or_else(|| day.day_start.to_string());

        println!(
            "  {label}  {:>3}° / {:>3}°  {}",
            day.display_temp_min(),
            day.display_temp_max(),
            day.description
        );
    }
}
