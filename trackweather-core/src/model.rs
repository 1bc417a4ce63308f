use serde::{Deserialize, Serialize};

/// A point the weather is fetched for, with an optional resolved city name.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub city_name: Option<String>,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            city_name: None,
        }
    }
}

/// The latest observed conditions for one location.
///
/// Exactly one instance is cached at a time; every successful fetch replaces
/// it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub id: i64,
    pub city_name: String,
    pub description: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: i32,
    pub wind_speed_mps: f64,
    pub icon_code: String,
    /// Observation time in epoch milliseconds.
    pub observed_at_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl CurrentWeather {
    /// Temperature as shown to the user, rounded half-up.
    pub fn display_temperature(&self) -> i32 {
        round_half_up(self.temperature_c)
    }

    pub fn display_feels_like(&self) -> i32 {
        round_half_up(self.feels_like_c)
    }
}

/// One calendar day summarized from the 3-hourly forecast samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    /// Start of the day (00:00 local time) in epoch seconds.
    pub day_start: i64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub description: String,
    pub icon_code: String,
}

impl DailyForecast {
    /// Displayed minimum is floored; the maximum is rounded half-up.
    /// The asymmetry is part of the display contract.
    pub fn display_temp_min(&self) -> i32 {
        self.temp_min_c.floor() as i32
    }

    pub fn display_temp_max(&self) -> i32 {
        round_half_up(self.temp_max_c)
    }
}

/// The daily summaries covered by one fetch, in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub daily: Vec<DailyForecast>,
}

/// Lifecycle of one fetch attempt, delivered as a short sequence that ends
/// in `Success` or `Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    Loading,
    Success(T),
    Error(String),
}

/// Everything one weather screen needs, replaced as a whole on every change.
///
/// The weather and forecast halves are independent: an error on one side
/// never clears data already displayed on the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherUiState {
    pub weather: Option<CurrentWeather>,
    pub forecast: Option<WeatherForecast>,
    pub is_loading: bool,
    pub is_forecast_loading: bool,
    pub error: Option<String>,
    pub forecast_error: Option<String>,
}

fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}
