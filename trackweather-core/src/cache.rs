//! SQLite-backed cache for the latest weather data.
//!
//! Holds the single most recent current-weather record and the daily
//! forecast rows from the last successful fetch. Writers replace contents
//! wholesale; readers can take a point-in-time snapshot or subscribe to a
//! live view that replays the latest value and then follows every change.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, Row, params};
use std::path::Path;
use tokio::sync::watch;

use crate::model::{CurrentWeather, DailyForecast};

pub struct WeatherCache {
    conn: Mutex<Connection>,
    current_tx: watch::Sender<Option<CurrentWeather>>,
    forecast_tx: watch::Sender<Vec<DailyForecast>>,
}

impl WeatherCache {
    /// Open (or create) the cache database at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open weather cache database")?;
        Self::with_connection(conn)
    }

    /// Create an in-memory cache (for testing).
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;

        // Seed the live views from persisted rows so new subscribers always
        // start from the latest known data.
        let (current_tx, _) = watch::channel(query_latest_current(&conn)?);
        let (forecast_tx, _) = watch::channel(query_forecast(&conn)?);

        Ok(Self {
            conn: Mutex::new(conn),
            current_tx,
            forecast_tx,
        })
    }

    /// Replace the cached current-weather record with `weather`.
    pub fn replace_current(&self, weather: &CurrentWeather) -> Result<()> {
        {
            let mut conn = self.conn.lock();
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM current_weather", [])?;
            tx.execute(
                r#"
                INSERT INTO current_weather
                (id, city_name, description, temperature, feels_like, humidity,
                 pressure, wind_speed, icon_code, observed_at, latitude, longitude)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    weather.id,
                    weather.city_name,
                    weather.description,
                    weather.temperature_c,
                    weather.feels_like_c,
                    weather.humidity_pct,
                    weather.pressure_hpa,
                    weather.wind_speed_mps,
                    weather.icon_code,
                    weather.observed_at_ms,
                    weather.latitude,
                    weather.longitude,
                ],
            )?;
            tx.commit()?;
        }

        tracing::debug!(city = %weather.city_name, "cached current weather replaced");
        self.current_tx.send_replace(Some(weather.clone()));
        Ok(())
    }

    /// The most recent cached current-weather record, if any.
    pub fn latest_current(&self) -> Result<Option<CurrentWeather>> {
        query_latest_current(&self.conn.lock())
    }

    /// Replace all cached forecast rows with `daily`.
    pub fn replace_forecast(&self, daily: &[DailyForecast]) -> Result<()> {
        {
            let mut conn = self.conn.lock();
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM daily_forecast", [])?;
            for day in daily {
                tx.execute(
                    r#"
                    INSERT OR REPLACE INTO daily_forecast
                    (day_start, temp_min, temp_max, description, icon_code)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        day.day_start,
                        day.temp_min_c,
                        day.temp_max_c,
                        day.description,
                        day.icon_code,
                    ],
                )?;
            }
            tx.commit()?;
        }

        tracing::debug!(days = daily.len(), "cached forecast replaced");
        self.forecast_tx.send_replace(daily.to_vec());
        Ok(())
    }

    /// All cached forecast rows, ordered by day.
    pub fn forecast(&self) -> Result<Vec<DailyForecast>> {
        query_forecast(&self.conn.lock())
    }

    /// Live view over the cached current weather: latest value, then every
    /// change.
    pub fn watch_current(&self) -> watch::Receiver<Option<CurrentWeather>> {
        self.current_tx.subscribe()
    }

    /// Live view over the cached forecast rows.
    pub fn watch_forecast(&self) -> watch::Receiver<Vec<DailyForecast>> {
        self.forecast_tx.subscribe()
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS current_weather (
            id INTEGER PRIMARY KEY,
            city_name TEXT NOT NULL,
            description TEXT NOT NULL,
            temperature REAL NOT NULL,
            feels_like REAL NOT NULL,
            humidity INTEGER NOT NULL,
            pressure INTEGER NOT NULL,
            wind_speed REAL NOT NULL,
            icon_code TEXT NOT NULL,
            observed_at INTEGER NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS daily_forecast (
            day_start INTEGER PRIMARY KEY,
            temp_min REAL NOT NULL,
            temp_max REAL NOT NULL,
            description TEXT NOT NULL,
            icon_code TEXT NOT NULL
        );
        "#,
    )
    .context("Failed to initialize weather cache schema")?;
    Ok(())
}

fn query_latest_current(conn: &Connection) -> Result<Option<CurrentWeather>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, city_name, description, temperature, feels_like, humidity,
               pressure, wind_speed, icon_code, observed_at, latitude, longitude
        FROM current_weather
        ORDER BY observed_at DESC
        LIMIT 1
        "#,
    )?;

    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_weather(row)?)),
        None => Ok(None),
    }
}

fn query_forecast(conn: &Connection) -> Result<Vec<DailyForecast>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT day_start, temp_min, temp_max, description, icon_code
        FROM daily_forecast
        ORDER BY day_start
        "#,
    )?;

    let days = stmt
        .query_map([], |row| {
            Ok(DailyForecast {
                day_start: row.get(0)?,
                temp_min_c: row.get(1)?,
                temp_max_c: row.get(2)?,
                description: row.get(3)?,
                icon_code: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(days)
}

fn row_to_weather(row: &Row) -> rusqlite::Result<CurrentWeather> {
    Ok(CurrentWeather {
        id: row.get(0)?,
        city_name: row.get(1)?,
        description: row.get(2)?,
        temperature_c: row.get(3)?,
        feels_like_c: row.get(4)?,
        humidity_pct: row.get(5)?,
        pressure_hpa: row.get(6)?,
        wind_speed_mps: row.get(7)?,
        icon_code: row.get(8)?,
        observed_at_ms: row.get(9)?,
        latitude: row.get(10)?,
        longitude: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather(city: &str, observed_at_ms: i64) -> CurrentWeather {
        CurrentWeather {
            id: 800,
            city_name: city.to_string(),
            description: "clear sky".to_string(),
            temperature_c: 21.5,
            feels_like_c: 20.9,
            humidity_pct: 40,
            pressure_hpa: 1020,
            wind_speed_mps: 2.1,
            icon_code: "01d".to_string(),
            observed_at_ms,
            latitude: 50.45,
            longitude: 30.52,
        }
    }

    fn day(day_start: i64) -> DailyForecast {
        DailyForecast {
            day_start,
            temp_min_c: 10.0,
            temp_max_c: 20.0,
            description: "sunny".to_string(),
            icon_code: "01d".to_string(),
        }
    }

    #[test]
    fn empty_cache_has_no_data() {
        let cache = WeatherCache::in_memory().unwrap();
        assert_eq!(cache.latest_current().unwrap(), None);
        assert!(cache.forecast().unwrap().is_empty());
        assert!(cache.watch_current().borrow().is_none());
        assert!(cache.watch_forecast().borrow().is_empty());
    }

    #[test]
    fn replace_current_is_latest_wins() {
        let cache = WeatherCache::in_memory().unwrap();

        cache.replace_current(&weather("Kyiv", 1_000)).unwrap();
        cache.replace_current(&weather("Lviv", 2_000)).unwrap();

        let latest = cache.latest_current().unwrap().unwrap();
        assert_eq!(latest.city_name, "Lviv");
        assert_eq!(*cache.watch_current().borrow(), Some(weather("Lviv", 2_000)));
    }

    #[test]
    fn replace_forecast_drops_old_rows() {
        let cache = WeatherCache::in_memory().unwrap();

        cache.replace_forecast(&[day(100), day(200), day(300)]).unwrap();
        cache.replace_forecast(&[day(400)]).unwrap();

        let rows = cache.forecast().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].day_start, 400);
    }

    #[test]
    fn forecast_reads_back_in_day_order() {
        let cache = WeatherCache::in_memory().unwrap();
        cache.replace_forecast(&[day(300), day(100), day(200)]).unwrap();

        let starts: Vec<i64> = cache.forecast().unwrap().iter().map(|d| d.day_start).collect();
        assert_eq!(starts, vec![100, 200, 300]);
    }

    #[test]
    fn subscribers_are_notified_of_writes() {
        let cache = WeatherCache::in_memory().unwrap();
        let mut current_rx = cache.watch_current();
        let mut forecast_rx = cache.watch_forecast();

        cache.replace_current(&weather("Kyiv", 1_000)).unwrap();
        cache.replace_forecast(&[day(100)]).unwrap();

        assert!(current_rx.has_changed().unwrap());
        assert_eq!(
            current_rx.borrow_and_update().as_ref().map(|w| w.city_name.clone()),
            Some("Kyiv".to_string())
        );
        assert!(forecast_rx.has_changed().unwrap());
        assert_eq!(forecast_rx.borrow_and_update().len(), 1);
    }

    #[test]
    fn reopened_cache_replays_persisted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.db");

        {
            let cache = WeatherCache::new(&path).unwrap();
            cache.replace_current(&weather("Kyiv", 1_000)).unwrap();
            cache.replace_forecast(&[day(100), day(200)]).unwrap();
        }

        let cache = WeatherCache::new(&path).unwrap();
        assert_eq!(
            cache.latest_current().unwrap().map(|w| w.city_name),
            Some("Kyiv".to_string())
        );
        assert_eq!(cache.forecast().unwrap().len(), 2);
        // Live views start from what survived the restart.
        assert!(cache.watch_current().borrow().is_some());
        assert_eq!(cache.watch_forecast().borrow().len(), 2);
    }
}
