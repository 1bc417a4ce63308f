//! Aggregation of raw 3-hourly forecast samples into one summary per
//! calendar day.
//!
//! Days are calendar days in the local timezone of the running process, the
//! same convention the display layer uses.

use chrono::{DateTime, Local, NaiveDate, NaiveTime};

use crate::model::DailyForecast;

/// One raw 3-hour forecast entry as returned by the remote API.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Sample time in epoch seconds.
    pub timestamp: i64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    /// Zero or more condition descriptors; consumers take the first.
    pub conditions: Vec<Condition>,
}

/// A weather condition descriptor attached to a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub id: i64,
    pub description: String,
    pub icon_code: String,
}

/// Group samples into one [`DailyForecast`] per local calendar day.
///
/// Partitions keep first-seen order; because the API returns samples in
/// chronological order, the output is chronological too. Each day's minimum
/// and maximum fold over every sample of that day, while the description and
/// icon come from the day's first sample (empty strings when it carries no
/// condition). Samples whose timestamp falls outside the representable
/// range are skipped.
pub fn group_by_day(samples: &[ForecastSample]) -> Vec<DailyForecast> {
    let mut days: Vec<(NaiveDate, DailyForecast)> = Vec::new();

    for sample in samples {
        let Some(date) = local_date(sample.timestamp) else {
            continue;
        };

        match days.iter().position(|(day, _)| *day == date) {
            Some(index) => {
                let daily = &mut days[index].1;
                daily.temp_min_c = daily.temp_min_c.min(sample.temp_min_c);
                daily.temp_max_c = daily.temp_max_c.max(sample.temp_max_c);
            }
            None => {
                let first = sample.conditions.first();
                days.push((
                    date,
                    DailyForecast {
                        day_start: day_start_epoch(date),
                        temp_min_c: sample.temp_min_c,
                        temp_max_c: sample.temp_max_c,
                        description: first.map(|c| c.description.clone()).unwrap_or_default(),
                        icon_code: first.map(|c| c.icon_code.clone()).unwrap_or_default(),
                    },
                ));
            }
        }
    }

    days.into_iter().map(|(_, daily)| daily).collect()
}

fn local_date(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&Local).date_naive())
}

/// Midnight of `date` in the local timezone, as epoch seconds.
///
/// When midnight does not exist locally (a DST gap), the earliest valid
/// instant of the day is used, with a UTC interpretation as the last resort.
fn day_start_epoch(date: NaiveDate) -> i64 {
    let midnight = date.and_time(NaiveTime::MIN);
    midnight
        .and_local_timezone(Local)
        .earliest()
        .map_or_else(|| midnight.and_utc().timestamp(), |start| start.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Epoch seconds for a local wall-clock time, so grouping is stable no
    /// matter which timezone the test host runs in.
    fn local_ts(date: NaiveDate, hour: u32) -> i64 {
        date.and_hms_opt(hour, 0, 0)
            .unwrap()
            .and_local_timezone(Local)
            .earliest()
            .unwrap()
            .timestamp()
    }

    fn sample(ts: i64, min: f64, max: f64, condition: Option<(&str, &str)>) -> ForecastSample {
        ForecastSample {
            timestamp: ts,
            temp_min_c: min,
            temp_max_c: max,
            conditions: condition
                .map(|(description, icon)| {
                    vec![Condition {
                        id: 800,
                        description: description.to_string(),
                        icon_code: icon.to_string(),
                    }]
                })
                .unwrap_or_default(),
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(group_by_day(&[]).is_empty());
    }

    #[test]
    fn same_day_samples_fold_into_one_summary() {
        let day = date(2025, 6, 10);
        let samples = vec![
            sample(local_ts(day, 9), 10.0, 20.0, Some(("sunny", "01d"))),
            sample(local_ts(day, 12), 12.0, 22.0, Some(("cloudy", "02d"))),
        ];

        let daily = group_by_day(&samples);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].temp_min_c, 10.0);
        assert_eq!(daily[0].temp_max_c, 22.0);
        assert_eq!(daily[0].description, "sunny");
        assert_eq!(daily[0].icon_code, "01d");
    }

    #[test]
    fn day_start_is_local_midnight() {
        let day = date(2025, 6, 10);
        let samples = vec![sample(local_ts(day, 15), 10.0, 20.0, None)];

        let daily = group_by_day(&samples);
        assert_eq!(daily[0].day_start, local_ts(day, 0));
    }

    #[test]
    fn days_come_out_in_chronological_order() {
        let mut samples = Vec::new();
        for offset in 0..5 {
            let day = date(2025, 6, 10 + offset);
            for hour in [3, 9, 15, 21] {
                samples.push(sample(local_ts(day, hour), 8.0, 18.0, Some(("rain", "10d"))));
            }
        }

        let daily = group_by_day(&samples);
        assert_eq!(daily.len(), 5);
        assert!(daily.len() <= samples.len());
        assert!(daily.windows(2).all(|pair| pair[0].day_start <= pair[1].day_start));
        assert!(daily.iter().all(|d| d.temp_min_c <= d.temp_max_c));
    }

    #[test]
    fn missing_conditions_default_to_empty_strings() {
        let day = date(2025, 6, 10);
        let samples = vec![
            sample(local_ts(day, 6), 10.0, 20.0, None),
            // Later sample has a condition, but the day keeps the first
            // sample's (empty) descriptor.
            sample(local_ts(day, 12), 11.0, 21.0, Some(("cloudy", "02d"))),
        ];

        let daily = group_by_day(&samples);
        assert_eq!(daily[0].description, "");
        assert_eq!(daily[0].icon_code, "");
    }

    #[test]
    fn extremes_can_come_from_different_samples() {
        let day = date(2025, 6, 10);
        let samples = vec![
            sample(local_ts(day, 3), 4.0, 9.0, Some(("mist", "50d"))),
            sample(local_ts(day, 12), 9.0, 17.5, Some(("clear", "01d"))),
            sample(local_ts(day, 21), 6.5, 12.0, Some(("clear", "01n"))),
        ];

        let daily = group_by_day(&samples);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].temp_min_c, 4.0);
        assert_eq!(daily[0].temp_max_c, 17.5);
    }

    #[test]
    fn out_of_range_timestamps_are_skipped() {
        let day = date(2025, 6, 10);
        let samples = vec![
            sample(i64::MAX, 0.0, 1.0, None),
            sample(local_ts(day, 9), 10.0, 20.0, Some(("sunny", "01d"))),
        ];

        let daily = group_by_day(&samples);
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].description, "sunny");
    }
}
