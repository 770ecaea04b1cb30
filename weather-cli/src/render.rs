//! Plain-text rendering of a snapshot: current card, highlights, hourly strip
//! and 7-day forecast.

use chrono::{NaiveDateTime, Timelike};
use std::fmt::Write;
use weather_core::{CurrentConditions, DailyEntry, HourlyEntry, WeatherSnapshot};

pub fn snapshot(s: &WeatherSnapshot) -> String {
    let mut out = String::new();
    out.push_str(&current_card(s));
    out.push('\n');
    out.push_str(&highlights(&s.current, s.today()));
    out.push('\n');
    out.push_str(&hourly_strip(&s.hourly));
    out.push('\n');
    out.push_str(&week(s.week()));
    out
}

fn current_card(s: &WeatherSnapshot) -> String {
    let c = &s.current;
    let mut out = String::new();
    let _ = writeln!(out, "{}, {}", s.location.name, s.location.country);
    let _ = writeln!(
        out,
        "  {}°C  {}  (feels like {}°C)",
        c.temperature, c.condition, c.feels_like
    );
    let _ = writeln!(
        out,
        "  Wind {} km/h   Humidity {}%",
        c.wind_speed, c.humidity
    );
    out
}

fn highlights(c: &CurrentConditions, today: Option<&DailyEntry>) -> String {
    let mut out = String::from("Today's Highlights\n");
    let _ = writeln!(
        out,
        "  Sunrise     {}",
        clock(today.map(|d| d.sunrise))
    );
    let _ = writeln!(out, "  Sunset      {}", clock(today.map(|d| d.sunset)));
    let _ = writeln!(
        out,
        "  Humidity    {}%  ({})",
        c.humidity,
        humidity_status(c.humidity)
    );
    let _ = writeln!(
        out,
        "  Pressure    {} hPa  ({})",
        c.pressure,
        pressure_status(c.pressure)
    );
    let _ = writeln!(
        out,
        "  Visibility  {} km  ({})",
        c.visibility,
        visibility_status(c.visibility)
    );
    out
}

fn hourly_strip(hours: &[HourlyEntry]) -> String {
    let mut out = String::from("Hourly Forecast\n");
    for (i, h) in hours.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>5}  {:>4}°C  {:>3}%  {:>3} km/h  {}",
            hour_label(i, h.time),
            h.temperature,
            h.precipitation_probability,
            h.wind_speed,
            h.condition
        );
    }
    out
}

fn week(days: &[DailyEntry]) -> String {
    let mut out = String::from("7-Day Forecast\n");
    for (i, d) in days.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:<9}  {:>3}° / {:>3}°  {:>3}%  {}",
            day_label(i, d),
            d.max_temp,
            d.min_temp,
            d.precipitation_probability,
            d.condition
        );
    }
    out
}

pub fn humidity_status(humidity: u8) -> &'static str {
    match humidity {
        70.. => "High",
        40..=69 => "Normal",
        _ => "Low",
    }
}

pub fn pressure_status(pressure: u32) -> &'static str {
    match pressure {
        1020.. => "High",
        1000..=1019 => "Normal",
        _ => "Low",
    }
}

pub fn visibility_status(km: u32) -> &'static str {
    match km {
        10.. => "Excellent",
        5..=9 => "Good",
        2..=4 => "Poor",
        _ => "Very Poor",
    }
}

/// "Now" for the first entry, then a 12-hour clock.
fn hour_label(index: usize, time: NaiveDateTime) -> String {
    if index == 0 {
        return "Now".to_string();
    }
    match time.hour() {
        0 => "12 AM".to_string(),
        12 => "12 PM".to_string(),
        h if h > 12 => format!("{} PM", h - 12),
        h => format!("{h} AM"),
    }
}

fn day_label(index: usize, day: &DailyEntry) -> String {
    if index == 0 {
        "Today".to_string()
    } else {
        day.date.format("%A").to_string()
    }
}

fn clock(time: Option<NaiveDateTime>) -> String {
    time.map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use weather_core::{Location, WeatherSnapshot};

    fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn sample() -> WeatherSnapshot {
        WeatherSnapshot {
            location: Location {
                name: "London".into(),
                country: "United Kingdom".into(),
                latitude: 51.5,
                longitude: -0.12,
            },
            current: CurrentConditions {
                observed_at: at(15, 12, 0),
                temperature: 6,
                feels_like: 2,
                condition: "Overcast".into(),
                wind_speed: 15,
                humidity: 81,
                pressure: 1010,
                visibility: 19,
            },
            daily: (15..=23)
                .map(|d| DailyEntry {
                    date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                    max_temp: 8,
                    min_temp: -1,
                    condition: "Slight rain".into(),
                    precipitation_probability: 40,
                    sunrise: at(d, 7, 58),
                    sunset: at(d, 16, 21),
                })
                .collect(),
            hourly: (0..24)
                .map(|h| HourlyEntry {
                    time: at(15, h, 0),
                    temperature: 4,
                    condition: "Overcast".into(),
                    precipitation_probability: 10,
                    wind_speed: 12,
                })
                .collect(),
        }
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(humidity_status(70), "High");
        assert_eq!(humidity_status(40), "Normal");
        assert_eq!(humidity_status(39), "Low");

        assert_eq!(pressure_status(1020), "High");
        assert_eq!(pressure_status(1000), "Normal");
        assert_eq!(pressure_status(999), "Low");

        assert_eq!(visibility_status(10), "Excellent");
        assert_eq!(visibility_status(5), "Good");
        assert_eq!(visibility_status(2), "Poor");
        assert_eq!(visibility_status(1), "Very Poor");
    }

    #[test]
    fn hour_labels_use_twelve_hour_clock() {
        assert_eq!(hour_label(0, at(15, 9, 0)), "Now");
        assert_eq!(hour_label(1, at(15, 0, 0)), "12 AM");
        assert_eq!(hour_label(1, at(15, 12, 0)), "12 PM");
        assert_eq!(hour_label(1, at(15, 15, 0)), "3 PM");
        assert_eq!(hour_label(1, at(15, 7, 0)), "7 AM");
    }

    #[test]
    fn clock_falls_back_without_time() {
        assert_eq!(clock(Some(at(15, 7, 58))), "07:58");
        assert_eq!(clock(None), "--:--");
    }

    #[test]
    fn snapshot_shows_a_week_and_a_day_of_hours() {
        let text = snapshot(&sample());

        assert!(text.starts_with("London, United Kingdom\n"));
        assert!(text.contains("6°C  Overcast  (feels like 2°C)"));
        assert!(text.contains("Pressure    1010 hPa  (Normal)"));
        assert!(text.contains("Visibility  19 km  (Excellent)"));
        assert!(text.contains("Sunrise     07:58"));

        let week_section = text.split("7-Day Forecast\n").nth(1).unwrap();
        assert_eq!(week_section.lines().count(), 7);
        assert!(week_section.starts_with("  Today"));
        // 2024-01-16 was a Tuesday.
        assert!(week_section.lines().nth(1).unwrap().contains("Tuesday"));

        let hourly_section = text
            .split("Hourly Forecast\n")
            .nth(1)
            .unwrap()
            .split("\n\n")
            .next()
            .unwrap();
        assert_eq!(hourly_section.lines().count(), 24);
    }
}
