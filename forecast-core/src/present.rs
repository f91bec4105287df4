//! Pure mappings from report fields to display text.

use chrono::{DateTime, FixedOffset};

use crate::model::{Location, Unit};

pub const DEFAULT_GLYPH: &str = "🌡️";

const GLYPHS: &[(&str, &str)] = &[
    ("sunny", "☀️"),
    ("mostly sunny", "☀️"),
    ("partly sunny", "⛅"),
    ("cloudy", "☁️"),
    ("mostly cloudy", "☁️"),
    ("partly cloudy", "⛅"),
    ("rain", "🌧️"),
    ("showers", "🌧️"),
    ("thunderstorms", "⛈️"),
    ("snow", "❄️"),
    ("fog", "🌫️"),
    ("windy", "💨"),
];

/// Glyph for a provider condition phrase; case-insensitive, whole-phrase match.
pub fn weather_glyph(condition: &str) -> &'static str {
    let needle = condition.trim().to_lowercase();
    GLYPHS
        .iter()
        .find(|(phrase, _)| *phrase == needle)
        .map(|(_, glyph)| *glyph)
        .unwrap_or(DEFAULT_GLYPH)
}

/// Rounds half up (toward +∞) and appends the unit suffix, e.g. `22°C`.
pub fn format_temperature(value: f64, unit: Unit) -> String {
    let rounded = (value + 0.5).floor();
    // -0.0 must not render as "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.0}{}", unit.suffix())
}

pub fn location_label(location: &Location) -> String {
    match location.administrative_area.as_deref() {
        Some(area) if !area.is_empty() => {
            format!("{}, {}, {}", location.name, area, location.country)
        }
        _ => format!("{}, {}", location.name, location.country),
    }
}

/// `Saturday, June 1` in the forecast's own offset.
pub fn date_label(date: &DateTime<FixedOffset>) -> String {
    date.format("%A, %B %-d").to_string()
}

pub fn precipitation_label(has_precipitation: bool) -> &'static str {
    if has_precipitation { "Yes" } else { "No" }
}

/// Caption for the unit switch, naming the unit it switches to.
pub fn toggle_label(current: Unit) -> String {
    format!("Switch to {}", current.toggle().suffix())
}
