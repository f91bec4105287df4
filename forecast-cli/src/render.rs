//! Terminal rendering of the session view-state.

use forecast_core::{
    ViewState, WeatherReport,
    present::{
        date_label, format_temperature, location_label, precipitation_label, toggle_label,
        weather_glyph,
    },
};

pub const BANNER: &str = "⛅ Weather Forecast";

pub fn render_report(report: &WeatherReport) -> String {
    let forecast = &report.forecast;
    let mut out = String::new();

    out.push_str(&location_label(&report.location));
    out.push('\n');
    out.push_str(&date_label(&forecast.date));
    out.push_str("\n\n");
    out.push_str(&format!(
        "  {}  {}  {}\n\n",
        weather_glyph(&forecast.condition),
        format_temperature(forecast.maximum, report.unit),
        forecast.condition,
    ));
    out.push_str(&format!(
        "  {:<14} {}\n",
        "Min Temp",
        format_temperature(forecast.minimum, report.unit)
    ));
    out.push_str(&format!(
        "  {:<14} {}\n",
        "Precipitation",
        precipitation_label(forecast.has_precipitation)
    ));

    out
}

/// Everything the user should see for the current state, or `None` when idle and empty.
pub fn render_state(state: &ViewState) -> Option<String> {
    if state.loading {
        return Some("⏳ Loading...".to_string());
    }
    if let Some(error) = &state.error {
        return Some(format!("✗ {error}"));
    }
    state
        .report
        .as_ref()
        .map(|report| format!("{}\n  [:u] {}", render_report(report), toggle_label(state.unit)))
}
