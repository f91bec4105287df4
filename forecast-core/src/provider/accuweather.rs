use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::instrument;

use crate::{
    error::LookupError,
    model::{DailyForecast, Location, LocationQuery, Unit},
};

use super::WeatherProvider;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("forecast/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct AccuWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl AccuWeatherProvider {
    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, LookupError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LookupError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?query, "AccuWeather request");

        let res = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::warn!(%status, %url, "AccuWeather request failed");
            return Err(LookupError::Http { status, body: truncate_body(&body) });
        }

        serde_json::from_str(&body)
            .map_err(|e| LookupError::Parse(format!("{path}: {e}")))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwNamed {
    localized_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwLocation {
    key: String,
    localized_name: String,
    administrative_area: Option<AwNamed>,
    country: AwNamed,
}

impl From<AwLocation> for Location {
    fn from(loc: AwLocation) -> Self {
        Location {
            key: loc.key,
            name: loc.localized_name,
            administrative_area: loc
                .administrative_area
                .map(|a| a.localized_name)
                .filter(|a| !a.is_empty()),
            country: loc.country.localized_name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwValue {
    value: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwTemperature {
    minimum: AwValue,
    maximum: AwValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwDay {
    icon_phrase: String,
    #[serde(default)]
    has_precipitation: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwDailyForecast {
    date: DateTime<FixedOffset>,
    temperature: AwTemperature,
    day: AwDay,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwForecastResponse {
    daily_forecasts: Vec<AwDailyForecast>,
}

#[async_trait]
impl WeatherProvider for AccuWeatherProvider {
    #[instrument(skip(self), level = "info")]
    async fn resolve_location(&self, query: &LocationQuery) -> Result<Location, LookupError> {
        let found = match query {
            LocationQuery::City(city) => {
                let city = city.trim();
                let matches: Vec<AwLocation> = self
                    .get_json("/locations/v1/cities/search", &[("q", city)])
                    .await?;
                matches.into_iter().next()
            }
            LocationQuery::Coordinates(coords) => {
                let q = coords.to_string();
                self.get_json::<Option<AwLocation>>(
                    "/locations/v1/cities/geoposition/search",
                    &[("q", q.as_str())],
                )
                .await?
            }
        };

        let label = match query {
            LocationQuery::City(city) => city.trim().to_string(),
            LocationQuery::Coordinates(coords) => coords.to_string(),
        };

        found.map(Location::from).ok_or(LookupError::NotFound(label))
    }

    #[instrument(skip(self), level = "info")]
    async fn daily_forecast(
        &self,
        location_key: &str,
        unit: Unit,
    ) -> Result<DailyForecast, LookupError> {
        let path = format!("/forecasts/v1/daily/1day/{location_key}");
        let metric = if unit.is_metric() { "true" } else { "false" };

        let parsed: AwForecastResponse = self.get_json(&path, &[("metric", metric)]).await?;

        let day = parsed
            .daily_forecasts
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NotFound(format!("forecast for {location_key}")))?;

        Ok(DailyForecast {
            date: day.date,
            maximum: day.temperature.maximum.value,
            minimum: day.temperature.minimum.value,
            condition: day.day.icon_phrase,
            has_precipitation: day.day.has_precipitation,
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
