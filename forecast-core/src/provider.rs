use crate::{
    Config,
    error::LookupError,
    model::{DailyForecast, Location, LocationQuery, Unit, WeatherReport},
    provider::accuweather::AccuWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod accuweather;

/// The two provider calls a lookup is made of.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Resolve a city name or coordinates to the provider's location record.
    async fn resolve_location(&self, query: &LocationQuery) -> Result<Location, LookupError>;

    /// First day of the daily forecast for a resolved location.
    async fn daily_forecast(
        &self,
        location_key: &str,
        unit: Unit,
    ) -> Result<DailyForecast, LookupError>;
}

/// Resolve, then fetch the forecast. A failed resolve never reaches the forecast call.
pub async fn lookup(
    provider: &dyn WeatherProvider,
    query: &LocationQuery,
    unit: Unit,
) -> Result<WeatherReport, LookupError> {
    if let LocationQuery::City(city) = query {
        if city.trim().is_empty() {
            return Err(LookupError::EmptyCity);
        }
    }

    let location = provider.resolve_location(query).await?;
    tracing::info!(key = %location.key, name = %location.name, "resolved location");

    let forecast = provider.daily_forecast(&location.key, unit).await?;

    Ok(WeatherReport { location, forecast, unit })
}

/// Construct the AccuWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or(LookupError::MissingApiKey)?;

    let provider = AccuWeatherProvider::with_base_url(api_key.to_owned(), config.base_url())?;

    Ok(Box::new(provider))
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;

    #[tokio::test]
    async fn lookup_combines_location_and_forecast() {
        let provider = ScriptedProvider::default().with_city("Paris", "623", 22.0, "Sunny");

        let report = lookup(&provider, &LocationQuery::City("Paris".into()), Unit::Metric)
            .await
            .expect("lookup should succeed");

        assert_eq!(report.location.key, "623");
        assert_eq!(report.forecast.maximum, 22.0);
        assert_eq!(report.unit, Unit::Metric);
    }

    #[tokio::test]
    async fn unknown_city_skips_forecast_call() {
        let provider = ScriptedProvider::default();

        let err = lookup(&provider, &LocationQuery::City("Atlantis".into()), Unit::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::NotFound(_)));
        assert_eq!(provider.resolves(), 1);
        assert_eq!(provider.forecasts_fetched(), 0);
    }

    #[tokio::test]
    async fn blank_city_makes_no_calls() {
        let provider = ScriptedProvider::default();

        let err = lookup(&provider, &LocationQuery::City("  ".into()), Unit::Metric)
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::EmptyCity));
        assert_eq!(provider.resolves(), 0);
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("No AccuWeather API key configured"));
    }

    #[test]
    fn provider_from_config_works_when_key_set() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());

        assert!(provider_from_config(&cfg).is_ok());
    }
}
