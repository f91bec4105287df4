use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser, Subcommand};
use forecast_core::{
    Config, Coordinates, FixedPosition, Geolocator, IpGeolocator, Session, Unit, ViewState,
    WeatherProvider, provider_from_config,
};
use inquire::{Password, PasswordDisplayMode, Select};

use crate::{interactive, locate::PromptedGeolocator, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Daily weather forecast lookup")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the AccuWeather API key and default unit.
    Configure,

    /// Show today's forecast for a city.
    Show {
        /// City name, e.g. "Paris".
        city: String,

        /// metric or imperial; defaults to the configured unit.
        #[arg(long)]
        unit: Option<Unit>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show today's forecast for your position.
    Locate {
        /// Latitude; when omitted the position comes from your IP address.
        #[arg(long, requires = "lon", allow_negative_numbers = true, value_parser = parse_latitude)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true, value_parser = parse_longitude)]
        lon: Option<f64>,

        #[arg(long)]
        unit: Option<Unit>,

        #[arg(long)]
        json: bool,
    },

    /// Look up cities one after another in a prompt loop.
    Interactive {
        #[arg(long)]
        unit: Option<Unit>,
    },
}

fn parse_degrees(value: &str, limit: f64) -> Result<f64, String> {
    let degrees: f64 = value.parse().map_err(|_| format!("'{value}' is not a number"))?;
    if !(-limit..=limit).contains(&degrees) {
        return Err(format!("{degrees} is outside -{limit}..={limit}"));
    }
    Ok(degrees)
}

fn parse_latitude(value: &str) -> Result<f64, String> {
    parse_degrees(value, 90.0)
}

fn parse_longitude(value: &str) -> Result<f64, String> {
    parse_degrees(value, 180.0)
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, unit, json } => {
                let (config, provider) = load_provider()?;
                let mut session = Session::new(provider, None, unit.unwrap_or(config.unit()));
                let state = session.submit_city(&city).await;
                print_outcome(state, json)
            }
            Command::Locate { lat, lon, unit, json } => {
                let (config, provider) = load_provider()?;
                let geolocator: Arc<dyn Geolocator> = match (lat, lon) {
                    (Some(latitude), Some(longitude)) => {
                        Arc::new(FixedPosition(Coordinates { latitude, longitude }))
                    }
                    _ => Arc::new(IpGeolocator::new()?),
                };
                let mut session =
                    Session::new(provider, Some(geolocator), unit.unwrap_or(config.unit()));
                let state = session.locate().await;
                print_outcome(state, json)
            }
            Command::Interactive { unit } => {
                let (config, provider) = load_provider()?;
                let geolocator = match IpGeolocator::new() {
                    Ok(ip) => Some(Arc::new(PromptedGeolocator::new(ip)) as Arc<dyn Geolocator>),
                    Err(e) => {
                        tracing::warn!("geolocation disabled: {}", e);
                        None
                    }
                };
                let mut session =
                    Session::new(provider, geolocator, unit.unwrap_or(config.unit()));
                interactive::run(&mut session).await
            }
        }
    }
}

fn load_provider() -> anyhow::Result<(Config, Arc<dyn WeatherProvider>)> {
    let config = Config::load_with_env()?;
    let provider: Arc<dyn WeatherProvider> = Arc::from(provider_from_config(&config)?);
    Ok((config, provider))
}

fn print_outcome(state: &ViewState, json: bool) -> anyhow::Result<()> {
    if let Some(error) = &state.error {
        bail!("{error}");
    }
    let Some(report) = &state.report else {
        bail!("No forecast available");
    };

    if json {
        let text =
            serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;
        println!("{text}");
    } else {
        println!("{}", render::render_report(report));
    }
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("AccuWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("Create one at https://developer.accuweather.com")
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let start = match config.unit() {
        Unit::Metric => 0,
        Unit::Imperial => 1,
    };
    let unit = Select::new("Default unit:", vec![Unit::Metric, Unit::Imperial])
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read default unit")?;

    config.set_api_key(api_key);
    config.default_unit = Some(unit);
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_unit() {
        let cli = Cli::try_parse_from(["forecast", "show", "Paris", "--unit", "imperial"]).unwrap();

        match cli.command {
            Command::Show { city, unit, json } => {
                assert_eq!(city, "Paris");
                assert_eq!(unit, Some(Unit::Imperial));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn locate_accepts_negative_coordinates() {
        let cli =
            Cli::try_parse_from(["forecast", "locate", "--lat", "-33.87", "--lon", "151.21"])
                .unwrap();

        match cli.command {
            Command::Locate { lat, lon, .. } => {
                assert_eq!(lat, Some(-33.87));
                assert_eq!(lon, Some(151.21));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn locate_rejects_out_of_range_coordinates() {
        let err = Cli::try_parse_from(["forecast", "locate", "--lat", "123", "--lon", "0"])
            .unwrap_err();
        assert!(err.to_string().contains("outside -90..=90"));

        assert!(
            Cli::try_parse_from(["forecast", "locate", "--lat", "0", "--lon", "-180.5"]).is_err()
        );
        assert!(Cli::try_parse_from(["forecast", "locate", "--lat", "north", "--lon", "0"]).is_err());
    }

    #[test]
    fn locate_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["forecast", "locate", "--lat", "10"]).is_err());
    }

    #[test]
    fn verbose_is_global_and_counted() {
        let cli = Cli::try_parse_from(["forecast", "interactive", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
