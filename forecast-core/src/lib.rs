//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The AccuWeather client (location search + daily forecast)
//! - Position sources for "locate me" lookups
//! - The lookup session state machine
//! - Pure presentation helpers (glyphs, temperatures, labels)
//!
//! It is used by `forecast-cli`, but can also be reused by other front-ends.

pub mod config;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod present;
pub mod provider;
pub mod session;

pub use config::Config;
pub use error::{GeolocationError, LookupError};
pub use geolocation::{FixedPosition, Geolocator, IpGeolocator};
pub use model::{Coordinates, DailyForecast, Location, LocationQuery, Unit, WeatherReport};
pub use provider::{WeatherProvider, lookup, provider_from_config};
pub use session::{Action, Effect, Session, ViewState};
