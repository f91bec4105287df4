//! View-state for one lookup session and the transitions that drive it.
//!
//! `reduce` is a pure `(state, action) -> effect` step; `Session` runs the
//! effects against the provider and feeds the completions back in. Every
//! lookup carries a request id, and completions for anything but the latest
//! id are dropped, so a slow stale response never overwrites a newer one.

use std::sync::Arc;

use crate::{
    error::{GeolocationError, LookupError},
    geolocation::Geolocator,
    model::{Coordinates, LocationQuery, Unit, WeatherReport},
    provider::{WeatherProvider, lookup},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    /// Query text as typed, possibly empty.
    pub city: String,
    pub unit: Unit,
    pub report: Option<WeatherReport>,
    pub error: Option<String>,
    /// True only while a request is outstanding.
    pub loading: bool,

    latest_request: u64,
    last_query: Option<LocationQuery>,
}

impl ViewState {
    pub fn new(unit: Unit) -> Self {
        Self { unit, ..Self::default() }
    }

    fn next_request(&mut self) -> u64 {
        self.latest_request += 1;
        self.latest_request
    }

    fn start_loading(&mut self) {
        self.loading = true;
        self.error = None;
        self.report = None;
    }

    fn is_current(&self, request_id: u64) -> bool {
        if request_id == self.latest_request {
            true
        } else {
            tracing::debug!(
                request_id,
                latest = self.latest_request,
                "dropping superseded response"
            );
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetCity(String),
    SubmitCity,
    Locate,
    /// Flip the unit; refetches when a report is on screen.
    ToggleUnit,

    PositionDidResolve { request_id: u64, coordinates: Coordinates },
    PositionDidFail { request_id: u64, error: GeolocationError },
    LookupDidLoad { request_id: u64, report: WeatherReport },
    LookupDidFail { request_id: u64, message: String },
}

/// Side effects requested by `reduce`.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Locate { request_id: u64 },
    Lookup { request_id: u64, query: LocationQuery, unit: Unit },
}

pub fn reduce(state: &mut ViewState, action: Action) -> Option<Effect> {
    match action {
        Action::SetCity(city) => {
            state.city = city;
            None
        }

        Action::SubmitCity => {
            let city = state.city.trim().to_string();
            if city.is_empty() {
                // No request is issued, so a report already on screen stays.
                state.error = Some(LookupError::EmptyCity.user_message());
                return None;
            }
            Some(issue_lookup(state, LocationQuery::City(city)))
        }

        Action::Locate => {
            state.start_loading();
            Some(Effect::Locate { request_id: state.next_request() })
        }

        Action::ToggleUnit => {
            state.unit = state.unit.toggle();
            let query = state.report.as_ref().and(state.last_query.clone());
            query.map(|query| issue_lookup(state, query))
        }

        Action::PositionDidResolve { request_id, coordinates } => {
            if !state.is_current(request_id) {
                return None;
            }
            let query = LocationQuery::Coordinates(coordinates);
            state.last_query = Some(query.clone());
            Some(Effect::Lookup { request_id, query, unit: state.unit })
        }

        Action::PositionDidFail { request_id, error } => {
            if state.is_current(request_id) {
                state.error = Some(LookupError::from(error).user_message());
                state.loading = false;
            }
            None
        }

        Action::LookupDidLoad { request_id, report } => {
            if state.is_current(request_id) {
                state.report = Some(report);
                state.error = None;
                state.loading = false;
            }
            None
        }

        Action::LookupDidFail { request_id, message } => {
            if state.is_current(request_id) {
                state.report = None;
                state.error = Some(message);
                state.loading = false;
            }
            None
        }
    }
}

fn issue_lookup(state: &mut ViewState, query: LocationQuery) -> Effect {
    state.start_loading();
    state.last_query = Some(query.clone());
    Effect::Lookup { request_id: state.next_request(), query, unit: state.unit }
}

/// Perform one effect and return the action that completes it.
pub async fn run_effect(
    provider: &dyn WeatherProvider,
    geolocator: Option<&dyn Geolocator>,
    effect: Effect,
) -> Action {
    match effect {
        Effect::Locate { request_id } => {
            let Some(geolocator) = geolocator else {
                return Action::PositionDidFail {
                    request_id,
                    error: GeolocationError::Unsupported,
                };
            };
            match geolocator.current_position().await {
                Ok(coordinates) => Action::PositionDidResolve { request_id, coordinates },
                Err(error) => {
                    tracing::warn!("geolocation failed: {:?}", error);
                    Action::PositionDidFail { request_id, error }
                }
            }
        }
        Effect::Lookup { request_id, query, unit } => {
            match lookup(provider, &query, unit).await {
                Ok(report) => Action::LookupDidLoad { request_id, report },
                Err(err) => {
                    tracing::warn!(?query, "lookup failed: {}", err);
                    Action::LookupDidFail { request_id, message: err.user_message() }
                }
            }
        }
    }
}

/// Owns the view-state and processes one action at a time to completion.
#[derive(Debug)]
pub struct Session {
    state: ViewState,
    provider: Arc<dyn WeatherProvider>,
    geolocator: Option<Arc<dyn Geolocator>>,
}

impl Session {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        geolocator: Option<Arc<dyn Geolocator>>,
        unit: Unit,
    ) -> Self {
        Self { state: ViewState::new(unit), provider, geolocator }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub async fn dispatch(&mut self, action: Action) -> &ViewState {
        let mut next = reduce(&mut self.state, action);
        while let Some(effect) = next {
            let done =
                run_effect(self.provider.as_ref(), self.geolocator.as_deref(), effect).await;
            next = reduce(&mut self.state, done);
        }
        &self.state
    }

    pub async fn submit_city(&mut self, city: &str) -> &ViewState {
        reduce(&mut self.state, Action::SetCity(city.to_string()));
        self.dispatch(Action::SubmitCity).await
    }

    pub async fn locate(&mut self) -> &ViewState {
        self.dispatch(Action::Locate).await
    }

    pub async fn toggle_unit(&mut self) -> &ViewState {
        self.dispatch(Action::ToggleUnit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geolocation::FixedPosition,
        present::{format_temperature, weather_glyph},
        provider::testing::ScriptedProvider,
    };

    fn paris() -> Arc<ScriptedProvider> {
        Arc::new(ScriptedProvider::default().with_city("Paris", "623", 22.0, "Sunny"))
    }

    fn session(provider: &Arc<ScriptedProvider>) -> Session {
        Session::new(provider.clone(), None, Unit::Metric)
    }

    fn report_for(state: &ViewState, name: &str) -> WeatherReport {
        WeatherReport {
            location: crate::model::Location {
                key: name.into(),
                name: name.into(),
                administrative_area: None,
                country: "X".into(),
            },
            forecast: crate::model::DailyForecast {
                date: chrono::DateTime::parse_from_rfc3339("2024-06-01T07:00:00+00:00").unwrap(),
                maximum: 10.0,
                minimum: 2.0,
                condition: "Cloudy".into(),
                has_precipitation: true,
            },
            unit: state.unit,
        }
    }

    #[tokio::test]
    async fn empty_city_never_calls_provider() {
        let provider = paris();
        let mut session = session(&provider);

        let state = session.submit_city("   ").await;

        assert_eq!(state.error.as_deref(), Some("Please enter a city name"));
        assert!(!state.loading);
        assert!(state.report.is_none());
        assert_eq!(provider.resolves(), 0);
        assert_eq!(provider.forecasts_fetched(), 0);
    }

    #[tokio::test]
    async fn successful_lookup_sets_report_and_clears_error() {
        let provider = paris();
        let mut session = session(&provider);
        session.submit_city("").await;

        let state = session.submit_city("Paris").await;

        assert!(state.error.is_none());
        assert!(!state.loading);
        let report = state.report.as_ref().expect("report");
        assert_eq!(report.location.key, "623");
        assert_eq!(format_temperature(report.forecast.maximum, report.unit), "22°C");
        assert_eq!(weather_glyph(&report.forecast.condition), "☀️");
    }

    #[tokio::test]
    async fn unknown_city_sets_error_without_forecast_call() {
        let provider = paris();
        let mut session = session(&provider);

        let state = session.submit_city("Atlantis").await;

        assert_eq!(state.error.as_deref(), Some("Location not found"));
        assert!(state.report.is_none());
        assert!(!state.loading);
        assert_eq!(provider.forecasts_fetched(), 0);
    }

    #[tokio::test]
    async fn toggle_after_success_refetches_in_new_unit() {
        let provider = paris();
        let mut session = session(&provider);
        session.submit_city("Paris").await;

        let state = session.toggle_unit().await;

        assert_eq!(state.unit, Unit::Imperial);
        let report = state.report.as_ref().expect("report");
        assert_eq!(report.unit, Unit::Imperial);
        assert_eq!(format_temperature(report.forecast.maximum, report.unit), "72°F");
        assert_eq!(provider.forecasts_fetched(), 2);

        let state = session.toggle_unit().await;
        let report = state.report.as_ref().expect("report");
        assert_eq!(format_temperature(report.forecast.maximum, report.unit), "22°C");
    }

    #[tokio::test]
    async fn toggle_without_report_only_changes_unit() {
        let provider = paris();
        let mut session = session(&provider);

        let state = session.toggle_unit().await;

        assert_eq!(state.unit, Unit::Imperial);
        assert_eq!(provider.resolves(), 0);
    }

    #[tokio::test]
    async fn toggle_refetches_located_query_not_city_text() {
        let coords = Coordinates { latitude: 48.85, longitude: 2.35 };
        let mut provider = ScriptedProvider::default().with_city("Paris", "623", 22.0, "Sunny");
        let paris = provider.locations["paris"].clone();
        provider.locations.insert(coords.to_string(), paris);
        let provider = Arc::new(provider);

        let mut session = Session::new(
            provider.clone(),
            Some(Arc::new(FixedPosition(coords))),
            Unit::Metric,
        );
        session.locate().await;
        let state = session.toggle_unit().await;

        assert!(state.error.is_none());
        assert_eq!(state.report.as_ref().map(|r| r.unit), Some(Unit::Imperial));
        assert_eq!(provider.resolves(), 2);
    }

    #[tokio::test]
    async fn locate_without_geolocator_reports_unsupported() {
        let provider = paris();
        let mut session = session(&provider);

        let state = session.locate().await;

        assert!(state.error.as_deref().unwrap_or_default().contains("not supported"));
        assert!(!state.loading);
        assert_eq!(provider.resolves(), 0);
    }

    #[tokio::test]
    async fn blank_resubmit_keeps_report_on_screen() {
        let provider = paris();
        let mut session = session(&provider);
        session.submit_city("Paris").await;

        let state = session.submit_city(" ").await;

        assert_eq!(state.error.as_deref(), Some("Please enter a city name"));
        assert_eq!(state.report.as_ref().map(|r| r.location.key.as_str()), Some("623"));
        assert!(!state.loading);
        assert_eq!(provider.resolves(), 1);
    }

    #[test]
    fn stale_lookup_response_is_discarded() {
        let mut state = ViewState::new(Unit::Metric);

        reduce(&mut state, Action::SetCity("Paris".into()));
        let first = reduce(&mut state, Action::SubmitCity);
        reduce(&mut state, Action::SetCity("Oslo".into()));
        let second = reduce(&mut state, Action::SubmitCity);

        let (
            Some(Effect::Lookup { request_id: old, .. }),
            Some(Effect::Lookup { request_id: new, .. }),
        ) = (first, second)
        else {
            panic!("both submissions should issue lookups");
        };
        assert!(new > old);

        let oslo = report_for(&state, "Oslo");
        reduce(&mut state, Action::LookupDidLoad { request_id: new, report: oslo });
        let snapshot = state.clone();

        let paris = report_for(&state, "Paris");
        reduce(&mut state, Action::LookupDidLoad { request_id: old, report: paris });
        reduce(&mut state, Action::LookupDidFail { request_id: old, message: "late".into() });

        assert_eq!(state, snapshot);
        assert_eq!(state.report.as_ref().map(|r| r.location.name.as_str()), Some("Oslo"));
    }

    #[test]
    fn loading_only_while_request_outstanding() {
        let mut state = ViewState::new(Unit::Metric);
        reduce(&mut state, Action::SetCity("Paris".into()));

        let effect = reduce(&mut state, Action::SubmitCity);
        assert!(state.loading);
        assert!(state.error.is_none());

        let Some(Effect::Lookup { request_id, .. }) = effect else {
            panic!("expected lookup");
        };
        reduce(&mut state, Action::LookupDidFail { request_id, message: "boom".into() });

        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(state.report.is_none());
    }

    #[test]
    fn position_failure_surfaces_location_message() {
        let mut state = ViewState::new(Unit::Metric);
        let Some(Effect::Locate { request_id }) = reduce(&mut state, Action::Locate) else {
            panic!("expected locate");
        };

        reduce(
            &mut state,
            Action::PositionDidFail { request_id, error: GeolocationError::Denied },
        );

        assert_eq!(
            state.error.as_deref(),
            Some("Unable to retrieve your location. Please allow location access.")
        );
        assert!(!state.loading);
    }
}
