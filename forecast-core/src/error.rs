use reqwest::StatusCode;

/// Why the user's position could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Geolocation is not supported on this system")]
    Unsupported,
    #[error("Unable to retrieve your location. Please allow location access.")]
    Denied,
    #[error("Unable to retrieve your location. Please allow location access.")]
    Unavailable(String),
}

/// Everything that can go wrong between a submitted query and a rendered report.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Please enter a city name")]
    EmptyCity,
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
    #[error("Location not found")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather service returned {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("Unexpected response from weather service: {0}")]
    Parse(String),
    #[error(
        "No AccuWeather API key configured.\n\
         Hint: run `forecast configure` or set ACCUWEATHER_API_KEY."
    )]
    MissingApiKey,
}

impl LookupError {
    /// The single line shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Http { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN =>
            {
                format!(
                    "Weather service rejected the API key ({status}). \
                     Run `forecast configure` to update it."
                )
            }
            other => other.to_string(),
        }
    }
}
