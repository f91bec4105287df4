use async_trait::async_trait;
use forecast_core::{Coordinates, GeolocationError, Geolocator, IpGeolocator};
use inquire::Confirm;
use std::sync::atomic::{AtomicBool, Ordering};

/// Asks once per session before sharing the IP-derived position.
#[derive(Debug)]
pub struct PromptedGeolocator {
    inner: IpGeolocator,
    granted: AtomicBool,
}

impl PromptedGeolocator {
    pub fn new(inner: IpGeolocator) -> Self {
        Self { inner, granted: AtomicBool::new(false) }
    }

    async fn ask(&self) -> Result<bool, GeolocationError> {
        let answer = tokio::task::spawn_blocking(|| {
            Confirm::new("Look up your approximate location from your IP address?")
                .with_default(true)
                .prompt()
        })
        .await
        .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        // Esc / Ctrl-C at the prompt counts as a refusal.
        Ok(answer.unwrap_or(false))
    }
}

#[async_trait]
impl Geolocator for PromptedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        if !self.granted.load(Ordering::Relaxed) {
            if !self.ask().await? {
                return Err(GeolocationError::Denied);
            }
            self.granted.store(true, Ordering::Relaxed);
        }
        self.inner.current_position().await
    }
}
