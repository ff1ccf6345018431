//! Reverse geocoding for map-picked delivery locations.
//!
//! The map screen asks for an address every time the pin settles. The
//! public Nominatim service allows roughly one request per second, so calls
//! go through a [`GeocodeCooldown`] and anything inside the window is
//! skipped rather than queued.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::GeocoderConfig;

/// Errors from the reverse geocoder.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Service answered with something other than JSON.
    #[error("Expected a JSON response, got {0}")]
    NotJson(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Latitude or longitude out of range.
    #[error("Invalid coordinates: {lat}, {lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },
}

/// A validated map position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    /// Validate a latitude/longitude pair.
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::InvalidCoordinates` for non-finite or
    /// out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeocodeError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(GeocodeError::InvalidCoordinates { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// `"lat, lng"` to six decimals, shown when no address is known.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Turns coordinates into a human-readable address.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Look up the address at `coords`.
    async fn reverse(&self, coords: Coordinates) -> Result<String, GeocodeError>;
}

/// Client for a Nominatim-compatible `/reverse` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimClient {
    /// Create a new geocoder client.
    ///
    /// # Errors
    ///
    /// Returns error if the user agent is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| GeocodeError::Parse(format!("Invalid user agent: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn reverse_url(&self, coords: Coordinates) -> Result<Url, GeocodeError> {
        let mut url = self
            .base_url
            .join("reverse")
            .map_err(|e| GeocodeError::Parse(format!("Invalid geocoder URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &coords.lat.to_string())
            .append_pair("lon", &coords.lng.to_string())
            .append_pair("addressdetails", "1");
        Ok(url)
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    #[instrument(skip(self), fields(lat = coords.lat, lng = coords.lng))]
    async fn reverse(&self, coords: Coordinates) -> Result<String, GeocodeError> {
        let response = self.client.get(self.reverse_url(coords)?).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if !content_type.contains("json") {
            return Err(GeocodeError::NotJson(content_type));
        }

        let body: ReverseResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        Ok(body
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| coords.display()))
    }
}

/// Minimum gap between geocoder calls.
///
/// Backed by a one-cell `governor` limiter. A zero period disables the
/// guard.
pub struct GeocodeCooldown {
    period: Duration,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl GeocodeCooldown {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            limiter: Quota::with_period(period).map(RateLimiter::direct),
        }
    }

    /// Claim the next call slot; `false` inside the cooldown window.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        self.limiter.as_ref().is_none_or(|l| l.check().is_ok())
    }

    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }
}

impl fmt::Debug for GeocodeCooldown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeocodeCooldown")
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

/// Shown in place of an address when the geocoder fails.
pub const UNAVAILABLE_ADDRESS: &str = "Address not available";

/// Outcome of a guarded lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LocationLookup {
    /// The geocoder returned an address.
    Resolved { details: String },
    /// Called inside the cooldown window; nothing was sent.
    Skipped,
    /// The geocoder failed; `details` is [`UNAVAILABLE_ADDRESS`].
    Unresolved { details: String },
}

/// Reverse geocode `coords` unless the cooldown says to skip.
pub async fn lookup(
    geocoder: &dyn ReverseGeocoder,
    cooldown: &GeocodeCooldown,
    coords: Coordinates,
) -> LocationLookup {
    if !cooldown.try_acquire() {
        tracing::debug!(lat = coords.lat, lng = coords.lng, "Geocode skipped inside cooldown");
        return LocationLookup::Skipped;
    }

    match geocoder.reverse(coords).await {
        Ok(details) => LocationLookup::Resolved { details },
        Err(e) => {
            tracing::warn!(error = %e, lat = coords.lat, lng = coords.lng, "Reverse geocode failed");
            LocationLookup::Unresolved {
                details: UNAVAILABLE_ADDRESS.to_owned(),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Fixed {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Fixed {
        const fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl ReverseGeocoder for Fixed {
        async fn reverse(&self, _coords: Coordinates) -> Result<String, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(GeocodeError::NotJson("text/html".into()))
            } else {
                Ok("12 Green St, Springfield".into())
            }
        }
    }

    fn spot() -> Coordinates {
        Coordinates::new(12.971_599, 77.594_566).unwrap()
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert_eq!(spot().display(), "12.971599, 77.594566");
    }

    #[test]
    fn test_reverse_url() {
        let client = NominatimClient::new(&GeocoderConfig::default()).unwrap();
        let url = client
            .reverse_url(Coordinates::new(12.5, 77.25).unwrap())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://nominatim.openstreetmap.org/reverse?format=jsonv2&lat=12.5&lon=77.25&addressdetails=1"
        );
    }

    #[test]
    fn test_cooldown_blocks_second_call() {
        let cooldown = GeocodeCooldown::new(Duration::from_secs(60));
        assert!(cooldown.try_acquire());
        assert!(!cooldown.try_acquire());
    }

    #[test]
    fn test_zero_cooldown_never_blocks() {
        let cooldown = GeocodeCooldown::new(Duration::ZERO);
        assert!(cooldown.try_acquire());
        assert!(cooldown.try_acquire());
    }

    #[tokio::test]
    async fn test_lookup_skips_inside_window() {
        let geocoder = Fixed::new(false);
        let cooldown = GeocodeCooldown::new(Duration::from_secs(60));

        assert_eq!(
            lookup(&geocoder, &cooldown, spot()).await,
            LocationLookup::Resolved {
                details: "12 Green St, Springfield".into()
            }
        );
        assert_eq!(lookup(&geocoder, &cooldown, spot()).await, LocationLookup::Skipped);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_unresolved() {
        let geocoder = Fixed::new(true);
        let cooldown = GeocodeCooldown::new(Duration::ZERO);

        assert_eq!(
            lookup(&geocoder, &cooldown, spot()).await,
            LocationLookup::Unresolved {
                details: "Address not available".into()
            }
        );
    }

    #[tokio::test]
    async fn test_cooldown_reopens_after_period() {
        let cooldown = GeocodeCooldown::new(Duration::from_millis(20));
        assert!(cooldown.try_acquire());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cooldown.try_acquire());
    }
}
