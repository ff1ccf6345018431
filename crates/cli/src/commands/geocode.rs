//! One-off reverse geocode lookup.

use freshbasket_storefront::config::GeocoderConfig;
use freshbasket_storefront::services::geocoder::{Coordinates, NominatimClient, ReverseGeocoder};
use tracing::info;
use url::Url;

/// Reverse geocode a position and print the address.
///
/// # Errors
///
/// Returns an error if the coordinates or base URL are invalid, or the
/// geocoder call fails.
pub async fn lookup(
    lat: f64,
    lng: f64,
    base_url: Option<&str>,
    user_agent: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let coords = Coordinates::new(lat, lng)?;

    let mut config = GeocoderConfig::default();
    if let Some(base_url) = base_url {
        config.base_url = Url::parse(base_url)?;
    }
    if let Some(user_agent) = user_agent {
        config.user_agent = user_agent.to_string();
    }

    info!(base_url = %config.base_url, "Looking up {}", coords.display());
    let client = NominatimClient::new(&config)?;
    let address = client.reverse(coords).await?;

    info!(address = %address, "Resolved");
    Ok(())
}
