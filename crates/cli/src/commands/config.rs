//! Storefront configuration check.

use freshbasket_storefront::config::StorefrontConfig;
use tracing::info;

/// Load the storefront configuration from the environment and summarize it.
///
/// Secrets are never printed.
///
/// # Errors
///
/// Returns the first configuration problem found.
pub fn check() -> Result<(), Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;

    info!(addr = %config.socket_addr(), "Listen address");
    info!(backend = ?config.backend, "Backend");
    info!(merchant = %config.checkout.merchant_whatsapp, "Checkout");
    info!(
        geocoder = %config.geocoder.base_url,
        user_agent = %config.geocoder.user_agent,
        cooldown_ms = config.geocoder.cooldown.as_millis(),
        "Geocoder"
    );
    info!(
        sentry = config.sentry_dsn.is_some(),
        environment = config.sentry_environment.as_deref().unwrap_or("-"),
        "Error tracking"
    );
    info!("Configuration OK");
    Ok(())
}
