//! FreshBasket Storefront - headless app shell for the grocery app.
//!
//! This binary serves the JSON API the mobile view layer drives, on port
//! 3000 by default.
//!
//! # Architecture
//!
//! - Axum web framework, one in-process session per device
//! - Cart, profile and session stores from `freshbasket-core`
//! - Document backend for profiles and orders
//! - Nominatim reverse geocoding behind a cooldown
//! - WhatsApp deep link for order hand-off

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;

use freshbasket_storefront::config::StorefrontConfig;
use freshbasket_storefront::routes;
use freshbasket_storefront::state::AppState;
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tracing::{Level, Metadata};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "freshbasket_storefront=info,tower_http=debug";

/// Start Sentry when a DSN is configured. The guard flushes on drop.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Cow::Owned),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
        attach_stacktrace: true,
        ..Default::default()
    };
    Some(sentry::init((dsn, options)))
}

/// Warnings and errors become Sentry events, info and debug breadcrumbs.
fn sentry_filter(metadata: &Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        Level::TRACE => EventFilter::Ignore,
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let config = StorefrontConfig::from_env().expect("Invalid storefront configuration");

    // Sentry goes first so the tracing layer has a client to report to.
    let _sentry = init_sentry(&config);
    init_tracing();
    tracing::info!(sentry = config.sentry_dsn.is_some(), "Logging ready");

    let state = AppState::new(&config).expect("Failed to build backend clients");
    tracing::info!(
        backend = %config.backend.base_url,
        geocoder = %config.geocoder.base_url,
        cooldown_ms = config.geocoder.cooldown.as_millis(),
        "Collaborators configured"
    );

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Cannot bind listen address");
    tracing::info!(%addr, "Storefront listening");

    axum::serve(listener, routes::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server stopped with an error");

    tracing::info!("Storefront stopped");
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => tracing::info!("Interrupted, draining connections"),
        () = terminate => tracing::info!("Terminated, draining connections"),
    }
}
