//! Application state shared across handlers.
//!
//! One [`AppState`] backs one device session. It owns the three stores
//! behind a single mutex, the collaborator adapters, and a broadcast channel
//! that announces every store change to whoever renders it.

use std::sync::Arc;

use freshbasket_core::{CartStore, SessionStore, UserProfileStore};
use serde::Serialize;
use tokio::sync::{Mutex, broadcast};

use crate::backend::{BackendClient, BackendError, OrderHistory, ProfileDocuments};
use crate::config::{CheckoutConfig, StorefrontConfig};
use crate::services::geocoder::{GeocodeCooldown, GeocodeError, NominatimClient, ReverseGeocoder};

/// Buffered events per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 64;

/// Error creating the collaborator adapters.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("backend client: {0}")]
    Backend(#[from] BackendError),
    #[error("geocoder client: {0}")]
    Geocoder(#[from] GeocodeError),
}

/// Store state that does not allow a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("Session is still starting up")]
    SessionNotReady,
    #[error("Profile is still loading")]
    ProfileNotLoaded,
}

/// Change notification published after a store mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "store", rename_all = "snake_case")]
pub enum StoreEvent {
    CartChanged { revision: u64 },
    ProfileChanged { revision: u64 },
    SessionChanged { revision: u64 },
}

/// The client-side stores.
#[derive(Debug, Default)]
pub struct Stores {
    pub cart: CartStore,
    pub profile: UserProfileStore,
    pub session: SessionStore,
}

impl Stores {
    const fn revisions(&self) -> (u64, u64, u64) {
        (
            self.cart.revision(),
            self.profile.revision(),
            self.session.revision(),
        )
    }
}

/// External services the stores depend on.
#[derive(Clone)]
pub struct Collaborators {
    pub profiles: Arc<dyn ProfileDocuments>,
    pub orders: Arc<dyn OrderHistory>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
}

impl Collaborators {
    /// Production adapters built from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &StorefrontConfig) -> Result<Self, InitError> {
        let backend = Arc::new(BackendClient::new(&config.backend)?);
        let geocoder = Arc::new(NominatimClient::new(&config.geocoder)?);

        Ok(Self {
            profiles: backend.clone(),
            orders: backend,
            geocoder,
        })
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    checkout: CheckoutConfig,
    stores: Mutex<Stores>,
    events: broadcast::Sender<StoreEvent>,
    collaborators: Collaborators,
    cooldown: GeocodeCooldown,
}

impl AppState {
    /// Create a new application state with production adapters.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, InitError> {
        let collaborators = Collaborators::from_config(config)?;
        Ok(Self::with_collaborators(
            config.checkout.clone(),
            GeocodeCooldown::new(config.geocoder.cooldown),
            collaborators,
        ))
    }

    /// Create a state around the given adapters.
    #[must_use]
    pub fn with_collaborators(
        checkout: CheckoutConfig,
        cooldown: GeocodeCooldown,
        collaborators: Collaborators,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(AppStateInner {
                checkout,
                stores: Mutex::new(Stores::default()),
                events,
                collaborators,
                cooldown,
            }),
        }
    }

    /// Get a reference to the checkout configuration.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutConfig {
        &self.inner.checkout
    }

    /// Profile document store.
    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileDocuments {
        self.inner.collaborators.profiles.as_ref()
    }

    /// Order history source.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderHistory {
        self.inner.collaborators.orders.as_ref()
    }

    /// Reverse geocoder.
    #[must_use]
    pub fn geocoder(&self) -> &dyn ReverseGeocoder {
        self.inner.collaborators.geocoder.as_ref()
    }

    /// Geocoder call guard.
    #[must_use]
    pub fn cooldown(&self) -> &GeocodeCooldown {
        &self.inner.cooldown
    }

    /// Receive a [`StoreEvent`] for every subsequent store change.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Read the stores.
    pub async fn read<R>(&self, f: impl FnOnce(&Stores) -> R) -> R {
        let stores = self.inner.stores.lock().await;
        f(&stores)
    }

    /// Mutate the stores atomically and publish an event for each store
    /// whose revision moved.
    ///
    /// `f` runs with the lock held, so it must not block.
    pub async fn update<R>(&self, f: impl FnOnce(&mut Stores) -> R) -> R {
        let mut stores = self.inner.stores.lock().await;
        let (cart, profile, session) = stores.revisions();
        let out = f(&mut stores);
        let after = stores.revisions();
        drop(stores);

        if after.2 != session {
            self.publish(StoreEvent::SessionChanged { revision: after.2 });
        }
        if after.1 != profile {
            self.publish(StoreEvent::ProfileChanged { revision: after.1 });
        }
        if after.0 != cart {
            self.publish(StoreEvent::CartChanged { revision: after.0 });
        }
        out
    }

    fn publish(&self, event: StoreEvent) {
        // No subscribers is not an error.
        if self.inner.events.send(event).is_err() {
            tracing::trace!(?event, "No store subscribers");
        }
    }
}
