//! Profile edits and delivery address management.

use chrono::Utc;
use freshbasket_core::{Address, AddressId, ProfileUpdate, UserProfile};
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::geocoder::{self, Coordinates, LocationLookup};
use crate::state::{AppState, StateError};

/// Merge `update` into the signed-in user's profile.
///
/// The backend is written first; the local snapshot changes only once the
/// write succeeded and the same session is still active.
///
/// # Errors
///
/// `Unauthorized` when signed out, `StateError::ProfileNotLoaded` before the
/// profile has been hydrated, and `Backend` when the document write fails.
#[instrument(skip(state, update))]
pub async fn update_profile(state: &AppState, update: ProfileUpdate) -> Result<UserProfile> {
    let (uid, revision) = state
        .read(|stores| {
            let uid = stores.session.identity().map(|i| i.uid.clone());
            (uid, stores.session.revision())
        })
        .await;
    let uid = uid.ok_or_else(|| AppError::Unauthorized("Sign in to edit your profile".into()))?;

    if update.is_empty() {
        return current_profile(state).await;
    }
    if state.read(|stores| stores.profile.profile().is_none()).await {
        return Err(StateError::ProfileNotLoaded.into());
    }

    state.profiles().merge_profile(&uid, &update).await?;

    state
        .update(|stores| {
            if stores.session.revision() != revision {
                tracing::debug!(uid = %uid, "Session changed during profile write");
            } else {
                stores.profile.apply_update(update);
            }
        })
        .await;

    add_breadcrumb("profile", "Updated profile", &[]);
    current_profile(state).await
}

/// The loaded profile.
///
/// # Errors
///
/// `StateError::ProfileNotLoaded` when no profile is held.
pub async fn current_profile(state: &AppState) -> Result<UserProfile> {
    state
        .read(|stores| stores.profile.profile().cloned())
        .await
        .ok_or_else(|| StateError::ProfileNotLoaded.into())
}

/// Add a typed delivery address and select it.
pub async fn add_address(state: &AppState, details: &str) -> Address {
    let address = state
        .update(|stores| stores.profile.add_address(details, Utc::now()))
        .await;
    tracing::info!(address_id = %address.id, label = %address.label, "Address added");
    address
}

/// Add a map-picked location as a delivery address and select it.
///
/// The location is reverse geocoded first. A failed lookup is still saved,
/// with [`geocoder::UNAVAILABLE_ADDRESS`] as its text. A lookup skipped by
/// the cooldown saves the raw coordinates under the fallback label.
pub async fn add_location(state: &AppState, coords: Coordinates) -> Address {
    match geocoder::lookup(state.geocoder(), state.cooldown(), coords).await {
        LocationLookup::Resolved { details } | LocationLookup::Unresolved { details } => {
            add_address(state, &details).await
        }
        LocationLookup::Skipped => {
            let address = state
                .update(|stores| {
                    stores
                        .profile
                        .add_unresolved_location(coords.lat(), coords.lng(), Utc::now())
                })
                .await;
            tracing::info!(address_id = %address.id, "Location added without an address");
            address
        }
    }
}

/// Select a delivery address. Unknown ids leave the selection unchanged.
pub async fn select_address(state: &AppState, id: &AddressId) -> bool {
    let selected = state.update(|stores| stores.profile.select_address(id)).await;
    if !selected {
        tracing::debug!(address_id = %id, "Ignoring selection of unknown address");
    }
    selected
}
