//! Reacting to identity changes.
//!
//! The identity provider calls in with the signed-in identity (or `None`)
//! whenever it changes. [`SessionService`] records the transition, clears
//! or refetches the profile, and keeps a slow profile fetch from
//! overwriting state that belongs to a later identity.

use freshbasket_core::{Identity, ProfileAction, UserProfile};
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::state::AppState;

/// What happened to the profile store after an identity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hydration {
    /// Signed out; the profile was cleared.
    Cleared,
    /// The stored profile document was loaded.
    Loaded,
    /// No document, or the fetch failed; a profile was built from the identity.
    Defaulted,
    /// Another identity event arrived while fetching; the result was dropped.
    Stale,
}

/// Applies identity events to the stores.
#[derive(Clone)]
pub struct SessionService {
    state: AppState,
}

impl SessionService {
    #[must_use]
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Handle an identity change.
    ///
    /// The cart is never touched. A failed profile fetch degrades to
    /// [`UserProfile::default_for`] and is only logged.
    #[instrument(skip(self, identity), fields(uid = identity.as_ref().map(|i| i.uid.as_str())))]
    pub async fn on_identity_changed(&self, identity: Option<Identity>) -> Hydration {
        let (action, revision) = self
            .state
            .update(|stores| {
                let previous = stores.session.identity().map(|i| i.uid.clone());
                let action = stores.session.on_identity_changed(identity);
                // Drop the old profile unless the same user was re-announced.
                let same_user = matches!(
                    (&action, &previous),
                    (ProfileAction::Hydrate(next), Some(prev)) if &next.uid == prev
                );
                if !same_user {
                    stores.profile.clear();
                }
                (action, stores.session.revision())
            })
            .await;

        let identity = match action {
            ProfileAction::Clear => {
                clear_sentry_user();
                tracing::info!("Signed out, profile cleared");
                return Hydration::Cleared;
            }
            ProfileAction::Hydrate(identity) => identity,
        };

        set_sentry_user(&identity);

        let (profile, outcome) = match self.state.profiles().fetch_profile(&identity.uid).await {
            Ok(Some(record)) => (UserProfile::from_record(record), Hydration::Loaded),
            Ok(None) => {
                tracing::info!("No profile document, using identity defaults");
                (UserProfile::default_for(&identity), Hydration::Defaulted)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch failed, using identity defaults");
                (UserProfile::default_for(&identity), Hydration::Defaulted)
            }
        };

        let applied = self
            .state
            .update(|stores| {
                if stores.session.revision() != revision {
                    return false;
                }
                stores.profile.hydrate(profile);
                true
            })
            .await;

        if applied {
            outcome
        } else {
            tracing::debug!("Identity changed during profile fetch, discarding result");
            Hydration::Stale
        }
    }
}
