//! Authentication identity and readiness.
//!
//! The identity provider reports "who is signed in" asynchronously. Until its
//! first report arrives nobody knows whether a user is signed in, so screens
//! gate their routing on [`SessionStore::is_ready`] rather than on the
//! identity alone.

use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;
use crate::types::{Email, SessionPhase, UserId};

/// Minimal handle for the signed-in user, as confirmed by the identity
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "optional_email")]
    pub email: Option<Email>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Identity {
    /// Identity with only a user id.
    #[must_use]
    pub fn new(uid: impl Into<UserId>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            phone: None,
        }
    }

    /// Best contact handle: phone, then email.
    #[must_use]
    pub fn contact(&self) -> Option<&str> {
        self.phone
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.email.as_ref().map(Email::as_str))
    }
}

/// Identity providers send `""` for unknown emails; treat those as absent.
fn optional_email<'de, D>(deserializer: D) -> Result<Option<Email>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Email::parse_optional))
}

/// What the caller must do to the profile store after an identity change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileAction {
    /// Fetch this user's profile document and hydrate the profile store.
    Hydrate(Identity),
    /// Clear the profile store.
    Clear,
}

/// Tracks the authentication identity and whether it is known yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStore {
    identity: Option<Identity>,
    ready: bool,
    revision: u64,
}

impl SessionStore {
    /// Create an uninitialized session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an identity event.
    ///
    /// Every call marks the session ready, so the first event unblocks
    /// routing whether or not somebody is signed in. The returned action
    /// tells the caller what to do with the profile store; the cart is not
    /// touched.
    pub fn on_identity_changed(&mut self, identity: Option<Identity>) -> ProfileAction {
        self.ready = true;
        self.identity.clone_from(&identity);
        self.revision = self.revision.wrapping_add(1);

        identity.map_or(ProfileAction::Clear, ProfileAction::Hydrate)
    }

    /// Lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        match (self.ready, &self.identity) {
            (false, _) => SessionPhase::Uninitialized,
            (true, None) => SessionPhase::ReadyAnonymous,
            (true, Some(_)) => SessionPhase::ReadyAuthenticated,
        }
    }

    /// Whether the first identity event has been processed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// The signed-in identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Whether `uid` is still the signed-in user.
    #[must_use]
    pub fn is_current(&self, uid: &UserId) -> bool {
        self.identity.as_ref().is_some_and(|i| &i.uid == uid)
    }

    /// Counter bumped by every identity event.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }
}

/// Name to greet the user by.
///
/// Profile name, then the identity's display name, then the local part of
/// the email, then `"User"`.
#[must_use]
pub fn greeting_name(profile: Option<&UserProfile>, identity: Option<&Identity>) -> String {
    fn named(n: Option<&str>) -> Option<&str> {
        n.filter(|n| !n.is_empty())
    }

    named(profile.and_then(|p| p.name.as_deref()))
        .or_else(|| named(identity.and_then(|i| i.display_name.as_deref())))
        .or_else(|| {
            profile
                .and_then(|p| p.email.as_ref())
                .or_else(|| identity.and_then(|i| i.email.as_ref()))
                .map(Email::local_part)
        })
        .unwrap_or("User")
        .to_owned()
}

/// Uppercase first character of `name`, for avatar badges.
#[must_use]
pub fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}
