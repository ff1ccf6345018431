//! Signed-in user's profile and delivery addresses.
//!
//! The store mirrors a remote profile document so the UI can add a delivery
//! address or switch the active one without waiting on a round trip. The
//! selected address is held as an [`AddressId`] and resolved against the
//! address list on read, so there is a single source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::Identity;
use crate::types::{AddressId, Email};

/// Label used when an address string has nothing to derive one from.
pub const FALLBACK_ADDRESS_LABEL: &str = "Selected location";

/// A delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    /// Short display name.
    pub label: String,
    /// Full human-readable address.
    pub details: String,
}

impl Address {
    /// Build an address whose label is derived from `details`.
    #[must_use]
    pub fn new(id: AddressId, details: impl Into<String>) -> Self {
        let details = details.into();
        Self {
            id,
            label: Self::label_for(&details),
            details,
        }
    }

    /// Everything before the first comma, or [`FALLBACK_ADDRESS_LABEL`] for
    /// an empty string.
    ///
    /// ```
    /// use freshbasket_core::Address;
    ///
    /// assert_eq!(Address::label_for("12 Green St, Springfield"), "12 Green St");
    /// assert_eq!(Address::label_for("Springfield"), "Springfield");
    /// assert_eq!(Address::label_for(""), "Selected location");
    /// ```
    #[must_use]
    pub fn label_for(details: &str) -> String {
        if details.is_empty() {
            return FALLBACK_ADDRESS_LABEL.to_owned();
        }
        details.split(',').next().unwrap_or_default().to_owned()
    }
}

/// Issues address ids from the wall clock.
///
/// Ids are millisecond timestamps, forced to be strictly increasing so two
/// addresses created in the same millisecond still get distinct ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressIdGenerator {
    last: i64,
}

impl AddressIdGenerator {
    /// Create a generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id for an address created at `now`.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> AddressId {
        let candidate = now.timestamp_millis().max(self.last.saturating_add(1));
        self.last = candidate;
        AddressId::new(candidate.to_string())
    }
}

/// The profile document as stored remotely.
///
/// Field names follow the document store's camelCase convention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub selected_address: Option<Address>,
}

/// Partial profile change; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.email.is_none()
    }
}

/// The locally known profile snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    addresses: Vec<Address>,
    selected: Option<AddressId>,
}

impl UserProfile {
    /// Build a snapshot from a fetched document.
    ///
    /// Blank strings become `None`. The document's denormalized
    /// `selectedAddress` is resolved by id; if the list does not contain it,
    /// it is appended so the selection still points at a listed address.
    #[must_use]
    pub fn from_record(record: ProfileRecord) -> Self {
        let mut profile = Self {
            name: non_blank(record.name),
            email: record.email.as_deref().and_then(Email::parse_optional),
            phone: non_blank(record.phone),
            photo_url: non_blank(record.photo_url),
            addresses: record.addresses,
            selected: None,
        };

        if let Some(selected) = record.selected_address {
            if !profile.addresses.iter().any(|a| a.id == selected.id) {
                profile.addresses.push(selected.clone());
            }
            profile.selected = Some(selected.id);
        }
        profile
    }

    /// Minimal profile for a user with no stored document.
    #[must_use]
    pub fn default_for(identity: &Identity) -> Self {
        Self {
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
            ..Self::default()
        }
    }

    /// Addresses in the order they were added.
    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// The active delivery address, if any.
    #[must_use]
    pub fn selected_address(&self) -> Option<&Address> {
        let id = self.selected.as_ref()?;
        self.addresses.iter().find(|a| &a.id == id)
    }

    /// Convert back to the document shape.
    #[must_use]
    pub fn to_record(&self) -> ProfileRecord {
        ProfileRecord {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.as_ref().map(ToString::to_string),
            photo_url: self.photo_url.clone(),
            addresses: self.addresses.clone(),
            selected_address: self.selected_address().cloned(),
        }
    }

    fn push_selected(&mut self, address: Address) -> Address {
        self.selected = Some(address.id.clone());
        self.addresses.push(address.clone());
        address
    }

    fn apply(&mut self, update: ProfileUpdate) {
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Holds the current [`UserProfile`], if any.
#[derive(Debug, Clone, Default)]
pub struct UserProfileStore {
    profile: Option<UserProfile>,
    ids: AddressIdGenerator,
    revision: u64,
}

impl UserProfileStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot.
    pub fn hydrate(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
        self.bump();
    }

    /// Append an address built from `details` and make it the selected one.
    ///
    /// Duplicates are allowed. With no profile loaded an empty one is created
    /// to hold the address.
    pub fn add_address(&mut self, details: &str, now: DateTime<Utc>) -> Address {
        let address = Address::new(self.ids.next_id(now), details);
        self.push(address)
    }

    /// Append a map location that has no address text, for instance because
    /// the reverse geocode was skipped.
    ///
    /// The label is [`FALLBACK_ADDRESS_LABEL`] and the details are the raw
    /// coordinates.
    pub fn add_unresolved_location(&mut self, lat: f64, lng: f64, now: DateTime<Utc>) -> Address {
        let address = Address {
            id: self.ids.next_id(now),
            label: FALLBACK_ADDRESS_LABEL.to_owned(),
            details: format!("{lat}, {lng}"),
        };
        self.push(address)
    }

    /// Make the address with `id` the selected one.
    ///
    /// Returns `false` and changes nothing if no such address exists.
    pub fn select_address(&mut self, id: &AddressId) -> bool {
        let Some(profile) = self.profile.as_mut() else {
            return false;
        };
        if !profile.addresses.iter().any(|a| &a.id == id) {
            return false;
        }
        profile.selected = Some(id.clone());
        self.bump();
        true
    }

    /// Merge a partial update into the loaded profile.
    ///
    /// Returns `false` if no profile is loaded.
    pub fn apply_update(&mut self, update: ProfileUpdate) -> bool {
        let Some(profile) = self.profile.as_mut() else {
            return false;
        };
        profile.apply(update);
        self.bump();
        true
    }

    /// Drop the profile (sign-out).
    pub fn clear(&mut self) {
        if self.profile.take().is_some() {
            self.bump();
        }
    }

    /// The loaded profile.
    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Shortcut for the active delivery address.
    #[must_use]
    pub fn selected_address(&self) -> Option<&Address> {
        self.profile.as_ref()?.selected_address()
    }

    /// Counter bumped by every mutation that changed the store.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    fn push(&mut self, address: Address) -> Address {
        self.revision = self.revision.wrapping_add(1);
        self.profile
            .get_or_insert_with(UserProfile::default)
            .push_selected(address)
    }

    const fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
