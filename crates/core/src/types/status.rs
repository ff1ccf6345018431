//! Status enums for orders and the session.

use serde::{Deserialize, Serialize};

/// Status of a placed order, as recorded by the merchant on the backend.
///
/// The backend stores a free-form label; unrecognised labels map to
/// [`OrderStatus::Unknown`] rather than failing the whole order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    Pending,
    /// Shown when the backend has not set a status yet.
    #[default]
    Processing,
    Confirmed,
    Delivered,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Confirmed => "Confirmed",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether the order has reached a final state.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where the session is in its authentication lifecycle.
///
/// ```text
/// Uninitialized ──► ReadyAnonymous ◄──► ReadyAuthenticated
///        └──────────────────────────────────────▲
/// ```
///
/// Nothing ever returns to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// The first identity event has not arrived yet.
    #[default]
    Uninitialized,
    /// Auth state is known and nobody is signed in.
    ReadyAnonymous,
    /// Auth state is known and a user is signed in.
    ReadyAuthenticated,
}

impl SessionPhase {
    /// Whether routing decisions may rely on the identity.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }
}
