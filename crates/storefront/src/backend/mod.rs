//! Document backend collaborators.
//!
//! # Architecture
//!
//! - The backend is the source of truth for profile and order documents
//! - Stores only see the collaborator traits; [`BackendClient`] is the
//!   production adapter and tests plug in fakes
//!
//! # Documents
//!
//! ```text
//! GET   {base}/users/{uid}       profile document, 404 when absent
//! PATCH {base}/users/{uid}       merge name/phone/email
//! GET   {base}/orders?uid={uid}  order documents
//! ```

mod client;

pub use client::BackendClient;

use async_trait::async_trait;
use freshbasket_core::{Order, ProfileRecord, ProfileUpdate, UserId};
use thiserror::Error;

/// Errors that can occur when talking to the document backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the document shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Backend could not be reached or refused the call.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Profile documents keyed by user id.
#[async_trait]
pub trait ProfileDocuments: Send + Sync {
    /// Fetch a user's profile document; `Ok(None)` when none exists yet.
    async fn fetch_profile(&self, uid: &UserId) -> Result<Option<ProfileRecord>, BackendError>;

    /// Merge the set fields of `update` into the user's document.
    async fn merge_profile(&self, uid: &UserId, update: &ProfileUpdate)
    -> Result<(), BackendError>;
}

/// Placed orders.
#[async_trait]
pub trait OrderHistory: Send + Sync {
    /// Orders recorded for `uid`, in backend order.
    async fn list_orders(&self, uid: &UserId) -> Result<Vec<Order>, BackendError>;
}
