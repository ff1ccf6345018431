//! Request errors and Sentry helpers.
//!
//! Handlers return [`AppError`]. Upstream failures are reported to Sentry and
//! answered with a generic message; client mistakes are answered as is.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use freshbasket_core::Identity;
use thiserror::Error;

use crate::backend::BackendError;
use crate::services::checkout::CheckoutError;
use crate::state::StateError;

/// Errors a storefront handler can answer with.
#[derive(Debug, Error)]
pub enum AppError {
    /// Profile or order backend failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Order hand-off could not be prepared.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Stores are not in a state that allows the command.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Checkout(err) => match err {
                CheckoutError::LoginRequired => StatusCode::UNAUTHORIZED,
                CheckoutError::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::InvalidLink(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::State(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::Checkout(CheckoutError::InvalidLink(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, %status, sentry_event_id = %event_id, "Handler failed");
        }

        let message = match &self {
            Self::Backend(_) => "External service error".to_owned(),
            Self::Checkout(CheckoutError::InvalidLink(_)) => "Internal server error".to_owned(),
            Self::Checkout(err) => err.to_string(),
            Self::State(err) => err.to_string(),
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Handler result.
pub type Result<T> = std::result::Result<T, AppError>;

/// Attach the signed-in identity to every Sentry event from now on.
pub fn set_sentry_user(identity: &Identity) {
    let user = sentry::User {
        id: Some(identity.uid.to_string()),
        email: identity.email.as_ref().map(ToString::to_string),
        username: identity.display_name.clone(),
        ..Default::default()
    };
    sentry::configure_scope(move |scope| scope.set_user(Some(user)));
}

/// Forget the Sentry user after sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a store command as a Sentry breadcrumb.
///
/// `fields` become breadcrumb data, e.g. `&[("product_id", "42")]`.
pub fn add_breadcrumb(store: &str, action: &str, fields: &[(&str, &str)]) {
    let data = fields
        .iter()
        .map(|&(key, value)| (key.to_owned(), serde_json::Value::from(value)))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(store.to_owned()),
        message: Some(action.to_owned()),
        data,
        ..Default::default()
    });
}
