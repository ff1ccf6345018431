//! Session route handlers.

use axum::{Json, extract::State};
use freshbasket_core::{Identity, SessionPhase, greeting_name, initial};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::services::SessionService;
use crate::state::{AppState, Stores};

/// What the view layer needs to route and greet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub ready: bool,
    pub phase: SessionPhase,
    pub identity: Option<Identity>,
    pub greeting: String,
    pub initial: String,
    pub revision: u64,
}

impl From<&Stores> for SessionView {
    fn from(stores: &Stores) -> Self {
        let greeting = greeting_name(stores.profile.profile(), stores.session.identity());
        Self {
            ready: stores.session.is_ready(),
            phase: stores.session.phase(),
            identity: stores.session.identity().cloned(),
            initial: initial(&greeting),
            greeting,
            revision: stores.session.revision(),
        }
    }
}

fn session_view(stores: &Stores) -> SessionView {
    SessionView::from(stores)
}

/// Show the session.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.read(session_view).await)
}

/// Identity event from the identity provider; `null` means signed out.
///
/// Answers once the profile has been hydrated or cleared.
#[instrument(skip(state, identity))]
pub async fn identity_changed(
    State(state): State<AppState>,
    Json(identity): Json<Option<Identity>>,
) -> Json<SessionView> {
    let hydration = SessionService::new(state.clone())
        .on_identity_changed(identity)
        .await;
    tracing::info!(?hydration, "Identity change applied");
    Json(state.read(session_view).await)
}
