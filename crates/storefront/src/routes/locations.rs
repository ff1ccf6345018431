//! Map location lookup.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::geocoder::{self, Coordinates, LocationLookup};
use crate::state::AppState;

/// Map position to look up.
#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub lat: f64,
    pub lng: f64,
}

/// Reverse geocode the map pin; calls inside the cooldown come back as
/// `skipped`.
#[instrument(skip(state))]
pub async fn lookup(
    State(state): State<AppState>,
    Json(body): Json<LookupRequest>,
) -> Result<Json<LocationLookup>> {
    let coords =
        Coordinates::new(body.lat, body.lng).map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(Json(
        geocoder::lookup(state.geocoder(), state.cooldown(), coords).await,
    ))
}
