//! Profile and delivery address route handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use freshbasket_core::{Address, AddressId, Email, ProfileUpdate, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::geocoder::Coordinates;
use crate::services::profile as profile_service;
use crate::state::AppState;

/// Profile display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub photo_url: Option<String>,
    pub addresses: Vec<Address>,
    pub selected_address: Option<Address>,
}

impl From<&UserProfile> for ProfileView {
    fn from(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            email: profile.email.as_ref().map(ToString::to_string),
            phone: profile.phone.clone(),
            photo_url: profile.photo_url.clone(),
            addresses: profile.addresses().to_vec(),
            selected_address: profile.selected_address().cloned(),
        }
    }
}

/// New delivery address: typed text or a map position.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NewAddress {
    Typed { details: String },
    Pinned { lat: f64, lng: f64 },
}

/// Address selection request.
#[derive(Debug, Deserialize)]
pub struct SelectAddress {
    pub address_id: AddressId,
}

/// Profile update request. The email is validated here so a bad address is
/// a 400 rather than a silently dropped field.
#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl TryFrom<UpdateProfile> for ProfileUpdate {
    type Error = AppError;

    fn try_from(form: UpdateProfile) -> Result<Self> {
        let email = form
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        Ok(Self {
            name: form.name.map(|n| n.trim().to_string()),
            phone: form.phone.map(|p| p.trim().to_string()),
            email,
        })
    }
}

async fn profile_view(state: &AppState) -> Option<ProfileView> {
    state
        .read(|stores| stores.profile.profile().map(ProfileView::from))
        .await
}

/// Show the profile; `null` when none is loaded.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<Option<ProfileView>> {
    Json(profile_view(&state).await)
}

/// Update name, phone or email.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    Json(form): Json<UpdateProfile>,
) -> Result<Json<ProfileView>> {
    let update = ProfileUpdate::try_from(form)?;
    let profile = profile_service::update_profile(&state, update).await?;
    Ok(Json(ProfileView::from(&profile)))
}

/// Add a delivery address and select it.
#[instrument(skip(state, body))]
pub async fn add_address(
    State(state): State<AppState>,
    Json(body): Json<NewAddress>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = match body {
        NewAddress::Typed { details } => {
            profile_service::add_address(&state, details.trim()).await
        }
        NewAddress::Pinned { lat, lng } => {
            let coords =
                Coordinates::new(lat, lng).map_err(|e| AppError::BadRequest(e.to_string()))?;
            profile_service::add_location(&state, coords).await
        }
    };
    Ok((StatusCode::CREATED, Json(address)))
}

/// Choose the delivery address. Unknown ids leave the selection as it was.
#[instrument(skip(state, body), fields(address_id = %body.address_id))]
pub async fn select_address(
    State(state): State<AppState>,
    Json(body): Json<SelectAddress>,
) -> Json<Option<ProfileView>> {
    profile_service::select_address(&state, &body.address_id).await;
    Json(profile_view(&state).await)
}
