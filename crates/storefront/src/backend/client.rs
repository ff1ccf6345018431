//! HTTP adapter for the document backend.

use async_trait::async_trait;
use freshbasket_core::{Order, ProfileRecord, ProfileUpdate, UserId};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;
use url::Url;

use super::{BackendError, OrderHistory, ProfileDocuments};
use crate::config::BackendConfig;

/// Client for the profile and order document endpoints.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| BackendError::Parse(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("Authorization", auth);
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// URL of a user's profile document.
    fn profile_url(&self, uid: &UserId) -> Result<Url, BackendError> {
        let path = format!("users/{}", urlencoding::encode(uid.as_str()));
        self.base_url
            .join(&path)
            .map_err(|e| BackendError::Parse(format!("Invalid profile URL: {e}")))
    }

    /// URL of the order query for a user.
    fn orders_url(&self, uid: &UserId) -> Result<Url, BackendError> {
        let mut url = self
            .base_url
            .join("orders")
            .map_err(|e| BackendError::Parse(format!("Invalid orders URL: {e}")))?;
        url.query_pairs_mut().append_pair("uid", uid.as_str());
        Ok(url)
    }
}

/// Turn a non-success response into `BackendError::Api`.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ProfileDocuments for BackendClient {
    #[instrument(skip(self), fields(uid = %uid))]
    async fn fetch_profile(&self, uid: &UserId) -> Result<Option<ProfileRecord>, BackendError> {
        let response = self.client.get(self.profile_url(uid)?).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let record = ensure_success(response)
            .await?
            .json::<ProfileRecord>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;
        Ok(Some(record))
    }

    #[instrument(skip(self, update), fields(uid = %uid))]
    async fn merge_profile(
        &self,
        uid: &UserId,
        update: &ProfileUpdate,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .patch(self.profile_url(uid)?)
            .json(update)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderHistory for BackendClient {
    #[instrument(skip(self), fields(uid = %uid))]
    async fn list_orders(&self, uid: &UserId) -> Result<Vec<Order>, BackendError> {
        let response = self.client.get(self.orders_url(uid)?).send().await?;

        ensure_success(response)
            .await?
            .json::<Vec<Order>>()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}
