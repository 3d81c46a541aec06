//! Bearer-token user lookup against the hosted auth endpoint.

use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::client::{StoreClient, StoreError, StoreResult};

/// The authenticated user behind an access token.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthUser {
    /// User id, used as `usuario_id` on rows.
    pub id: Uuid,
    /// Account email, used as the import fallback for `registrado_por`.
    #[serde(default)]
    pub email: Option<String>,
}

impl StoreClient {
    /// Resolve an access token to its user via `GET /auth/v1/user`.
    ///
    /// An invalid or expired token comes back as [`StoreError::Rejected`]
    /// with the service's 401.
    #[instrument(skip_all)]
    pub async fn fetch_user(&self, access_token: &str) -> StoreResult<AuthUser> {
        let response = self
            .http()
            .get(self.auth_url())
            .headers(self.headers(Some(access_token))?)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| StoreError::UnexpectedResponse(format!("decoding auth user: {e}")))
    }
}
