//! Token refresh: trade the refresh token for a new access token.

use http::{HeaderValue, header::CONTENT_TYPE};
use shared::models::{RefreshTokenRequest, RefreshTokenResponse};
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, ClientResult},
    http::ApiRequest,
    session::SessionManager,
};

/// Refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh-token";

impl SessionManager {
    /// Ask the backend for a new access token using the stored refresh token.
    ///
    /// Makes at most one request and never retries. Only the access token is
    /// replaced; the refresh token is never modified. On any failure the
    /// session is left untouched.
    ///
    /// # Errors
    /// * [`ClientError::MissingRefreshToken`] without a network call when none is held.
    /// * [`ClientError::RefreshRejected`] on a non-2xx answer.
    /// * [`ClientError::Network`] when the request does not complete.
    /// * [`ClientError::MalformedResponse`] when the body holds no usable token.
    pub async fn refresh_access_token(&self) -> ClientResult<()> {
        let Some(refresh_token) = self.refresh_token().filter(|token| !token.is_empty()) else {
            debug!("no refresh token held, skipping refresh");
            return Err(ClientError::MissingRefreshToken);
        };

        let request = ApiRequest::post(self.api_url(REFRESH_PATH))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(&RefreshTokenRequest { refresh_token })
            .map_err(ClientError::Encode)?;

        let response = self.transport().send(request).await.map_err(|err| {
            warn!(error = %err, "token refresh request did not complete");
            ClientError::from(err)
        })?;

        if !response.is_success() {
            warn!(status = %response.status, "token refresh rejected");
            return Err(ClientError::RefreshRejected(response.status));
        }

        let body: RefreshTokenResponse = response
            .json()
            .map_err(|err| ClientError::MalformedResponse(err.to_string()))?;
        if body.access_token.is_empty() {
            return Err(ClientError::MalformedResponse(
                "refresh response did not include an access token".to_string(),
            ));
        }

        self.save_tokens(Some(&body.access_token), None)?;
        info!("access token refreshed");
        Ok(())
    }
}
