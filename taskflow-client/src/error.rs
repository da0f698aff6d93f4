//! Client error type.

use http::StatusCode;
use thiserror::Error;

use crate::{http::TransportError, store::StorageError};

/// Result alias used across the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// Everything that can go wrong talking to the backend as a session.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Login or registration was rejected; carries the server's message.
    #[error("{0}")]
    Credentials(String),

    /// The request never produced a response.
    #[error("network error, please try again: {0}")]
    Network(String),

    /// The access token was rejected and could not be refreshed.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// The backend answered with a body we could not understand.
    #[error("unexpected response from server: {0}")]
    MalformedResponse(String),

    /// An authenticated call was attempted with no access token in memory.
    #[error("no access token available")]
    MissingAccessToken,

    /// A refresh was attempted with no refresh token in memory.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint answered with a non-2xx status.
    #[error("token refresh rejected with status {0}")]
    RefreshRejected(StatusCode),

    /// A feature endpoint answered with a non-2xx status.
    #[error("request failed with status {status}: {message}")]
    Api {
        /// Status returned by the server.
        status: StatusCode,
        /// Server detail, or the canonical reason phrase.
        message: String,
    },

    /// The stored access token contains bytes that cannot go in a header.
    #[error("stored access token is not a valid header value")]
    InvalidAccessToken,

    /// A request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The persisted session store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        Self::Network(err.to_string())
    }
}

impl ClientError {
    /// `true` when the caller must authenticate again before retrying.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired | Self::MissingAccessToken | Self::MissingRefreshToken
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_become_network_errors() {
        let err = ClientError::from(TransportError::Request("connection refused".into()));
        assert!(matches!(err, ClientError::Network(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn credential_message_is_verbatim() {
        let err = ClientError::Credentials("Invalid credentials".into());
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn requires_login_classification() {
        assert!(ClientError::SessionExpired.requires_login());
        assert!(ClientError::MissingAccessToken.requires_login());
        assert!(!ClientError::Network("down".into()).requires_login());
        assert!(
            !ClientError::Api {
                status: StatusCode::NOT_FOUND,
                message: "Task not found".into(),
            }
            .requires_login()
        );
    }
}
