use serde::{Deserialize, Serialize};

/// Credentials posted to `/auth/login`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email address.
    pub email: String,
    /// Plain-text password; only ever sent over the wire.
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token pair returned by a successful login.
///
/// Older backends only return the access token, so the refresh token is optional.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// Bearer token for authenticated requests.
    pub access_token: String,
    /// Long-lived token used to mint new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token scheme, normally `bearer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Body posted to `/auth/refresh-token`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshTokenRequest {
    /// The refresh token currently held by the session.
    pub refresh_token: String,
}

impl std::fmt::Debug for RefreshTokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenRequest")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Response from `/auth/refresh-token`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshTokenResponse {
    /// Freshly issued access token.
    pub access_token: String,
}

impl std::fmt::Debug for RefreshTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenResponse")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_accepts_missing_refresh_token() {
        let json = r#"{"access_token":"A1","token_type":"bearer"}"#;
        let tokens: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.access_token, "A1");
        assert_eq!(tokens.refresh_token, None);
        assert_eq!(tokens.token_type.as_deref(), Some("bearer"));
    }

    #[test]
    fn token_response_reads_full_pair() {
        let json = r#"{"access_token":"A1","refresh_token":"R1"}"#;
        let tokens: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.refresh_token.as_deref(), Some("R1"));
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let login = LoginRequest {
            email: "a@b.com".to_string(),
            password: "hunter2".to_string(),
        };
        let tokens = TokenResponse {
            access_token: "secret-access".to_string(),
            refresh_token: Some("secret-refresh".to_string()),
            token_type: None,
        };

        let rendered = format!("{login:?} {tokens:?}");
        assert!(rendered.contains("a@b.com"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }

    #[test]
    fn refresh_request_serializes_snake_case() {
        let request = RefreshTokenRequest {
            refresh_token: "R1".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"refresh_token":"R1"}"#
        );
    }
}
