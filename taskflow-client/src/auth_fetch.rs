//! Authenticated request wrapper.
//!
//! The one place that recovers from an expired access token. Feature code
//! (see [`TaskApi`](crate::TaskApi)) must send through here rather than
//! calling the transport itself.

use http::{
    HeaderValue, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, ClientResult},
    http::{ApiRequest, ApiResponse},
    session::SessionManager,
};

impl SessionManager {
    /// Send `request` as the current session.
    ///
    /// Adds `Authorization: Bearer <token>` and defaults `Content-Type` to
    /// JSON when the caller did not set one. A `401` triggers one refresh and
    /// one replay with the new token; the replayed response is returned as is,
    /// even if it is another `401`. Any other status is returned untouched for
    /// the caller to interpret.
    ///
    /// # Errors
    /// * [`ClientError::MissingAccessToken`] without a network call when not logged in.
    /// * [`ClientError::SessionExpired`] after a `401` whose refresh failed; the
    ///   session has been logged out by then.
    /// * [`ClientError::Network`] when a request never got a response.
    pub async fn auth_fetch(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let token = self
            .access_token()
            .filter(|token| !token.is_empty())
            .ok_or(ClientError::MissingAccessToken)?;

        let request = ApiRequest {
            url: self.api_url(&request.url),
            ..request
        };

        debug!(method = %request.method, url = %request.url, "authenticated request");
        let response = self
            .transport()
            .send(authorize(&request, &token)?)
            .await?;

        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        info!(url = %request.url, "access token rejected, attempting refresh");
        if let Err(err) = self.refresh_access_token().await {
            warn!(error = %err, "refresh failed, ending session");
            self.logout();
            return Err(ClientError::SessionExpired);
        }

        let token = self
            .access_token()
            .filter(|token| !token.is_empty())
            .ok_or(ClientError::MissingAccessToken)?;
        debug!(method = %request.method, url = %request.url, "replaying with refreshed token");
        Ok(self.transport().send(authorize(&request, &token)?).await?)
    }
}

/// Copy of `request` carrying the bearer token and a default content type.
fn authorize(request: &ApiRequest, token: &str) -> ClientResult<ApiRequest> {
    let mut authorized = request.clone();
    let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| ClientError::InvalidAccessToken)?;
    authorized.headers.insert(AUTHORIZATION, bearer);
    if !authorized.headers.contains_key(CONTENT_TYPE) {
        authorized
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(authorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        guard::Route,
        http::{MockHttpTransport, TransportError},
        session::SessionEvent,
        store::{ACCESS_TOKEN_KEY, MemoryStore, REFRESH_TOKEN_KEY, SessionStore},
        test_support::{json_response, manager_with},
    };
    use serde_json::json;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    const TASKS_URL: &str = "http://api.test/tasks/";
    const REFRESH_URL: &str = "http://api.test/auth/refresh-token";

    fn bearer(request: &ApiRequest) -> String {
        request
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    fn hydrated_store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::with_entries([
            (ACCESS_TOKEN_KEY, "A1"),
            (REFRESH_TOKEN_KEY, "R1"),
        ]))
    }

    #[tokio::test]
    async fn no_access_token_means_no_request() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();
        let session = manager_with(transport, Arc::new(MemoryStore::new()));

        let err = session.auth_fetch(ApiRequest::get("/tasks/")).await.unwrap_err();
        assert!(matches!(err, ClientError::MissingAccessToken));
    }

    #[tokio::test]
    async fn ok_response_is_returned_after_one_request() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url == TASKS_URL && bearer(req) == "Bearer A1")
            .times(1)
            .returning(|_| Ok(json_response(StatusCode::OK, &json!([]))));
        transport
            .expect_send()
            .withf(|req| req.url == REFRESH_URL)
            .never();
        let session = manager_with(transport, hydrated_store());
        session.initialize().unwrap();

        let response = session.auth_fetch(ApiRequest::get("/tasks/")).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn other_error_statuses_pass_through_without_refresh() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url == "http://api.test/tasks/9")
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    StatusCode::NOT_FOUND,
                    &json!({ "detail": "Task not found" }),
                ))
            });
        let session = manager_with(transport, hydrated_store());
        session.initialize().unwrap();

        let response = session.auth_fetch(ApiRequest::get("/tasks/9")).await.unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn unauthorized_then_refresh_replays_with_new_token() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut transport = MockHttpTransport::new();
        let task_calls = Arc::clone(&calls);
        let task_headers = Arc::clone(&seen);
        transport
            .expect_send()
            .withf(|req| req.url == TASKS_URL)
            .times(2)
            .returning(move |req| {
                task_headers.lock().unwrap().push(bearer(&req));
                if task_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(json_response(
                        StatusCode::UNAUTHORIZED,
                        &json!({ "detail": "Token expired" }),
                    ))
                } else {
                    Ok(json_response(StatusCode::OK, &json!([{ "id": 1 }])))
                }
            });
        transport
            .expect_send()
            .withf(|req| req.url == REFRESH_URL)
            .times(1)
            .returning(|_| {
                Ok(json_response(StatusCode::OK, &json!({ "access_token": "A2" })))
            });
        let store = hydrated_store();
        let session = manager_with(transport, store.clone());
        session.initialize().unwrap();

        let response = session.auth_fetch(ApiRequest::get("/tasks/")).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*seen.lock().unwrap(), vec!["Bearer A1", "Bearer A2"]);
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("A2"));
    }

    #[tokio::test]
    async fn second_unauthorized_is_passed_through() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url == TASKS_URL)
            .times(2)
            .returning(|_| {
                Ok(json_response(
                    StatusCode::UNAUTHORIZED,
                    &json!({ "detail": "Not authenticated" }),
                ))
            });
        transport
            .expect_send()
            .withf(|req| req.url == REFRESH_URL)
            .times(1)
            .returning(|_| {
                Ok(json_response(StatusCode::OK, &json!({ "access_token": "A2" })))
            });
        let session = manager_with(transport, hydrated_store());
        session.initialize().unwrap();

        let response = session.auth_fetch(ApiRequest::get("/tasks/")).await.unwrap();

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn failed_refresh_logs_out_without_retry() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url == TASKS_URL)
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::UNAUTHORIZED, Vec::new())));
        transport
            .expect_send()
            .withf(|req| req.url == REFRESH_URL)
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::UNAUTHORIZED, Vec::new())));
        let store = hydrated_store();
        let session = manager_with(transport, store.clone());
        session.initialize().unwrap();
        let routes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&routes);
        session.subscribe(move |event| {
            if let SessionEvent::Navigate(route) = event {
                sink.lock().unwrap().push(*route);
            }
        });

        let err = session.auth_fetch(ApiRequest::get("/tasks/")).await.unwrap_err();

        assert!(matches!(err, ClientError::SessionExpired));
        assert!(!session.is_authenticated());
        assert!(store.is_empty().unwrap());
        assert_eq!(*routes.lock().unwrap(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn unauthorized_without_refresh_token_logs_out() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url == TASKS_URL)
            .times(1)
            .returning(|_| Ok(ApiResponse::new(StatusCode::UNAUTHORIZED, Vec::new())));
        let store = Arc::new(MemoryStore::with_entries([(ACCESS_TOKEN_KEY, "A1")]));
        let session = manager_with(transport, store.clone());
        session.initialize().unwrap();

        let err = session.auth_fetch(ApiRequest::get("/tasks/")).await.unwrap_err();

        assert!(matches!(err, ClientError::SessionExpired));
        assert!(!session.is_authenticated());
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn network_failure_skips_refresh() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|req| req.url == TASKS_URL)
            .times(1)
            .returning(|_| Err(TransportError::Request("connection reset".into())));
        transport
            .expect_send()
            .withf(|req| req.url == REFRESH_URL)
            .never();
        let session = manager_with(transport, hydrated_store());
        session.initialize().unwrap();

        let err = session.auth_fetch(ApiRequest::get("/tasks/")).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert!(session.is_authenticated());
    }

    #[test]
    fn caller_content_type_wins_but_authorization_does_not() {
        let request = ApiRequest::post("http://api.test/tasks/")
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .header(AUTHORIZATION, HeaderValue::from_static("Basic abc"));

        let authorized = authorize(&request, "A1").unwrap();
        assert_eq!(authorized.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(authorized.headers.get(AUTHORIZATION).unwrap(), "Bearer A1");

        let defaulted = authorize(&ApiRequest::get("http://api.test/tasks/"), "A1").unwrap();
        assert_eq!(
            defaulted.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn token_with_control_characters_is_rejected() {
        let err = authorize(&ApiRequest::get("http://api.test/"), "bad\ntoken").unwrap_err();
        assert!(matches!(err, ClientError::InvalidAccessToken));
    }
}
