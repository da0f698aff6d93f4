use std::sync::Arc;

use http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
use url::Url;

use crate::{
    http::{ApiResponse, HttpTransport},
    session::SessionManager,
    store::SessionStore,
};

pub(crate) const BASE_URL: &str = "http://api.test";

/// A JSON response as the backend would send it.
pub(crate) fn json_response(status: StatusCode, body: &serde_json::Value) -> ApiResponse {
    let mut response = ApiResponse::new(status, serde_json::to_vec(body).unwrap());
    response
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// Manager pointed at [`BASE_URL`], not yet initialized.
pub(crate) fn manager_with<T, S>(transport: T, store: Arc<S>) -> SessionManager
where
    T: HttpTransport + 'static,
    S: SessionStore + 'static,
{
    let base = Url::parse(BASE_URL).unwrap();
    SessionManager::new(&base, Arc::new(transport), store)
}
