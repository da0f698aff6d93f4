#![cfg_attr(not(test), forbid(unsafe_code))]

//! Session handling for the TaskFlow API.
//!
//! Build a [`SessionManager`], call [`SessionManager::initialize`] once, and
//! send every authenticated call through [`SessionManager::auth_fetch`] (or
//! the typed [`TaskApi`]). An expired access token is refreshed and the call
//! replayed once; a refresh that fails ends the session.

pub mod auth_fetch;
pub mod error;
pub mod guard;
pub mod http;
pub mod refresh;
pub mod session;
pub mod store;
pub mod tasks;

#[cfg(test)]
mod test_support;

pub use error::{ClientError, ClientResult};
pub use guard::{Route, RouteDecision, RouteGuard, guard};
pub use crate::http::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, TransportError};
pub use session::{SessionEvent, SessionManager, SessionSnapshot, SubscriptionId};
pub use store::{FileStore, MemoryStore, SessionStore, StorageError};
pub use tasks::TaskApi;
