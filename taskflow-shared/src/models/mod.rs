//! # Models
//!
//! Request and response bodies exchanged with the TaskFlow backend.

pub mod auth;
pub mod errors;
pub mod task;
pub mod user;

pub use auth::{LoginRequest, RefreshTokenRequest, RefreshTokenResponse, TokenResponse};
pub use errors::{ErrorDetail, ErrorResponse};
pub use task::{Task, TaskCreate, TaskUpdate};
pub use user::{RegisterRequest, UserProfile};
