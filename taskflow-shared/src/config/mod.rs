//! # Configuration
//!
//! Client-side settings: backend URL, logging level, and where the session lives.

pub mod client;

pub use client::{ClientConfig, ConfigError};
