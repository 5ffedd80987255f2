//! Core types and shared functionality for the leaflet offline worker.
//!
//! This crate provides:
//! - Cache generation storage with SQLite backend
//! - Request/response values shared by the router and strategies
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;

pub use cache::{CacheDb, CacheStorage, CachedEntry, Generation};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{Request, RequestMode, Response};
