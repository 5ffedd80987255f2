//! SQLite-backed storage for cache generations and their entries.
//!
//! This module provides a persistent, URL-keyed cache using SQLite with
//! async access via tokio-rusqlite. It supports:
//!
//! - Named generations with a ready flag set after precaching
//! - Upsert writes keyed by the SHA-256 of the normalized request URL
//! - Atomic batch writes for the precache manifest
//! - Cascading deletes when a superseded generation is dropped

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedEntry;
pub use generations::Generation;
pub use storage::CacheStorage;
