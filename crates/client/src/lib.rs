//! Client side of leaflet.
//!
//! This crate provides the HTTP fetch pipeline and the offline cache worker
//! (routing, caching strategies, lifecycle and message handlers) driven by
//! the server.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Fetcher};

pub use worker::{
    Decline, EventOutcome, FetchOutcome, RecordingHost, ResourceKind, Route, Strategy, Worker, WorkerConfig,
    WorkerEvent, WorkerHost, WorkerState,
};
