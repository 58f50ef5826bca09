//! Core types and shared functionality for the saint-of-the-day worker.
//!
//! This crate provides:
//! - Request/response model with clone-before-consume bodies
//! - Request classification into caching categories
//! - Named cache partitions with in-memory and SQLite backends
//! - Capability ports (network, notifications, worker scope)
//! - Push payloads and the push subscription store
//! - Configuration and unified error types

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod net;
pub mod ports;
pub mod push;
pub mod store;

pub use cache::{CacheDb, CacheRegistry, MatchOptions, Partition};
pub use classify::{RequestKind, classify};
pub use config::{ConfigError, PushConfig, WorkerConfig};
pub use error::Error;
pub use net::{Request, RequestMode, Response};
pub use ports::{Network, NotificationOptions, NotificationPort, Permission, WorkerScope};
pub use push::PushContent;
pub use store::SubscriptionStore;
