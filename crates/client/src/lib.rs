//! Client code for the saint-of-the-day worker.
//!
//! This crate provides the HTTP implementation of the worker's network port,
//! the scraping loader that produces the saint of the day and the web-push
//! sender that announces it.

pub mod fetch;
pub mod push;
pub mod saint;

pub use fetch::{FetchClient, FetchConfig};
pub use push::{PushError, PushTransport, WebPushSender, send_stored};
pub use saint::{LoaderError, SaintLoader, SaintOfTheDay};
