//! Stratoform relay
//!
//! A small HTTP function deployed next to the data pipeline. It accepts game
//! events as JSON and republishes them to the pipeline's Pub/Sub topic.

pub mod config;
pub mod error;
pub mod payload;
pub mod publisher;
pub mod server;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use payload::Payload;
pub use publisher::{PubSubPublisher, Publisher};
pub use server::{AppState, router, serve};
