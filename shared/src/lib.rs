//! Shared types for the storefront
//!
//! Common types used by the store server and its clients: error codes and
//! response envelopes, order/product models, and message bus events.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

// Message bus re-exports (for convenient access)
pub use message::{BusMessage, EventType};
