//! Data models
//!
//! Shared between store-server and API clients.
//! Records carry their own string keys (`order_id`, `product_id`); the
//! storage record id never leaks into these types.

pub mod order;
pub mod product;
pub mod report;

// Re-exports
pub use order::*;
pub use product::*;
pub use report::*;
