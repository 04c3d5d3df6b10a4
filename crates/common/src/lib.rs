//! Identifiers shared across the checkout service crates.

mod types;

pub use types::{OrderId, TrackingId, TransactionId, UserId};
