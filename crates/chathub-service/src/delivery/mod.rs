//! Persist-then-push message delivery.

pub mod coordinator;

pub use coordinator::{DeliveryCoordinator, DeliveryStatus};
