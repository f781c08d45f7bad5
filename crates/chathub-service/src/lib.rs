//! # chathub-service
//!
//! Use cases on top of the message store and the presence registry.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod conversation;
pub mod delivery;
pub mod unseen;

pub use conversation::{ConversationService, ConversationView};
pub use delivery::{DeliveryCoordinator, DeliveryStatus};
pub use unseen::UnseenAggregator;
