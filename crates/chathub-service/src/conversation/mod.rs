//! Reading conversations and marking them seen.

pub mod service;

pub use service::{ConversationService, ConversationView};
