//! Message domain entities.

pub mod content;
pub mod conversation;
pub mod model;

pub use content::{MediaRef, MessageContent};
pub use conversation::ConversationKey;
pub use model::Message;
