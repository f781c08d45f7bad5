//! Concrete PostgreSQL repository implementations.

pub mod message;

pub use message::MessageRepository;
