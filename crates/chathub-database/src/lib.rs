//! # chathub-database
//!
//! Durable record of messages. Defines the [`MessageStore`] contract and
//! provides an in-memory implementation and a PostgreSQL repository, plus
//! connection-pool management and migrations for the latter.

pub mod clock;
pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{MessageStore, memory::MemoryMessageStore};
