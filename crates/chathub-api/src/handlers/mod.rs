//! Route handlers organized by domain.

pub mod health;
pub mod messages;
pub mod ws;
