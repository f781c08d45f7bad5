//! # chathub-entity
//!
//! Domain entity models for ChatHub. Database entities derive
//! `sqlx::FromRow`; value objects validate their invariants on
//! construction.

pub mod message;
