//! # chathub-core
//!
//! Core crate for ChatHub. Contains typed identifiers, configuration
//! schemas, and the unified error system shared by every other crate.
//!
//! This crate has **no** internal dependencies on other ChatHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
