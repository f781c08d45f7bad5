//! Typed path parameter helpers.

use chathub_core::error::AppError;
use chathub_core::types::id::{MessageId, UserId};

/// Parses a user identity from a path segment.
pub fn parse_user_id(s: &str) -> Result<UserId, AppError> {
    s.parse()
        .map_err(|_| AppError::validation(format!("Invalid user id: {s}")))
}

/// Parses a message id from a path segment.
pub fn parse_message_id(s: &str) -> Result<MessageId, AppError> {
    s.parse()
        .map_err(|_| AppError::validation(format!("Invalid message id: {s}")))
}

/// Parses a comma-separated list of user identities, skipping blanks.
pub fn parse_user_ids(list: &str) -> Result<Vec<UserId>, AppError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_user_id)
        .collect()
}
