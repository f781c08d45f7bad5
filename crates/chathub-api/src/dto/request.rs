//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use chathub_entity::message::MediaRef;

/// Send-message request body.
///
/// Both parts are optional here; the store rejects a message that ends up
/// with neither.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Text body.
    #[validate(length(max = 10000, message = "Text must be at most 10000 characters"))]
    pub text: Option<String>,
    /// Reference to an already uploaded media asset.
    #[serde(alias = "image")]
    #[validate(length(max = 2048, message = "Media reference is too long"))]
    pub media_ref: Option<String>,
}

impl SendMessageRequest {
    /// Split into store-ready parts.
    pub fn into_parts(self) -> (Option<String>, Option<MediaRef>) {
        (self.text, self.media_ref.map(MediaRef::new))
    }
}

/// Query for the sidebar listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SidebarQuery {
    /// Comma-separated identities to report on. Defaults to everyone the
    /// caller has exchanged messages with.
    pub ids: Option<String>,
}
