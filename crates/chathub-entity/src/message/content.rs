//! Validated message payload.

use std::fmt;

use serde::{Deserialize, Serialize};

use chathub_core::error::AppError;
use chathub_core::result::AppResult;

/// Opaque reference to an already-uploaded media asset.
///
/// Issued by the external asset store; the core never dereferences it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct MediaRef(pub String);

impl MediaRef {
    /// Create a media reference.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Return the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The body of a message: text, a media reference, or both.
///
/// Construction normalizes empty parts away and rejects a payload where
/// nothing is left, so every `MessageContent` carries at least one part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent {
    text: Option<String>,
    media_ref: Option<MediaRef>,
}

impl MessageContent {
    /// Build content from optional parts.
    ///
    /// Text is stored trimmed. Text that is empty after trimming and empty
    /// media references count as absent. Fails with `InvalidContent` when
    /// both parts are absent.
    pub fn new(text: Option<String>, media_ref: Option<MediaRef>) -> AppResult<Self> {
        let text = text
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        let media_ref = media_ref.filter(|m| !m.as_str().trim().is_empty());

        if text.is_none() && media_ref.is_none() {
            return Err(AppError::invalid_content(
                "Message must carry text or a media reference",
            ));
        }

        Ok(Self { text, media_ref })
    }

    /// Text-only content.
    pub fn text(text: impl Into<String>) -> AppResult<Self> {
        Self::new(Some(text.into()), None)
    }

    /// Media-only content.
    pub fn media(media_ref: MediaRef) -> AppResult<Self> {
        Self::new(None, Some(media_ref))
    }

    /// The text part, if any.
    pub fn text_part(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The media part, if any.
    pub fn media_part(&self) -> Option<&MediaRef> {
        self.media_ref.as_ref()
    }

    /// Split into owned parts.
    pub fn into_parts(self) -> (Option<String>, Option<MediaRef>) {
        (self.text, self.media_ref)
    }
}
