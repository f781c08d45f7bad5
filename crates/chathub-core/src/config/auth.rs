//! Identity gate configuration.

use serde::{Deserialize, Serialize};

/// Settings for the gate that supplies verified identities to the core.
///
/// Credential checks happen upstream; the gate only reads the identity the
/// upstream layer attached to the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Request header carrying the verified user identity.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_header: default_identity_header(),
        }
    }
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}
