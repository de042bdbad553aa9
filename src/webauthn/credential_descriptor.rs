use serde_derive::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Reference to a credential the relying party already knows about.
#[skip_serializing_none]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CredentialDescriptor {
    /// Credential type, always `public-key` for WebAuthn.
    #[serde(rename = "type")]
    pub ty: String,
    /// Base64url encoded credential identifier.
    pub id: String,
    /// Transport hints for the credential.
    pub transports: Option<Vec<String>>,
}
