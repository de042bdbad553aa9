use serde_derive::{Deserialize, Serialize};
use url::Url;

/// Configuration of the relying party the ceremonies are run against.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RelyingPartyConfig {
    /// Origin of the relying party. Endpoints are resolved relative to it, and the authenticator
    /// scopes credentials to it.
    pub origin: Url,
    /// Name of the session cookie issued by the relying party.
    pub session_cookie_name: String,
}

impl Default for RelyingPartyConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse("https://passkey-demo.localhost:8081")
                .expect("Cannot parse relying party origin parameter."),
            session_cookie_name: "passkey-demo".to_string(),
        }
    }
}
