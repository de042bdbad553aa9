use crate::{
    encoding,
    webauthn::{CredentialDescriptor, validate_challenge},
};
use anyhow::{Context, anyhow};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

/// Request challenge returned by the authentication start endpoint. The challenge is kept exactly
/// as received next to its validated view, so it reaches the authenticator unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestChallenge {
    /// Validated view of the request options.
    pub public_key: PublicKeyCredentialRequestOptions,
    raw: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestChallengeView {
    public_key: PublicKeyCredentialRequestOptions,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    /// Base64url encoded server-issued challenge.
    pub challenge: String,
    pub timeout: Option<u32>,
    /// Relying party identifier (effective domain), defaults to the origin's host when omitted.
    pub rp_id: Option<String>,
    pub allow_credentials: Option<Vec<CredentialDescriptor>>,
    pub user_verification: Option<String>,
    pub extensions: Option<Value>,
}

impl RequestChallenge {
    /// Deserializes and validates the request challenge from the raw response body.
    pub fn parse(body: &[u8]) -> anyhow::Result<Self> {
        let raw = serde_json::from_slice::<Value>(body)
            .context("Cannot deserialize request challenge.")?;
        let view = serde_json::from_value::<RequestChallengeView>(raw.clone())
            .context("Cannot deserialize request challenge.")?;

        let challenge = Self {
            public_key: view.public_key,
            raw,
        };
        challenge.validate()?;

        Ok(challenge)
    }

    /// Challenge exactly as issued by the relying party.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    fn validate(&self) -> anyhow::Result<()> {
        validate_challenge(&self.public_key.challenge)?;

        for credential in self.public_key.allow_credentials.iter().flatten() {
            encoding::decode(&credential.id).map_err(|err| {
                anyhow!(
                    "Allowed credential id `{}` isn't a valid base64url value: {err}",
                    credential.id
                )
            })?;
        }

        Ok(())
    }
}
