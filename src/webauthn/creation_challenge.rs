use crate::webauthn::{CredentialDescriptor, validate_challenge};
use anyhow::{Context, bail};
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

/// Creation challenge returned by the registration start endpoint. The challenge is kept exactly
/// as received next to its validated view, so it reaches the authenticator unmodified.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationChallenge {
    /// Validated view of the creation options.
    pub public_key: PublicKeyCredentialCreationOptions,
    raw: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreationChallengeView {
    public_key: PublicKeyCredentialCreationOptions,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialCreationOptions {
    pub rp: RelyingPartyEntity,
    pub user: UserEntity,
    /// Base64url encoded server-issued challenge.
    pub challenge: String,
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,
    pub timeout: Option<u32>,
    pub exclude_credentials: Option<Vec<CredentialDescriptor>>,
    pub authenticator_selection: Option<Value>,
    pub attestation: Option<String>,
    pub extensions: Option<Value>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RelyingPartyEntity {
    /// Relying party identifier (effective domain), defaults to the origin's host when omitted.
    pub id: Option<String>,
    pub name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Base64url encoded user handle.
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PublicKeyCredentialParameters {
    #[serde(rename = "type")]
    pub ty: String,
    /// COSE algorithm identifier.
    pub alg: i64,
}

impl CreationChallenge {
    /// Deserializes and validates the creation challenge from the raw response body.
    pub fn parse(body: &[u8]) -> anyhow::Result<Self> {
        let raw = serde_json::from_slice::<Value>(body)
            .context("Cannot deserialize creation challenge.")?;
        let view = serde_json::from_value::<CreationChallengeView>(raw.clone())
            .context("Cannot deserialize creation challenge.")?;

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

        if self.public_key.pub_key_cred_params.is_empty() {
            bail!("Creation challenge doesn't list any public key parameters.");
        }

        if crate::encoding::decode(&self.public_key.user.id).is_err() {
            bail!("User handle isn't a valid base64url value.");
        }

        Ok(())
    }
}
