mod authentication_credential;
mod creation_challenge;
mod credential_descriptor;
mod registration_credential;
mod request_challenge;

#[allow(unused_imports)]
pub use self::{
    authentication_credential::{
        AssertionResponse, AuthenticationCredential, AuthenticatorAssertionResponseJson,
        PublicKeyCredential,
    },
    creation_challenge::{
        CreationChallenge, PublicKeyCredentialCreationOptions, PublicKeyCredentialParameters,
        RelyingPartyEntity, UserEntity,
    },
    credential_descriptor::CredentialDescriptor,
    registration_credential::{
        AttestationResponse, AuthenticatorAttestationResponseJson, RegisterPublicKeyCredential,
        RegistrationCredential,
    },
    request_challenge::{PublicKeyCredentialRequestOptions, RequestChallenge},
};

use crate::encoding;
use anyhow::{Context, bail};

/// Checks that the server-issued challenge is a non-empty base64url value.
fn validate_challenge(challenge: &str) -> anyhow::Result<()> {
    let challenge = encoding::decode(challenge).context("Challenge isn't a valid base64url value.")?;
    if challenge.is_empty() {
        bail!("Challenge is empty.");
    }

    Ok(())
}
