use crate::encoding::{self, Base64Url};
use serde_derive::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none};

/// Credential created by the authenticator during registration, binary fields are kept raw.
#[serde_as]
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCredential {
    /// Credential identifier as reported by the authenticator.
    pub id: String,
    #[serde_as(as = "Base64Url")]
    pub raw_id: Vec<u8>,
    #[serde(rename = "type")]
    pub ty: String,
    pub response: AttestationResponse,
}

#[serde_as]
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponse {
    #[serde_as(as = "Base64Url")]
    pub attestation_object: Vec<u8>,
    #[serde_as(as = "Base64Url")]
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Vec<u8>,
    #[serde(default)]
    pub transports: Option<Vec<String>>,
}

/// Payload of the registration finish request.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPublicKeyCredential {
    pub id: String,
    pub raw_id: String,
    pub response: AuthenticatorAttestationResponseJson,
    #[serde(rename = "type")]
    pub ty: String,
}

#[skip_serializing_none]
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAttestationResponseJson {
    pub attestation_object: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub transports: Option<Vec<String>>,
}

impl From<&RegistrationCredential> for RegisterPublicKeyCredential {
    fn from(credential: &RegistrationCredential) -> Self {
        Self {
            id: credential.id.clone(),
            raw_id: encoding::encode(&credential.raw_id),
            response: AuthenticatorAttestationResponseJson {
                attestation_object: encoding::encode(&credential.response.attestation_object),
                client_data_json: encoding::encode(&credential.response.client_data_json),
                transports: credential.response.transports.clone(),
            },
            ty: credential.ty.clone(),
        }
    }
}
