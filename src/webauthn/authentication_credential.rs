use crate::encoding::{self, Base64Url};
use serde_derive::{Deserialize, Serialize};
use serde_with::serde_as;

/// Credential asserted by the authenticator during authentication, binary fields are kept raw.
#[serde_as]
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationCredential {
    /// Credential identifier as reported by the authenticator.
    pub id: String,
    #[serde_as(as = "Base64Url")]
    pub raw_id: Vec<u8>,
    #[serde(rename = "type")]
    pub ty: String,
    pub response: AssertionResponse,
}

#[serde_as]
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    #[serde_as(as = "Base64Url")]
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Vec<u8>,
    #[serde_as(as = "Base64Url")]
    pub authenticator_data: Vec<u8>,
    #[serde_as(as = "Base64Url")]
    pub signature: Vec<u8>,
    #[serde_as(as = "Base64Url")]
    pub user_handle: Vec<u8>,
}

/// Payload of the authentication finish request.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredential {
    pub id: String,
    pub raw_id: String,
    pub response: AuthenticatorAssertionResponseJson,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorAssertionResponseJson {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub authenticator_data: String,
    pub signature: String,
    pub user_handle: String,
}

impl From<&AuthenticationCredential> for PublicKeyCredential {
    fn from(credential: &AuthenticationCredential) -> Self {
        Self {
            id: credential.id.clone(),
            raw_id: encoding::encode(&credential.raw_id),
            response: AuthenticatorAssertionResponseJson {
                client_data_json: encoding::encode(&credential.response.client_data_json),
                authenticator_data: encoding::encode(&credential.response.authenticator_data),
                signature: encoding::encode(&credential.response.signature),
                user_handle: encoding::encode(&credential.response.user_handle),
            },
            ty: credential.ty.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::webauthn::{
        AuthenticationCredential, PublicKeyCredential, tests::mock_authentication_credential,
    };
    use insta::assert_json_snapshot;

    #[test]
    fn deserialization() -> anyhow::Result<()> {
        assert_eq!(
            serde_json::from_str::<AuthenticationCredential>(
                r#"
{
    "id": "AQIDBA",
    "rawId": "AQIDBA",
    "type": "public-key",
    "response": {
        "clientDataJSON": "eyJ0eXBlIjoid2ViYXV0aG4uZ2V0In0",
        "authenticatorData": "SZYN5Q",
        "signature": "MEUCIA",
        "userHandle": "AAECAw"
    }
}
          "#
            )?,
            mock_authentication_credential()
        );

        // User handle is required.
        assert!(
            serde_json::from_str::<AuthenticationCredential>(
                r#"
{
    "id": "AQIDBA",
    "rawId": "AQIDBA",
    "type": "public-key",
    "response": {
        "clientDataJSON": "eyJ0eXBlIjoid2ViYXV0aG4uZ2V0In0",
        "authenticatorData": "SZYN5Q",
        "signature": "MEUCIA"
    }
}
          "#
            )
            .is_err()
        );

        Ok(())
    }

    #[test]
    fn encodes_every_binary_field() -> anyhow::Result<()> {
        assert_json_snapshot!(PublicKeyCredential::from(&mock_authentication_credential()), @r###"
        {
          "id": "AQIDBA",
          "rawId": "AQIDBA",
          "response": {
            "clientDataJSON": "eyJ0eXBlIjoid2ViYXV0aG4uZ2V0In0",
            "authenticatorData": "SZYN5Q",
            "signature": "MEUCIA",
            "userHandle": "AAECAw"
          },
          "type": "public-key"
        }
        "###);

        Ok(())
    }
}
