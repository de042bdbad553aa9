use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::{Deserialize, Deserializer, Serializer, de::Error as DeError};
use serde_with::{DeserializeAs, SerializeAs};

/// URL-safe base64 engine that never emits padding, but tolerates it when decoding.
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes raw bytes to the unpadded base64url form used for WebAuthn JSON transport.
pub fn encode<T: AsRef<[u8]>>(bytes: T) -> String {
    BASE64_URL.encode(bytes)
}

/// Decodes base64url text, with or without padding, back to raw bytes.
pub fn decode<T: AsRef<[u8]>>(text: T) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64_URL.decode(text)
}

/// `serde_with` adapter that (de)serializes raw bytes as base64url strings.
pub struct Base64Url;

impl SerializeAs<Vec<u8>> for Base64Url {
    fn serialize_as<S>(source: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&encode(source))
    }
}

impl<'de> DeserializeAs<'de, Vec<u8>> for Base64Url {
    fn deserialize_as<D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        decode(&text).map_err(|err| DeError::custom(format!("invalid base64url value: {err}")))
    }
}
