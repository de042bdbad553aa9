use crate::{
    ceremony::CeremonyMode,
    config::{AuthenticatorConfig, HttpConfig, RelyingPartyConfig},
};
use figment::{Figment, Metadata, Profile, Provider, providers, providers::Format, value};
use serde_derive::{Deserialize, Serialize};

/// Raw configuration structure that is used to read the configuration from the file.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RawConfig {
    /// Identity (e.g. email) to enroll and authenticate.
    pub identity: String,
    /// Defines which ceremonies should be run.
    pub mode: CeremonyMode,
    /// Configuration of the relying party.
    pub relying_party: RelyingPartyConfig,
    /// Configuration for the HTTP functionality.
    pub http: HttpConfig,
    /// Configuration of the authenticator, there is no default one.
    pub authenticator: Option<AuthenticatorConfig>,
}

impl RawConfig {
    /// Reads the configuration from the file (TOML) and merges it with the default values.
    pub fn read_from_file(path: &str) -> anyhow::Result<Self> {
        Self::read_from(providers::Toml::file(path))
    }

    fn read_from<P: Provider>(provider: P) -> anyhow::Result<Self> {
        Ok(Figment::from(RawConfig::default())
            .merge(provider)
            .merge(providers::Env::prefixed("PASSKEY_CEREMONY_").split("__"))
            .extract()?)
    }
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            identity: "test-user@example.com".to_string(),
            mode: CeremonyMode::default(),
            relying_party: RelyingPartyConfig::default(),
            http: HttpConfig::default(),
            authenticator: None,
        }
    }
}

impl Provider for RawConfig {
    fn metadata(&self) -> Metadata {
        Metadata::named("Passkey ceremony main configuration")
    }

    fn data(&self) -> Result<value::Map<Profile, value::Dict>, figment::Error> {
        providers::Serialized::defaults(Self::default()).data()
    }
}
