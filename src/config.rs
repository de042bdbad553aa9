mod authenticator_config;
mod http_config;
mod raw_config;
mod relying_party_config;

use crate::ceremony::CeremonyMode;
use anyhow::bail;

pub use self::{
    authenticator_config::AuthenticatorConfig,
    http_config::{HttpClientConfig, HttpConfig},
    raw_config::RawConfig,
    relying_party_config::RelyingPartyConfig,
};

/// Main ceremony runner config.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Identity (e.g. email) to enroll and authenticate.
    pub identity: String,
    /// Defines which ceremonies should be run.
    pub mode: CeremonyMode,
    /// Configuration of the relying party.
    pub relying_party: RelyingPartyConfig,
    /// Configuration for the HTTP functionality.
    pub http: HttpConfig,
    /// Configuration of the authenticator.
    pub authenticator: AuthenticatorConfig,
}

impl TryFrom<RawConfig> for Config {
    type Error = anyhow::Error;

    fn try_from(raw_config: RawConfig) -> Result<Self, Self::Error> {
        if raw_config.identity.trim().is_empty() {
            bail!("Identity cannot be empty.");
        }

        let Some(authenticator) = raw_config.authenticator else {
            bail!("Authenticator isn't configured, `[authenticator]` section is required.");
        };

        Ok(Self {
            identity: raw_config.identity,
            mode: raw_config.mode,
            relying_party: raw_config.relying_party,
            http: raw_config.http,
            authenticator,
        })
    }
}
