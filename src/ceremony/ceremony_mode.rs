use anyhow::bail;
use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

/// Defines which ceremonies a single run goes through.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum CeremonyMode {
    /// Enroll the identity and register a passkey for it.
    Register,
    /// Enroll the identity, register a passkey, log out and authenticate with the new passkey.
    #[default]
    RegisterAndAuthenticate,
}

impl CeremonyMode {
    /// Returns all supported modes.
    pub const fn all() -> [CeremonyMode; 2] {
        [CeremonyMode::Register, CeremonyMode::RegisterAndAuthenticate]
    }

    /// Indicates whether the authentication ceremony follows the registration one.
    pub fn authenticates(&self) -> bool {
        matches!(self, CeremonyMode::RegisterAndAuthenticate)
    }

    fn as_str(&self) -> &'static str {
        match self {
            CeremonyMode::Register => "register",
            CeremonyMode::RegisterAndAuthenticate => "register_and_authenticate",
        }
    }
}

impl Display for CeremonyMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CeremonyMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match CeremonyMode::all()
            .into_iter()
            .find(|mode| mode.as_str() == value)
        {
            Some(mode) => Ok(mode),
            None => bail!("Unknown ceremony mode `{value}`, expected `register` or `register_and_authenticate`."),
        }
    }
}
