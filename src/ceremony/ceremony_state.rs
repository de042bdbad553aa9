use crate::webauthn::{
    AuthenticationCredential, CreationChallenge, RegistrationCredential, RequestChallenge,
};

/// Phase of the registration ceremony. Every phase owns the material the next step consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationPhase {
    /// Relying party issued the creation challenge.
    Started(CreationChallenge),
    /// Authenticator created a credential for the challenge of the current ceremony.
    CredentialCreated(RegistrationCredential),
    /// Relying party accepted the credential.
    Finished,
}

/// Phase of the authentication ceremony. Every phase owns the material the next step consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthenticationPhase {
    /// Relying party issued the request challenge.
    Started(RequestChallenge),
    /// Authenticator asserted a credential for the challenge of the current ceremony.
    CredentialAsserted(AuthenticationCredential),
    /// Relying party accepted the assertion.
    Finished,
}

/// State of the ceremony runner.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CeremonyState {
    #[default]
    Idle,
    Enrolled,
    Registering(RegistrationPhase),
    LoggedOut,
    Authenticating(AuthenticationPhase),
    /// Last step failed, only enrollment or a new start can follow.
    Aborted,
}

impl CeremonyState {
    /// Short human readable state name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            CeremonyState::Idle => "idle",
            CeremonyState::Enrolled => "enrolled",
            CeremonyState::Registering(RegistrationPhase::Started(_)) => "registration started",
            CeremonyState::Registering(RegistrationPhase::CredentialCreated(_)) => {
                "registration credential created"
            }
            CeremonyState::Registering(RegistrationPhase::Finished) => "registration finished",
            CeremonyState::LoggedOut => "logged out",
            CeremonyState::Authenticating(AuthenticationPhase::Started(_)) => {
                "authentication started"
            }
            CeremonyState::Authenticating(AuthenticationPhase::CredentialAsserted(_)) => {
                "authentication credential asserted"
            }
            CeremonyState::Authenticating(AuthenticationPhase::Finished) => {
                "authentication finished"
            }
            CeremonyState::Aborted => "aborted",
        }
    }
}
