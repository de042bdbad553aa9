use std::fmt::{Display, Formatter};

/// Single step of the passkey ceremonies, in the order they are normally run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CeremonyStep {
    EnrollUser,
    StartRegistration,
    CreateCredential,
    FinishRegistration,
    Logout,
    StartAuthentication,
    AssertCredential,
    FinishAuthentication,
}

impl CeremonyStep {
    /// Relying party endpoint (relative to its origin) the step talks to. Steps that are handled
    /// by the authenticator alone don't have one.
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            CeremonyStep::EnrollUser => Some("users/register"),
            CeremonyStep::StartRegistration => Some("passkey/register/start"),
            CeremonyStep::FinishRegistration => Some("passkey/register/finish"),
            CeremonyStep::Logout => Some("logout"),
            CeremonyStep::StartAuthentication => Some("passkey/authenticate/start"),
            CeremonyStep::FinishAuthentication => Some("passkey/authenticate/finish"),
            CeremonyStep::CreateCredential | CeremonyStep::AssertCredential => None,
        }
    }
}

impl Display for CeremonyStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CeremonyStep::EnrollUser => "enroll user",
            CeremonyStep::StartRegistration => "start registration",
            CeremonyStep::CreateCredential => "create credential",
            CeremonyStep::FinishRegistration => "finish registration",
            CeremonyStep::Logout => "logout",
            CeremonyStep::StartAuthentication => "start authentication",
            CeremonyStep::AssertCredential => "assert credential",
            CeremonyStep::FinishAuthentication => "finish authentication",
        })
    }
}
