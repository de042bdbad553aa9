/// Describes why the authenticator couldn't produce a credential. Every variant is fatal for the
/// ceremony it occurred in.
#[derive(thiserror::Error, Debug)]
pub enum AuthenticatorError {
    /// Challenge is malformed or not valid for the calling origin.
    #[error("Challenge isn't acceptable: {0}")]
    InvalidChallenge(String),
    /// Authenticator refused to produce a credential (e.g. user presence was denied).
    #[error("Authenticator declined the ceremony: {0}")]
    Declined(String),
    /// Authenticator couldn't be reached.
    #[error("Authenticator is unavailable.")]
    Unavailable(#[source] std::io::Error),
    /// Authenticator produced a credential that couldn't be read.
    #[error("Authenticator returned an invalid credential.")]
    InvalidResponse(#[source] serde_json::Error),
}
