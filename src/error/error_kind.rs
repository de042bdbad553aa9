/// Describes the kinds of failures a ceremony run can end with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network error or non-success HTTP status returned by the relying party.
    Transport,
    /// Authenticated request attempted before any session token was captured.
    MissingSession,
    /// Authenticator declined or failed to produce a credential.
    Authenticator,
    /// Relying party returned a response of unexpected shape.
    MalformedResponse,
    /// Ceremony step invoked out of order.
    InvalidState,
}
