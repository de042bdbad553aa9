mod error_kind;

use crate::{authenticator::AuthenticatorError, ceremony::CeremonyStep};
use anyhow::anyhow;
use reqwest::StatusCode;
use std::fmt::{Debug, Display, Formatter};

pub use error_kind::ErrorKind;

/// Passkey ceremony native error type.
#[derive(thiserror::Error)]
pub struct Error {
    root_cause: anyhow::Error,
    kind: ErrorKind,
}

impl Error {
    /// Creates a Transport error for a request that couldn't be sent or whose response couldn't
    /// be read.
    pub fn transport<E>(step: CeremonyStep, err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self {
            root_cause: err
                .into()
                .context(format!("Cannot complete `{step}` request.")),
            kind: ErrorKind::Transport,
        }
    }

    /// Creates a Transport error for a request the relying party answered with a non-success
    /// status code.
    pub fn http_status(step: CeremonyStep, status: StatusCode, body: &str) -> Self {
        Self {
            root_cause: anyhow!(
                "`{step}` request failed with the status code `{status}` and body: {body}"
            ),
            kind: ErrorKind::Transport,
        }
    }

    /// Creates a MissingSession error for an authenticated request attempted without a session.
    pub fn missing_session(step: CeremonyStep) -> Self {
        Self {
            root_cause: anyhow!("Cannot send `{step}` request without a session."),
            kind: ErrorKind::MissingSession,
        }
    }

    /// Creates an Authenticator error. The authenticator error is kept as is, so that callers can
    /// downcast the root cause back to it.
    pub fn authenticator(err: AuthenticatorError) -> Self {
        Self {
            root_cause: anyhow::Error::from(err),
            kind: ErrorKind::Authenticator,
        }
    }

    /// Creates a MalformedResponse error with the given root cause.
    pub fn malformed_response(step: CeremonyStep, root_cause: anyhow::Error) -> Self {
        Self {
            root_cause: root_cause.context(format!("Malformed `{step}` response.")),
            kind: ErrorKind::MalformedResponse,
        }
    }

    /// Creates an InvalidState error for a step invoked in the wrong ceremony state.
    pub fn invalid_state(step: CeremonyStep, state: &str) -> Self {
        Self {
            root_cause: anyhow!("Cannot perform `{step}` step in `{state}` state."),
            kind: ErrorKind::InvalidState,
        }
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the root cause of the error.
    pub fn root_cause(&self) -> &anyhow::Error {
        &self.root_cause
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.root_cause, f)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.root_cause, f)
    }
}
