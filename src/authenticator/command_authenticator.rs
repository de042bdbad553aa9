use crate::{
    authenticator::{Authenticator, AuthenticatorError, ensure_rp_id_matches_origin},
    config::AuthenticatorConfig,
    webauthn::{
        AuthenticationCredential, CreationChallenge, RegistrationCredential, RequestChallenge,
    },
};
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_derive::Serialize;
use serde_json::Value;
use std::{io::ErrorKind, process::Stdio};
use tokio::{io::AsyncWriteExt, process::Command};
use tracing::debug;
use url::Url;

/// Request written to the authenticator process' standard input.
#[derive(Serialize)]
struct CommandRequest<'a> {
    /// `create` for registration, `get` for authentication.
    ceremony: &'static str,
    /// Serialized origin of the relying party (scheme, host and port).
    origin: String,
    /// Challenge exactly as issued by the relying party.
    options: &'a Value,
}

/// Authenticator backed by an external process. The process receives the request as JSON on its
/// standard input and is expected to print the credential in its WebAuthn JSON form (binary
/// fields base64url encoded) to the standard output. Non-zero exit status means that the
/// authenticator declined the ceremony, the standard error output is used as the reason.
#[derive(Debug, Clone)]
pub struct CommandAuthenticator {
    program: String,
    args: Vec<String>,
}

impl CommandAuthenticator {
    /// Creates a new authenticator that runs the configured program.
    pub fn new(config: &AuthenticatorConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    async fn invoke<R: DeserializeOwned>(
        &self,
        request: CommandRequest<'_>,
    ) -> Result<R, AuthenticatorError> {
        let input = serde_json::to_vec(&request)
            .map_err(|err| AuthenticatorError::InvalidChallenge(err.to_string()))?;

        debug!(
            program = %self.program,
            ceremony = request.ceremony,
            "Invoking authenticator."
        );
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(AuthenticatorError::Unavailable)?;

        // Output is drained while the request is written, the process may write before it reads.
        let stdin = child.stdin.take();
        let write_request = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };

            // Process may legitimately exit without reading the request, its exit status tells why.
            match stdin.write_all(&input).await {
                Err(err) if err.kind() != ErrorKind::BrokenPipe => Err(err),
                _ => Ok(()),
            }
        };

        let (written, output) = tokio::join!(write_request, child.wait_with_output());
        let output = output.map_err(AuthenticatorError::Unavailable)?;
        written.map_err(AuthenticatorError::Unavailable)?;
        if !output.status.success() {
            let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AuthenticatorError::Declined(if reason.is_empty() {
                format!("authenticator exited with {}", output.status)
            } else {
                reason
            }));
        }

        serde_json::from_slice(&output.stdout).map_err(AuthenticatorError::InvalidResponse)
    }
}

impl Authenticator for CommandAuthenticator {
    fn create<'a>(
        &'a self,
        origin: &'a Url,
        challenge: &'a CreationChallenge,
    ) -> BoxFuture<'a, Result<RegistrationCredential, AuthenticatorError>> {
        Box::pin(async move {
            ensure_rp_id_matches_origin(origin, challenge.public_key.rp.id.as_deref())?;
            self.invoke(CommandRequest {
                ceremony: "create",
                origin: origin.origin().ascii_serialization(),
                options: challenge.raw(),
            })
            .await
        })
    }

    fn assert<'a>(
        &'a self,
        origin: &'a Url,
        challenge: &'a RequestChallenge,
    ) -> BoxFuture<'a, Result<AuthenticationCredential, AuthenticatorError>> {
        Box::pin(async move {
            ensure_rp_id_matches_origin(origin, challenge.public_key.rp_id.as_deref())?;
            self.invoke(CommandRequest {
                ceremony: "get",
                origin: origin.origin().ascii_serialization(),
                options: challenge.raw(),
            })
            .await
        })
    }
}
