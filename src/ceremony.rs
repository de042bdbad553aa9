mod ceremony_mode;
mod ceremony_state;
mod ceremony_step;

pub use self::{
    ceremony_mode::CeremonyMode,
    ceremony_state::{AuthenticationPhase, CeremonyState, RegistrationPhase},
    ceremony_step::CeremonyStep,
};

use crate::{
    authenticator::{Authenticator, CommandAuthenticator},
    config::{Config, RelyingPartyConfig},
    error::Error,
    network::create_http_client,
    session::SessionContext,
    webauthn::{
        CreationChallenge, PublicKeyCredential, RegisterPublicKeyCredential, RequestChallenge,
    },
};
use anyhow::anyhow;
use reqwest::{Response, header::CONTENT_TYPE};
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use std::mem;
use tracing::{debug, error, info, warn};
use url::Url;

/// Content type of the identity token bodies.
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Drives the relying party through the passkey registration and authentication ceremonies.
pub struct Ceremony<A: Authenticator> {
    http_client: ClientWithMiddleware,
    origin: Url,
    authenticator: A,
    session: SessionContext,
    state: CeremonyState,
}

impl<A: Authenticator> Ceremony<A> {
    /// Creates a new ceremony runner in the `Idle` state with an empty session.
    pub fn new(
        http_client: ClientWithMiddleware,
        relying_party: &RelyingPartyConfig,
        authenticator: A,
    ) -> Self {
        Self {
            http_client,
            origin: relying_party.origin.clone(),
            authenticator,
            session: SessionContext::new(relying_party.session_cookie_name.clone()),
            state: CeremonyState::Idle,
        }
    }

    /// Current state of the ceremony.
    pub fn state(&self) -> &CeremonyState {
        &self.state
    }

    /// Runs the ceremonies the mode asks for, for the specified identity.
    pub async fn run(&mut self, mode: CeremonyMode, identity: &str) -> Result<(), Error> {
        self.register(identity).await?;
        if mode.authenticates() {
            self.logout().await?;
            self.authenticate(identity).await?;
        }

        Ok(())
    }

    /// Enrolls the identity and registers a new passkey for it.
    pub async fn register(&mut self, identity: &str) -> Result<(), Error> {
        self.enroll(identity).await?;
        self.start_registration().await?;
        self.create_credential().await?;
        self.finish_registration().await
    }

    /// Authenticates the identity with a previously registered passkey.
    pub async fn authenticate(&mut self, identity: &str) -> Result<(), Error> {
        self.start_authentication(identity).await?;
        self.assert_credential().await?;
        self.finish_authentication().await
    }

    /// Enrolls the identity with the relying party and captures the session it issues. Any
    /// previously captured session is dropped first.
    pub async fn enroll(&mut self, identity: &str) -> Result<(), Error> {
        let step = CeremonyStep::EnrollUser;
        debug!(step = %step, identity, "Running ceremony step.");

        self.session.clear();
        let result = async {
            let request = self
                .request(step)?
                .header(CONTENT_TYPE, TEXT_CONTENT_TYPE)
                .body(identity.to_string());
            self.send(step, request).await
        }
        .await;

        let response = self.complete(step, result)?;
        if !self.session.capture(&response) {
            warn!(
                step = %step,
                cookie = self.session.cookie_name(),
                "Relying party didn't issue a session."
            );
        }

        self.state = CeremonyState::Enrolled;
        Ok(())
    }

    /// Requests a creation challenge for the enrolled identity.
    pub async fn start_registration(&mut self) -> Result<(), Error> {
        let step = CeremonyStep::StartRegistration;
        if matches!(self.state, CeremonyState::Idle | CeremonyState::LoggedOut) {
            return Err(self.reject(step, None));
        }
        debug!(step = %step, "Running ceremony step.");

        let result = async {
            let request = self.authenticated_request(step)?;
            let response = self.send(step, request).await?;
            self.session.capture(&response);
            let body = response
                .bytes()
                .await
                .map_err(|err| Error::transport(step, err))?;
            CreationChallenge::parse(&body).map_err(|err| Error::malformed_response(step, err))
        }
        .await;

        let challenge = self.complete(step, result)?;
        self.state = CeremonyState::Registering(RegistrationPhase::Started(challenge));
        Ok(())
    }

    /// Asks the authenticator to create a credential for the pending creation challenge.
    pub async fn create_credential(&mut self) -> Result<(), Error> {
        let step = CeremonyStep::CreateCredential;
        let challenge = match mem::replace(&mut self.state, CeremonyState::Aborted) {
            CeremonyState::Registering(RegistrationPhase::Started(challenge)) => challenge,
            state => return Err(self.reject(step, Some(state))),
        };
        debug!(step = %step, "Running ceremony step.");

        let result = self
            .authenticator
            .create(&self.origin, &challenge)
            .await
            .map_err(Error::authenticator);

        let credential = self.complete(step, result)?;
        self.state = CeremonyState::Registering(RegistrationPhase::CredentialCreated(credential));
        Ok(())
    }

    /// Submits the created credential to the relying party.
    pub async fn finish_registration(&mut self) -> Result<(), Error> {
        let step = CeremonyStep::FinishRegistration;
        let credential = match mem::replace(&mut self.state, CeremonyState::Aborted) {
            CeremonyState::Registering(RegistrationPhase::CredentialCreated(credential)) => {
                credential
            }
            state => return Err(self.reject(step, Some(state))),
        };
        debug!(step = %step, credential = %credential.id, "Running ceremony step.");

        let result = async {
            let request = self
                .authenticated_request(step)?
                .json(&RegisterPublicKeyCredential::from(&credential));
            let response = self.send(step, request).await?;
            self.session.capture(&response);
            Ok::<_, Error>(())
        }
        .await;

        self.complete(step, result)?;
        self.state = CeremonyState::Registering(RegistrationPhase::Finished);
        Ok(())
    }

    /// Ends the current session. The session is dropped locally regardless of what the relying
    /// party responds with.
    pub async fn logout(&mut self) -> Result<(), Error> {
        let step = CeremonyStep::Logout;
        if matches!(self.state, CeremonyState::Idle | CeremonyState::LoggedOut) {
            return Err(self.reject(step, None));
        }
        debug!(step = %step, "Running ceremony step.");

        let result = async {
            let request = self.authenticated_request(step)?;
            self.send(step, request).await
        }
        .await;

        self.session.clear();
        self.complete(step, result)?;
        self.state = CeremonyState::LoggedOut;
        Ok(())
    }

    /// Requests a challenge to authenticate the identity with. The request isn't authenticated,
    /// the relying party issues a new session with the challenge.
    pub async fn start_authentication(&mut self, identity: &str) -> Result<(), Error> {
        let step = CeremonyStep::StartAuthentication;
        if matches!(
            self.state,
            CeremonyState::Enrolled | CeremonyState::Registering(_)
        ) {
            return Err(self.reject(step, None));
        }
        debug!(step = %step, identity, "Running ceremony step.");

        self.session.clear();
        let result = async {
            let request = self
                .request(step)?
                .header(CONTENT_TYPE, TEXT_CONTENT_TYPE)
                .body(identity.to_string());
            let response = self.send(step, request).await?;
            self.session.capture(&response);
            let body = response
                .bytes()
                .await
                .map_err(|err| Error::transport(step, err))?;
            RequestChallenge::parse(&body).map_err(|err| Error::malformed_response(step, err))
        }
        .await;

        let challenge = self.complete(step, result)?;
        self.state = CeremonyState::Authenticating(AuthenticationPhase::Started(challenge));
        Ok(())
    }

    /// Asks the authenticator to assert a credential for the pending request challenge.
    pub async fn assert_credential(&mut self) -> Result<(), Error> {
        let step = CeremonyStep::AssertCredential;
        let challenge = match mem::replace(&mut self.state, CeremonyState::Aborted) {
            CeremonyState::Authenticating(AuthenticationPhase::Started(challenge)) => challenge,
            state => return Err(self.reject(step, Some(state))),
        };
        debug!(step = %step, "Running ceremony step.");

        let result = self
            .authenticator
            .assert(&self.origin, &challenge)
            .await
            .map_err(Error::authenticator);

        let credential = self.complete(step, result)?;
        self.state =
            CeremonyState::Authenticating(AuthenticationPhase::CredentialAsserted(credential));
        Ok(())
    }

    /// Submits the asserted credential to the relying party.
    pub async fn finish_authentication(&mut self) -> Result<(), Error> {
        let step = CeremonyStep::FinishAuthentication;
        let credential = match mem::replace(&mut self.state, CeremonyState::Aborted) {
            CeremonyState::Authenticating(AuthenticationPhase::CredentialAsserted(credential)) => {
                credential
            }
            state => return Err(self.reject(step, Some(state))),
        };
        debug!(step = %step, credential = %credential.id, "Running ceremony step.");

        let result = async {
            let request = self
                .authenticated_request(step)?
                .json(&PublicKeyCredential::from(&credential));
            let response = self.send(step, request).await?;
            self.session.capture(&response);
            Ok::<_, Error>(())
        }
        .await;

        self.complete(step, result)?;
        self.state = CeremonyState::Authenticating(AuthenticationPhase::Finished);
        Ok(())
    }

    fn request(&self, step: CeremonyStep) -> Result<RequestBuilder, Error> {
        let endpoint = step
            .endpoint()
            .ok_or_else(|| Error::transport(step, anyhow!("Step doesn't have an endpoint.")))?;
        let url = self
            .origin
            .join(endpoint)
            .map_err(|err| Error::transport(step, err))?;

        Ok(self.http_client.post(url))
    }

    fn authenticated_request(&self, step: CeremonyStep) -> Result<RequestBuilder, Error> {
        self.session
            .attach(self.request(step)?)
            .map_err(|_| Error::missing_session(step))
    }

    async fn send(&self, step: CeremonyStep, request: RequestBuilder) -> Result<Response, Error> {
        let response = request
            .send()
            .await
            .map_err(|err| Error::transport(step, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(step, status, &body));
        }

        Ok(response)
    }

    /// Logs the outcome of the step. A failed step leaves the ceremony in the `Aborted` state.
    fn complete<T>(&mut self, step: CeremonyStep, result: Result<T, Error>) -> Result<T, Error> {
        match result {
            Ok(value) => {
                info!(step = %step, "Ceremony step completed.");
                Ok(value)
            }
            Err(err) => {
                error!(
                    step = %step,
                    kind = ?err.kind(),
                    "Ceremony step failed: {:?}",
                    err.root_cause()
                );
                self.state = CeremonyState::Aborted;
                Err(err)
            }
        }
    }

    /// Rejects a step that isn't allowed in the current state, the state stays as it was.
    fn reject(&mut self, step: CeremonyStep, taken_state: Option<CeremonyState>) -> Error {
        if let Some(state) = taken_state {
            self.state = state;
        }

        let err = Error::invalid_state(step, self.state.name());
        error!(step = %step, kind = ?err.kind(), "Ceremony step failed: {err:?}");
        err
    }
}

/// Runs the configured ceremonies against the relying party.
#[tokio::main]
pub async fn run(config: Config) -> anyhow::Result<()> {
    let http_client = create_http_client(&config.http.client)?;
    let authenticator = CommandAuthenticator::new(&config.authenticator);

    info!(
        origin = %config.relying_party.origin,
        mode = %config.mode,
        "Running passkey ceremonies."
    );

    let mut ceremony = Ceremony::new(http_client, &config.relying_party, authenticator);
    ceremony.run(config.mode, &config.identity).await?;

    info!(
        mode = %config.mode,
        state = ceremony.state().name(),
        "Passkey ceremonies completed successfully."
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AuthenticationPhase, Ceremony, CeremonyMode, CeremonyState, RegistrationPhase};
    use crate::{
        authenticator::{
            AuthenticatorError,
            tests::{MockAuthenticator, MockAuthenticatorCall},
        },
        config::{HttpClientConfig, RelyingPartyConfig},
        error::ErrorKind,
        network::create_http_client,
        webauthn::tests::{
            mock_authentication_credential, mock_creation_challenge_json,
            mock_registration_credential, mock_request_challenge_json,
        },
    };
    use httpmock::{Method::POST, MockServer};
    use insta::assert_debug_snapshot;
    use serde_json::json;
    use url::Url;

    const IDENTITY: &str = "test-user@example.com";

    fn mock_ceremony(
        server: &MockServer,
        authenticator: MockAuthenticator,
    ) -> anyhow::Result<Ceremony<MockAuthenticator>> {
        Ok(Ceremony::new(
            create_http_client(&HttpClientConfig::default())?,
            &RelyingPartyConfig {
                origin: Url::parse(&server.base_url())?,
                session_cookie_name: "passkey-demo".to_string(),
            },
            authenticator,
        ))
    }

    fn mock_authenticator() -> MockAuthenticator {
        MockAuthenticator::new()
            .with_registration(mock_registration_credential())
            .with_authentication(mock_authentication_credential())
    }

    fn registration_payload() -> serde_json::Value {
        json!({
            "id": "AQIDBA",
            "rawId": "AQIDBA",
            "response": {
                "attestationObject": "o2NmbXQ",
                "clientDataJSON": "eyJ0eXBlIjoid2ViYXV0aG4uY3JlYXRlIn0",
                "transports": ["internal"]
            },
            "type": "public-key"
        })
    }

    fn authentication_payload() -> serde_json::Value {
        json!({
            "id": "AQIDBA",
            "rawId": "AQIDBA",
            "response": {
                "clientDataJSON": "eyJ0eXBlIjoid2ViYXV0aG4uZ2V0In0",
                "authenticatorData": "SZYN5Q",
                "signature": "MEUCIA",
                "userHandle": "AAECAw"
            },
            "type": "public-key"
        })
    }

    #[tokio::test]
    async fn can_register_passkey() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let enroll_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/users/register")
                    .header("content-type", "text/plain; charset=utf-8")
                    .header_missing("cookie")
                    .body(IDENTITY);
                then.status(200)
                    .header("set-cookie", "passkey-demo=S1; Path=/; HttpOnly; Secure");
            })
            .await;
        let start_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/passkey/register/start")
                    .header("cookie", "passkey-demo=S1");
                then.status(200).json_body(mock_creation_challenge_json());
            })
            .await;
        let finish_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/passkey/register/finish")
                    .header("cookie", "passkey-demo=S1")
                    .header("content-type", "application/json")
                    .json_body(registration_payload());
                then.status(200);
            })
            .await;

        let mut ceremony = mock_ceremony(&server, mock_authenticator())?;
        ceremony.run(CeremonyMode::Register, IDENTITY).await?;

        enroll_mock.assert_async().await;
        start_mock.assert_async().await;
        finish_mock.assert_async().await;

        assert_eq!(
            ceremony.state(),
            &CeremonyState::Registering(RegistrationPhase::Finished)
        );
        assert_eq!(
            ceremony.authenticator.calls(),
            vec![MockAuthenticatorCall::Create {
                origin: Url::parse(&server.base_url())?,
                challenge: "Y2hhbGxlbmdlLW9uZQ".to_string(),
            }]
        );

        Ok(())
    }

    #[tokio::test]
    async fn can_register_and_authenticate_with_passkey() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let enroll_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/users/register").body(IDENTITY);
                then.status(200).header("set-cookie", "passkey-demo=S1; Path=/");
            })
            .await;
        // Relying party rotates the session when the registration starts.
        let register_start_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/passkey/register/start")
                    .header("cookie", "passkey-demo=S1");
                then.status(200)
                    .header("set-cookie", "passkey-demo=S2; Path=/")
                    .json_body(mock_creation_challenge_json());
            })
            .await;
        let register_finish_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/passkey/register/finish")
                    .header("cookie", "passkey-demo=S2")
                    .json_body(registration_payload());
                then.status(200);
            })
            .await;
        let logout_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/logout")
                    .header("cookie", "passkey-demo=S2");
                then.status(200);
            })
            .await;
        let authenticate_start_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/passkey/authenticate/start")
                    .header("content-type", "text/plain; charset=utf-8")
                    .header_missing("cookie")
                    .body(IDENTITY);
                then.status(200)
                    .header("set-cookie", "passkey-demo=S3; Path=/")
                    .json_body(mock_request_challenge_json());
            })
            .await;
        let authenticate_finish_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/passkey/authenticate/finish")
                    .header("cookie", "passkey-demo=S3")
                    .header("content-type", "application/json")
                    .json_body(authentication_payload());
                then.status(200);
            })
            .await;

        let mut ceremony = mock_ceremony(&server, mock_authenticator())?;
        ceremony
            .run(CeremonyMode::RegisterAndAuthenticate, IDENTITY)
            .await?;

        enroll_mock.assert_async().await;
        register_start_mock.assert_async().await;
        register_finish_mock.assert_async().await;
        logout_mock.assert_async().await;
        authenticate_start_mock.assert_async().await;
        authenticate_finish_mock.assert_async().await;

        assert_eq!(
            ceremony.state(),
            &CeremonyState::Authenticating(AuthenticationPhase::Finished)
        );
        assert_eq!(
            ceremony
                .session
                .token()
                .map(|token| token.value().to_string()),
            Some("S3".to_string())
        );
        assert_eq!(
            ceremony.authenticator.calls(),
            vec![
                MockAuthenticatorCall::Create {
                    origin: Url::parse(&server.base_url())?,
                    challenge: "Y2hhbGxlbmdlLW9uZQ".to_string(),
                },
                MockAuthenticatorCall::Assert {
                    origin: Url::parse(&server.base_url())?,
                    challenge: "Y2hhbGxlbmdlLXR3bw".to_string(),
                }
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn does_not_invoke_authenticator_if_start_fails() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/users/register");
                then.status(200).header("set-cookie", "passkey-demo=S1");
            })
            .await;
        let start_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/start");
                then.status(500).body("Challenge storage is unavailable");
            })
            .await;
        let finish_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/finish");
                then.status(200);
            })
            .await;

        let mut ceremony = mock_ceremony(&server, mock_authenticator())?;
        let error = ceremony
            .run(CeremonyMode::RegisterAndAuthenticate, IDENTITY)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Transport);
        assert_debug_snapshot!(error, @r###""`start registration` request failed with the status code `500 Internal Server Error` and body: Challenge storage is unavailable""###);

        start_mock.assert_calls_async(1).await;
        finish_mock.assert_calls_async(0).await;
        assert!(ceremony.authenticator.calls().is_empty());
        assert_eq!(ceremony.state(), &CeremonyState::Aborted);

        Ok(())
    }

    #[tokio::test]
    async fn aborts_if_enrollment_fails() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/users/register");
                then.status(409).body("User already exists");
            })
            .await;
        let start_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/start");
                then.status(200).json_body(mock_creation_challenge_json());
            })
            .await;

        let mut ceremony = mock_ceremony(&server, mock_authenticator())?;
        let error = ceremony
            .run(CeremonyMode::Register, IDENTITY)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Transport);
        assert_debug_snapshot!(error, @r###""`enroll user` request failed with the status code `409 Conflict` and body: User already exists""###);
        start_mock.assert_calls_async(0).await;
        assert_eq!(ceremony.state(), &CeremonyState::Aborted);

        Ok(())
    }

    #[tokio::test]
    async fn propagates_authenticator_errors_unchanged() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/authenticate/start");
                then.status(200)
                    .header("set-cookie", "passkey-demo=S1")
                    .json_body(mock_request_challenge_json());
            })
            .await;
        let finish_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/authenticate/finish");
                then.status(200);
            })
            .await;

        // No credential to assert, the authenticator declines.
        let mut ceremony = mock_ceremony(
            &server,
            MockAuthenticator::new().with_registration(mock_registration_credential()),
        )?;
        let error = ceremony.authenticate(IDENTITY).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Authenticator);
        assert!(matches!(
            error.root_cause().downcast_ref::<AuthenticatorError>(),
            Some(AuthenticatorError::Declined(reason)) if reason == "User presence denied."
        ));

        finish_mock.assert_calls_async(0).await;
        assert_eq!(ceremony.state(), &CeremonyState::Aborted);

        Ok(())
    }

    #[tokio::test]
    async fn does_not_finish_registration_if_authenticator_declines() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/users/register");
                then.status(200).header("set-cookie", "passkey-demo=S1");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/start");
                then.status(200).json_body(mock_creation_challenge_json());
            })
            .await;
        let finish_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/finish");
                then.status(200);
            })
            .await;

        // No credential to create, the authenticator declines.
        let mut ceremony = mock_ceremony(
            &server,
            MockAuthenticator::new().with_authentication(mock_authentication_credential()),
        )?;
        let error = ceremony
            .run(CeremonyMode::RegisterAndAuthenticate, IDENTITY)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Authenticator);
        assert!(matches!(
            error.root_cause().downcast_ref::<AuthenticatorError>(),
            Some(AuthenticatorError::Declined(reason)) if reason == "User presence denied."
        ));

        finish_mock.assert_calls_async(0).await;
        assert_eq!(
            ceremony.authenticator.calls(),
            vec![MockAuthenticatorCall::Create {
                origin: Url::parse(&server.base_url())?,
                challenge: "Y2hhbGxlbmdlLW9uZQ".to_string(),
            }]
        );
        assert_eq!(ceremony.state(), &CeremonyState::Aborted);

        Ok(())
    }

    #[tokio::test]
    async fn fails_if_challenge_is_malformed() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/users/register");
                then.status(200).header("set-cookie", "passkey-demo=S1");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/start");
                then.status(200)
                    .json_body(json!({ "publicKey": { "challenge": "" } }));
            })
            .await;

        let mut ceremony = mock_ceremony(&server, mock_authenticator())?;
        let error = ceremony
            .run(CeremonyMode::Register, IDENTITY)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::MalformedResponse);
        assert!(ceremony.authenticator.calls().is_empty());
        assert_eq!(ceremony.state(), &CeremonyState::Aborted);

        Ok(())
    }

    #[tokio::test]
    async fn fails_without_session() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        // Enrollment succeeds, but the relying party doesn't issue a session.
        server
            .mock_async(|when, then| {
                when.method(POST).path("/users/register");
                then.status(200);
            })
            .await;
        let start_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/start");
                then.status(200).json_body(mock_creation_challenge_json());
            })
            .await;

        let mut ceremony = mock_ceremony(&server, mock_authenticator())?;
        let error = ceremony
            .run(CeremonyMode::Register, IDENTITY)
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::MissingSession);
        assert_debug_snapshot!(error, @r###""Cannot send `start registration` request without a session.""###);
        start_mock.assert_calls_async(0).await;

        Ok(())
    }

    #[tokio::test]
    async fn does_not_reuse_session_after_logout() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/users/register");
                then.status(200).header("set-cookie", "passkey-demo=S1");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/start");
                then.status(200).json_body(mock_creation_challenge_json());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/finish");
                then.status(200);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/logout");
                then.status(200);
            })
            .await;
        // Authentication start doesn't issue a new session.
        server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/authenticate/start");
                then.status(200).json_body(mock_request_challenge_json());
            })
            .await;
        let finish_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/authenticate/finish");
                then.status(200);
            })
            .await;

        let mut ceremony = mock_ceremony(&server, mock_authenticator())?;
        ceremony.register(IDENTITY).await?;
        assert!(ceremony.session.token().is_some());

        ceremony.logout().await?;
        assert_eq!(ceremony.state(), &CeremonyState::LoggedOut);
        assert!(ceremony.session.token().is_none());

        let error = ceremony.authenticate(IDENTITY).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingSession);
        assert_debug_snapshot!(error, @r###""Cannot send `finish authentication` request without a session.""###);
        finish_mock.assert_calls_async(0).await;

        Ok(())
    }

    #[tokio::test]
    async fn rejects_steps_out_of_order() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let finish_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/finish");
                then.status(200);
            })
            .await;

        let mut ceremony = mock_ceremony(&server, mock_authenticator())?;

        let error = ceremony.finish_registration().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidState);
        assert_debug_snapshot!(error, @r###""Cannot perform `finish registration` step in `idle` state.""###);
        assert_eq!(ceremony.state(), &CeremonyState::Idle);

        let error = ceremony.start_registration().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidState);

        let error = ceremony.create_credential().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidState);
        assert!(ceremony.authenticator.calls().is_empty());

        let error = ceremony.logout().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidState);

        let error = ceremony.finish_authentication().await.unwrap_err();
        assert_debug_snapshot!(error, @r###""Cannot perform `finish authentication` step in `idle` state.""###);
        assert_eq!(ceremony.state(), &CeremonyState::Idle);

        finish_mock.assert_calls_async(0).await;

        Ok(())
    }

    #[tokio::test]
    async fn keeps_state_when_step_is_rejected() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/users/register");
                then.status(200).header("set-cookie", "passkey-demo=S1");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/start");
                then.status(200).json_body(mock_creation_challenge_json());
            })
            .await;

        let mut ceremony = mock_ceremony(&server, mock_authenticator())?;
        ceremony.enroll(IDENTITY).await?;
        ceremony.start_registration().await?;

        // Finish can't be sent before the credential is created.
        let error = ceremony.finish_registration().await.unwrap_err();
        assert_debug_snapshot!(error, @r###""Cannot perform `finish registration` step in `registration started` state.""###);
        assert!(matches!(
            ceremony.state(),
            CeremonyState::Registering(RegistrationPhase::Started(challenge)) if challenge.public_key.challenge == "Y2hhbGxlbmdlLW9uZQ"
        ));

        // Authentication can't start before logging out.
        let error = ceremony.start_authentication(IDENTITY).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidState);

        ceremony.create_credential().await?;
        assert_eq!(
            ceremony.state(),
            &CeremonyState::Registering(RegistrationPhase::CredentialCreated(
                mock_registration_credential()
            ))
        );

        Ok(())
    }

    #[tokio::test]
    async fn can_restart_registration_after_failure() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/users/register");
                then.status(200).header("set-cookie", "passkey-demo=S1");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/start");
                then.status(200).json_body(mock_creation_challenge_json());
            })
            .await;
        let finish_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/finish");
                then.status(400).body("Challenge has expired");
            })
            .await;

        let mut ceremony = mock_ceremony(&server, mock_authenticator())?;
        let error = ceremony.register(IDENTITY).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Transport);
        assert_eq!(ceremony.state(), &CeremonyState::Aborted);

        // Finish is never retried, a new start is required.
        let error = ceremony.finish_registration().await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidState);
        finish_mock.assert_calls_async(1).await;
        finish_mock.delete_async().await;

        let finish_mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/passkey/register/finish");
                then.status(200);
            })
            .await;
        ceremony.start_registration().await?;
        ceremony.create_credential().await?;
        ceremony.finish_registration().await?;

        finish_mock.assert_async().await;
        assert_eq!(
            ceremony.state(),
            &CeremonyState::Registering(RegistrationPhase::Finished)
        );

        Ok(())
    }
}
