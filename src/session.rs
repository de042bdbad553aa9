use reqwest::{Response, header::COOKIE};
use reqwest_middleware::RequestBuilder;
use std::fmt::{Debug, Formatter};

/// Opaque session token issued by the relying party.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Returns the raw token value.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Error returned when an authenticated request is attempted before any session was captured.
#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("No session token has been captured.")]
pub struct MissingSessionError;

/// Holds the single session token that has to be replayed on every authenticated request of a
/// ceremony. A newly issued token always replaces the previous one.
#[derive(Debug, Clone)]
pub struct SessionContext {
    cookie_name: String,
    token: Option<SessionToken>,
}

impl SessionContext {
    /// Creates an empty session context for the session cookie with the given name.
    pub fn new<N: Into<String>>(cookie_name: N) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            token: None,
        }
    }

    /// Name of the session cookie.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Currently stored session token, if any.
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Captures the session cookie from the response `Set-Cookie` directives, if present. The last
    /// matching directive wins, and a directive with an empty value clears the stored token.
    /// Returns `true` if the response carried the session cookie.
    pub fn capture(&mut self, response: &Response) -> bool {
        let Some(value) = response
            .cookies()
            .filter(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| cookie.value().to_string())
            .last()
        else {
            return false;
        };

        self.token = if value.is_empty() {
            None
        } else {
            Some(SessionToken(value))
        };

        true
    }

    /// Adds the `Cookie` header carrying the stored session token to the request.
    pub fn attach(&self, request: RequestBuilder) -> Result<RequestBuilder, MissingSessionError> {
        let token = self.token().ok_or(MissingSessionError)?;
        Ok(request.header(COOKIE, format!("{}={}", self.cookie_name, token.value())))
    }

    /// Drops the stored session token.
    pub fn clear(&mut self) {
        self.token = None;
    }
}
