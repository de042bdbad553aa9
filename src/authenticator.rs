mod authenticator_error;
mod command_authenticator;

pub use self::{
    authenticator_error::AuthenticatorError, command_authenticator::CommandAuthenticator,
};

use crate::webauthn::{
    AuthenticationCredential, CreationChallenge, RegistrationCredential, RequestChallenge,
};
use futures::future::BoxFuture;
use url::{Host, Url};

/// Capability that produces credentials bound to a server-issued challenge and the calling origin.
pub trait Authenticator: Sync + Send + 'static {
    /// Creates a new credential for the registration ceremony.
    fn create<'a>(
        &'a self,
        origin: &'a Url,
        challenge: &'a CreationChallenge,
    ) -> BoxFuture<'a, Result<RegistrationCredential, AuthenticatorError>>;

    /// Asserts possession of an existing credential for the authentication ceremony.
    fn assert<'a>(
        &'a self,
        origin: &'a Url,
        challenge: &'a RequestChallenge,
    ) -> BoxFuture<'a, Result<AuthenticationCredential, AuthenticatorError>>;
}

/// Checks that the relying party identifier from the challenge is the origin's host or one of its
/// registrable parent domains. Public suffixes (`com`, `github.io`) are never valid identifiers for
/// a subdomain, and IP address origins only accept the exact address. Challenges without an
/// explicit identifier are scoped to the origin itself.
pub fn ensure_rp_id_matches_origin(
    origin: &Url,
    rp_id: Option<&str>,
) -> Result<(), AuthenticatorError> {
    let (Some(host), Some(host_str)) = (origin.host(), origin.host_str()) else {
        return Err(AuthenticatorError::InvalidChallenge(format!(
            "origin `{origin}` doesn't have a host"
        )));
    };

    let Some(rp_id) = rp_id else {
        return Ok(());
    };

    let rp_id = rp_id.to_ascii_lowercase();
    let is_valid = match host {
        Host::Domain(domain) => domain == rp_id || is_registrable_parent_domain(domain, &rp_id),
        Host::Ipv4(_) | Host::Ipv6(_) => host_str == rp_id,
    };

    if is_valid {
        Ok(())
    } else {
        Err(AuthenticatorError::InvalidChallenge(format!(
            "relying party `{rp_id}` isn't valid for origin `{origin}`"
        )))
    }
}

fn is_registrable_parent_domain(domain: &str, rp_id: &str) -> bool {
    let is_parent = domain
        .strip_suffix(rp_id)
        .is_some_and(|prefix| prefix.ends_with('.'));

    // Parent domain must have a registrable part on top of its public suffix.
    is_parent && addr::parse_domain_name(rp_id).is_ok_and(|name| name.root().is_some())
}
