use crate::config::HttpClientConfig;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;

/// User agent the relying party sees for every ceremony request.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Creates HTTP client used to talk to the relying party. Failed requests are never retried, the
/// relying party challenges are single use.
pub fn create_http_client(config: &HttpClientConfig) -> anyhow::Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .connection_verbose(config.verbose)
        .danger_accept_invalid_certs(config.accept_invalid_certificates)
        .build()?;

    Ok(ClientBuilder::new(client)
        .with(TracingMiddleware::default())
        .build())
}
