#![deny(warnings)]

mod authenticator;
mod ceremony;
mod config;
mod encoding;
mod error;
mod network;
mod session;
mod webauthn;

use crate::{
    ceremony::CeremonyMode,
    config::{Config, RawConfig},
};
use anyhow::anyhow;
use clap::{Arg, Command, crate_authors, crate_description, crate_version, value_parser};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env::var("RUST_LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let matches = Command::new("Passkey ceremony client")
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::new("CONFIG")
                .env("PASSKEY_CEREMONY_CONFIG")
                .short('c')
                .long("config")
                .default_value("passkey-ceremony.toml")
                .help("Path to the application configuration file."),
        )
        .arg(
            Arg::new("ORIGIN")
                .long("origin")
                .value_parser(value_parser!(Url))
                .help("Origin of the relying party to run the ceremonies against."),
        )
        .arg(
            Arg::new("IDENTITY")
                .short('i')
                .long("identity")
                .help("Identity (e.g. email) to enroll and authenticate."),
        )
        .arg(
            Arg::new("MODE")
                .short('m')
                .long("mode")
                .value_parser(value_parser!(CeremonyMode))
                .help("Ceremonies to run: `register` or `register_and_authenticate`."),
        )
        .get_matches();

    let mut raw_config = RawConfig::read_from_file(
        matches
            .get_one::<String>("CONFIG")
            .ok_or_else(|| anyhow!("<CONFIG> argument is not provided."))?,
    )?;

    info!("Passkey ceremony raw configuration: {raw_config:?}.");

    // CLI arguments take precedence.
    if let Some(origin) = matches.get_one::<Url>("ORIGIN") {
        raw_config.relying_party.origin = origin.clone();
    }
    if let Some(identity) = matches.get_one::<String>("IDENTITY") {
        raw_config.identity = identity.clone();
    }
    if let Some(mode) = matches.get_one::<CeremonyMode>("MODE") {
        raw_config.mode = *mode;
    }

    ceremony::run(Config::try_from(raw_config)?)
}
