//! Facilities for reading runtime configuration values
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, warn};

#[derive(Deserialize)]
/// Lookup tool configuration
pub struct Config {
    /// The whois server to start queries from
    pub server: Option<String>,
    /// The whois client executable to prefer
    pub whois_client: Option<std::path::PathBuf>,
    /// Whois server query timeout in seconds
    pub query_timeout_secs: Option<u32>,
}

impl Config {
    /// Loads the configuration from a `toml` file
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Figment::new()
            .merge(Toml::file("whois.toml"))
            .merge(Env::prefixed("WHOIS__").split("__"))
            .extract::<Self>()
            .map_err(|err| {
                error!("Failed to validate configuration: {}", err);
                err.into()
            })
    }
}
