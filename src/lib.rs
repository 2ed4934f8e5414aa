//! WHOIS network metadata lookup
//!
//! Resolves the registration metadata of a domain name or IP address: the
//! network block (CIDR) it belongs to and the registration country code.
//! Queries start at the IANA root server and follow registry referrals to
//! the server holding the record; an installed whois client can be chained
//! in as an alternate data source.
//!
//! ```no_run
//! use std::time::Duration;
//! use whois_rs::{Client, ServerSource};
//!
//! let client = Client::new(vec![Box::new(ServerSource::new(
//!     whois_rs::IANA_SERVER,
//!     Duration::from_secs(whois_rs::DEFAULT_TIMEOUT_SECS),
//! ))]);
//! let response = client.query("example.org")?;
//! println!("{:?} {:?}", response.cidr(), response.country_code());
//! # Ok::<(), whois_rs::Error>(())
//! ```

mod error;
mod extract;
mod response;
mod sources;

pub use error::Error;
pub use response::Response;
pub use sources::Source;
pub use sources::program::{DEFAULT_PROGRAM, ProgramSource};
pub use sources::server::{IANA_SERVER, ServerSource};

use std::net::IpAddr;
use tracing::{debug, warn};

/// Default per-server query timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tries a list of sources in order and keeps the first valid response.
///
/// A source that fails or answers without usable data is not retried; its
/// failure is reported only when no later source does better.
pub struct Client {
    sources: Vec<Box<dyn Source>>,
}

impl Client {
    pub fn new(sources: Vec<Box<dyn Source>>) -> Self {
        Self { sources }
    }

    /// Resolves a resource through the configured sources.
    ///
    /// Domain names are converted to their ASCII form before being sent on
    /// the wire; IP literals pass through as given.
    pub fn query(&self, resource: &str) -> Result<Response, Error> {
        let resource = normalize(resource)?;
        let mut last: Option<Error> = None;
        for source in &self.sources {
            debug!("Querying {} for {}", source, resource);
            match source.query(&resource) {
                Ok(response) if response.is_valid() => return Ok(response),
                Ok(_) => {
                    debug!("{} had no usable data for {}", source, resource);
                    last = Some(Error::NoRecord {
                        resource: resource.clone(),
                    });
                }
                Err(e) => {
                    warn!("Query to {} for {} failed: {e}", source, resource);
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or(Error::NoResponse { resource }))
    }
}

fn normalize(resource: &str) -> Result<String, Error> {
    let resource = resource.trim();
    if resource.is_empty() {
        return Err(Error::InvalidResource {
            resource: resource.to_string(),
            message: "empty resource".to_string(),
        });
    }
    if resource.parse::<IpAddr>().is_ok() {
        return Ok(resource.to_string());
    }
    idna::domain_to_ascii_cow(resource.as_bytes(), idna::AsciiDenyList::URL)
        .map(|ascii| ascii.into_owned())
        .map_err(|e| Error::InvalidResource {
            resource: resource.to_string(),
            message: e.to_string(),
        })
}
