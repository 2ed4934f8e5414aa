//! The network source: RFC 3912 style queries with referral chasing

use crate::error::Error;
use crate::response::{self, Response};
use crate::sources::Source;
use regex::Regex;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::LazyLock;
use std::time::{Duration, Instant};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Where a query lands when no better server is known.
pub const IANA_SERVER: &str = "whois.iana.org";

const WHOIS_PORT: u16 = 43;
// Chains are root -> registry -> registrar in practice; anything longer is
// a cycle or a misconfigured registry and gets cut off.
const MAX_REFERRALS: usize = 4;
const MAX_REPLY_SIZE: usize = 64 * 1024;

static REFERRAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Registrar WHOIS Server|refer|whois):[ \t]+(\S+)\s").unwrap()
});

/// Queries a WHOIS server over TCP, following referrals to the server
/// actually holding the record.
pub struct ServerSource {
    server: String,
    timeout: Duration,
}

impl ServerSource {
    /// A source starting its queries at `hostname`, or at the IANA root
    /// when `hostname` is empty. An explicit `host:port` form is honored;
    /// a bare name implies port 43.
    pub fn new(hostname: &str, timeout: Duration) -> Self {
        let hostname = hostname.trim();
        let server = if hostname.is_empty() {
            IANA_SERVER.to_string()
        } else {
            hostname.to_ascii_lowercase()
        };
        Self { server, timeout }
    }

    /// Queries the starting server and chases referrals until a server
    /// names no further one, names itself, or the hop limit is reached.
    /// Reaching the limit is not an error: the last reply is still the
    /// best data available.
    fn follow_referrals(&self, resource: &str) -> Result<Vec<u8>, Error> {
        let mut server = self.server.clone();
        let mut hops = 0;
        let mut reply = Vec::new();
        while hops < MAX_REFERRALS {
            reply = query_server(&server, resource, &self.timeout)?;
            hops += 1;
            match referral(&response::decode(&reply)) {
                Some(next) if next != server => {
                    debug!("{} refers {} to {}", server, resource, next);
                    server = next;
                }
                _ => break,
            }
        }
        Ok(reply)
    }
}

impl Source for ServerSource {
    fn query(&self, resource: &str) -> Result<Response, Error> {
        let reply = self.follow_referrals(resource)?;
        if reply.is_empty() {
            return Err(Error::NoData {
                source_name: self.to_string(),
            });
        }
        Ok(Response::parse(resource, reply))
    }
}

impl std::fmt::Display for ServerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.server)
    }
}

/// Extracts the first referral target from a reply: registries use
/// `refer:` and `whois:`, registrar records use `Registrar WHOIS Server:`.
fn referral(reply: &str) -> Option<String> {
    REFERRAL
        .captures(reply)
        .map(|cap| cap[1].trim().to_ascii_lowercase())
}

fn split_host_port(server: &str) -> (&str, u16) {
    if let Some((host, port)) = server.rsplit_once(':') {
        // A second colon in the host part means an IPv6 literal, not a port
        if !host.contains(':') {
            if let Ok(port) = port.parse::<u16>() {
                return (host, port);
            }
        }
    }
    (server, WHOIS_PORT)
}

/// One hop: connect, send the resource, read the full reply.
///
/// The connect phase shares the timeout across all resolved address
/// candidates; the send and the read then each get the full timeout,
/// counted from the write. Bytes already buffered when the read deadline
/// expires are kept, a deadline with nothing received is a transport
/// failure. The connection is dropped on every exit path.
fn query_server(server: &str, resource: &str, timeout: &Duration) -> Result<Vec<u8>, Error> {
    let start = Instant::now();
    debug!("Connecting to {} for query on {}...", server, resource);
    let (host, port) = split_host_port(server);
    let mut addrs = (host, port)
        .to_socket_addrs()
        .inspect_err(|_| warn!("Failed to resolve {} for {}", server, resource))?;
    let stream = loop {
        let addr = addrs.next().ok_or_else(|| {
            warn!("Connection to {} for {} failed", server, resource);
            std::io::Error::new(std::io::ErrorKind::TimedOut, "connection failed")
        })?;
        let remaining = timeout.saturating_sub(start.elapsed());
        if let Ok(s) = TcpStream::connect_timeout(&addr, remaining) {
            break s;
        }
    };
    stream
        .set_write_timeout(Some(*timeout))
        .and_then(|_| (&stream).write_all(format!("{resource}\r\n").as_bytes()))
        .inspect_err(|e| warn!("Send to {} for {} failed: {e}", server, resource))?;
    debug!("Query sent to {} for {}", server, resource);
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    stream
        .set_read_timeout(Some(*timeout))
        .inspect_err(|e| warn!("Recv from {} for {} failed: {e}", server, resource))?;
    match stream.take(MAX_REPLY_SIZE as u64).read_to_end(&mut buf) {
        Ok(_) => {}
        Err(e)
            if matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ) && !buf.is_empty() =>
        {
            debug!(
                "Recv from {} for {} cut short with {} bytes buffered: {e}",
                server,
                resource,
                buf.len()
            );
        }
        Err(e) => {
            warn!("Recv from {} for {} failed: {e}", server, resource);
            return Err(e.into());
        }
    }
    Ok(buf)
}
