//! The validated result of a single WHOIS query

use crate::extract;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Everything extracted from one source reply for one resource.
///
/// A `Response` is built once, from the raw reply bytes, and never changes
/// afterwards; a caller that wants fresh data performs a new query.
#[derive(Debug)]
pub struct Response {
    resource: String,
    raw: Vec<u8>,
    country_codes: Vec<String>,
    cidr: Option<String>,
}

impl Response {
    /// Parses a raw reply, extracting the country codes and network block.
    pub fn parse(resource: &str, raw: Vec<u8>) -> Self {
        let text = decode(&raw);
        trace!("Reply for {}:\n{}", resource, text);
        let country_codes = extract::countries(&text);
        let cidr = extract::cidr(&text);
        Self {
            resource: resource.to_string(),
            raw,
            country_codes,
            cidr,
        }
    }

    /// The resource the query was made for.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The complete reply as received, before any decoding.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Every country code found, in document order.
    pub fn country_codes(&self) -> &[String] {
        &self.country_codes
    }

    /// The country code to report: the last one found, as later records
    /// belong to the more specific holder.
    pub fn country_code(&self) -> Option<&str> {
        self.country_codes.last().map(String::as_str)
    }

    /// The network block in CIDR form, when one was found.
    pub fn cidr(&self) -> Option<&str> {
        self.cidr.as_deref()
    }

    /// Whether this response is worth returning to a caller: it must name
    /// a resource, carry a reply body, and have produced at least one of
    /// the two fields of interest.
    pub fn is_valid(&self) -> bool {
        !self.resource.is_empty()
            && !self.raw.is_empty()
            && (self.cidr.is_some() || !self.country_codes.is_empty())
    }
}

fn from_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&c| c as char).collect()
}

/// Decodes a reply for pattern scanning; some registries still answer in
/// Latin-1.
pub(crate) fn decode(raw: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(raw) {
        s.to_string()
    } else {
        from_latin1(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_with_country_only() {
        let r = Response::parse("something", b"country: SE \n".to_vec());
        assert!(r.is_valid());
        assert_eq!(r.country_code(), Some("SE"));
        assert_eq!(r.cidr(), None);
    }

    #[test]
    fn valid_with_cidr_only() {
        let r = Response::parse("something", b"CIDR: 192.168.0.0/16 \n".to_vec());
        assert!(r.is_valid());
        assert_eq!(r.cidr(), Some("192.168.0.0/16"));
        assert_eq!(r.country_code(), None);
    }

    #[test]
    fn valid_with_both() {
        let r = Response::parse(
            "something",
            b"CIDR: 192.168.0.0/16 \ncountry: SE \n".to_vec(),
        );
        assert!(r.is_valid());
        assert_eq!(r.cidr(), Some("192.168.0.0/16"));
        assert_eq!(r.country_code(), Some("SE"));
    }

    #[test]
    fn invalid_without_fields() {
        let r = Response::parse("something", b"% nothing here\n".to_vec());
        assert!(!r.is_valid());
    }

    #[test]
    fn invalid_without_resource() {
        let r = Response::parse("", b"country: SE \n".to_vec());
        assert!(!r.is_valid());
    }

    #[test]
    fn invalid_without_body() {
        let r = Response::parse("something", Vec::new());
        assert!(!r.is_valid());
    }

    #[test]
    fn latin1_reply_still_scans() {
        let mut raw = b"owner:       Telef".to_vec();
        raw.push(0xf3); // o-acute in Latin-1, not valid UTF-8
        raw.extend_from_slice(b"nica del Peru S.A.A.\ncountry:     PE\n");
        let r = Response::parse("179.6.221.254", raw);
        assert_eq!(r.country_code(), Some("PE"));
        assert!(r.is_valid());
    }
}
