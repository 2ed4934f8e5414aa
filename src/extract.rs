//! Field extraction from raw registry replies
//!
//! Registry output is free text; the fields of interest are recovered with a
//! small set of patterns covering the formats observed from ARIN, RIPE,
//! AFRINIC, APNIC, LACNIC and JPNIC plus the registrar records returned for
//! domain queries.

use ip_network::{Ipv4Network, Ipv6Network};
use regex::{Captures, Regex};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::LazyLock;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

// Registrar records carry the registrant's own country next to the
// registrar's; the generic pattern also fires on RIR `country:` attributes.
static REGISTRANT_COUNTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Registrant Country:[ \t]*([A-Z]{2})\s").unwrap());
static COUNTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)country:[ \t]*([[:alpha:]]{2})\s").unwrap());

// ARIN and JPNIC (and some RIPE mirrors) publish the block in CIDR form.
static CIDR_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:a\.[ \t]+\[Network Number\]|CIDR:|inet6num:|inetnum:)[ \t]+(\S+/\d+)").unwrap()
});
// RIPE, AFRINIC, APNIC and LACNIC publish it as a first - last range.
static RANGE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:inetnum|inet6num):[ \t]+(\S+) - (\S+)").unwrap());

/// Collects every two-letter country code in the reply, in document order.
///
/// Both patterns are scanned and their matches merged by position, so a
/// single `Registrant Country:` line yields a single entry even though the
/// generic pattern fires on it too. The last entry is the one callers
/// should prefer: later records belong to the more specific holder.
pub fn countries(text: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = Vec::new();
    for re in [&*REGISTRANT_COUNTRY, &*COUNTRY] {
        for cap in re.captures_iter(text) {
            let Some(code) = cap.get(1) else { continue };
            found.push((code.start(), code.as_str().to_ascii_uppercase()));
        }
    }
    found.sort_by_key(|(pos, _)| *pos);
    found.dedup_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, code)| code).collect()
}

/// Tries to extract a network block in CIDR form from the reply.
///
/// Explicit CIDR entries are preferred over first - last ranges; within a
/// family, candidates are taken from the last match backwards, as later
/// entries describe the narrower allocation. A candidate is accepted only
/// once it validates as a network.
pub fn cidr(text: &str) -> Option<String> {
    scan_back(text, &CIDR_ENTRY, direct_candidate)
        .or_else(|| scan_back(text, &RANGE_ENTRY, range_candidate))
}

fn scan_back(
    text: &str,
    re: &Regex,
    candidate: fn(&Captures) -> Option<String>,
) -> Option<String> {
    let matches: Vec<Captures> = re.captures_iter(text).collect();
    matches.iter().rev().find_map(candidate)
}

fn direct_candidate(cap: &Captures) -> Option<String> {
    let repaired = expand(cap[1].trim());
    parse_network(&repaired).map(|_| repaired)
}

fn range_candidate(cap: &Captures) -> Option<String> {
    network_from_range(cap[1].trim(), cap[2].trim())
}

/// Re-adds the dotted octets LACNIC leaves out (`179.6/16`), so the
/// candidate can be validated like any other.
///
/// A well-formed candidate is returned unchanged. Truncated IPv6 forms are
/// not repaired; such a candidate yields nothing.
fn expand(candidate: &str) -> String {
    if parse_network(candidate).is_some() {
        return candidate.to_string();
    }
    if candidate.contains(':') || !candidate.contains('.') {
        return String::new();
    }
    let Some((address, prefix)) = candidate.split_once('/') else {
        return String::new();
    };
    let octets = address.split('.').count();
    if (1..4).contains(&octets) {
        let mut address = address.to_string();
        for _ in octets..4 {
            address.push_str(".0");
        }
        format!("{address}/{prefix}")
    } else {
        candidate.to_string()
    }
}

/// Validates an `address/prefix` candidate. Host bits past the prefix are
/// tolerated, as registries are not consistent about masking them off.
fn parse_network(candidate: &str) -> Option<ip_network::IpNetwork> {
    let (address, prefix) = candidate.split_once('/')?;
    let address = IpAddr::from_str(address).ok()?;
    let prefix = u8::from_str(prefix).ok()?;
    ip_network::IpNetwork::new_truncate(address, prefix).ok()
}

/// Derives the smallest network that starts at the masked range start and
/// still contains the range end. Mixed address families yield nothing, and
/// a range that only fits in /0 is treated as no data.
fn network_from_range(start: &str, end: &str) -> Option<String> {
    let start = IpAddr::from_str(start).ok()?;
    let end = IpAddr::from_str(end).ok()?;
    match (start, end) {
        (IpAddr::V4(start), IpAddr::V4(end)) => {
            for prefix in (1..=32u8).rev() {
                let network = Ipv4Network::new_truncate(start, prefix).ok()?;
                if network.contains(end) {
                    return Some(network.to_string());
                }
            }
            None
        }
        (IpAddr::V6(start), IpAddr::V6(end)) => {
            for prefix in (1..=128u8).rev() {
                let network = Ipv6Network::new_truncate(start, prefix).ok()?;
                if network.contains(end) {
                    return Some(network.to_string());
                }
            }
            None
        }
        _ => {
            debug!("Mixed address families in range {} - {}", start, end);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arin_cidr() {
        const RESP: &str = "\
NetRange:       69.175.0.0 - 69.175.127.255\r
CIDR:           69.175.0.0/17\r
NetName:        SINGLEHOP-LLC\r
NetHandle:      NET-69-175-0-0-1\r
Parent:         NET69 (NET-69-0-0-0-0)\r
NetType:        Direct Allocation\r
Organization:   SingleHop LLC (SINGL-11)\r
RegDate:        2008-09-03\r
Updated:        2012-02-24\r
Ref:            https://rdap.arin.net/registry/ip/69.175.0.0\r
\r
OrgName:        SingleHop LLC\r
OrgId:          SINGL-11\r
Address:        123 N. Wacker Drive\r
City:           Chicago\r
StateProv:      IL\r
PostalCode:     60606\r
Country:        US\r
";
        assert_eq!(cidr(RESP).as_deref(), Some("69.175.0.0/17"));
        assert_eq!(countries(RESP), ["US"]);
    }

    #[test]
    fn ripe_range() {
        const RESP: &str = "\
% Information related to '185.112.146.0 - 185.112.146.255'\r
\r
inetnum:        185.112.146.0 - 185.112.146.255\r
netname:        NO-DARKLIGHT-20150612\r
country:        NO\r
org:            ORG-RA462-RIPE\r
admin-c:        TH3032-RIPE\r
tech-c:         TH3032-RIPE\r
status:         ASSIGNED PI\r
mnt-by:         RIPE-NCC-END-MNT\r
created:        2015-06-12T12:01:15Z\r
last-modified:  2019-04-01T08:49:27Z\r
source:         RIPE\r
";
        assert_eq!(cidr(RESP).as_deref(), Some("185.112.146.0/24"));
        assert_eq!(countries(RESP), ["NO"]);
    }

    #[test]
    fn lacnic_truncated_cidr() {
        const RESP: &str = "\
inetnum:     179.6/16\r
status:      allocated\r
aut-num:     N/A\r
owner:       Telefonica del Peru S.A.A.\r
ownerid:     PE-TDPS-LACNIC\r
responsible: Administrador Red IP\r
country:     PE\r
";
        assert_eq!(cidr(RESP).as_deref(), Some("179.6.0.0/16"));
        assert_eq!(countries(RESP), ["PE"]);
    }

    #[test]
    fn jpnic_network_number() {
        const RESP: &str = "\
Network Information: [ネットワーク情報]\r
a. [Network Number]             202.214.194.128/25\r
b. [Network Name]               HOGE-NET\r
g. [Organization]               Example Japan K.K.\r
";
        assert_eq!(cidr(RESP).as_deref(), Some("202.214.194.128/25"));
    }

    #[test]
    fn inet6num_cidr() {
        const RESP: &str = "inet6num:       2a00:1450:4000::/37 \n";
        assert_eq!(cidr(RESP).as_deref(), Some("2a00:1450:4000::/37"));
    }

    #[test]
    fn inet6num_range() {
        const RESP: &str = "inet6num:        2a02:750:9:: - 2a02:750:9:ffff:ffff:ffff:ffff:ffff \n";
        assert_eq!(cidr(RESP).as_deref(), Some("2a02:750:9::/48"));
    }

    #[test]
    fn plain_cidr_line() {
        const RESP: &str = "CIDR: 192.168.13.0/24 \n";
        assert_eq!(cidr(RESP).as_deref(), Some("192.168.13.0/24"));
    }

    #[test]
    fn plain_range_line() {
        const RESP: &str = "inetnum: 192.168.12.0 - 192.168.12.255 \n";
        assert_eq!(cidr(RESP).as_deref(), Some("192.168.12.0/24"));
    }

    #[test]
    fn later_entries_preferred() {
        const RESP: &str = "\
CIDR:           10.0.0.0/8\r
CIDR:           10.1.0.0/16\r
";
        assert_eq!(cidr(RESP).as_deref(), Some("10.1.0.0/16"));
    }

    #[test]
    fn invalid_later_entry_skipped() {
        const RESP: &str = "\
CIDR:           10.0.0.0/8\r
CIDR:           999.1.0.0/16\r
";
        assert_eq!(cidr(RESP).as_deref(), Some("10.0.0.0/8"));
    }

    #[test]
    fn cidr_preferred_over_range() {
        const RESP: &str = "\
NetRange:       69.175.0.0 - 69.175.127.255\r
CIDR:           69.175.0.0/17\r
inetnum:        69.175.97.0 - 69.175.97.255\r
";
        assert_eq!(cidr(RESP).as_deref(), Some("69.175.0.0/17"));
    }

    #[test]
    fn no_network_data() {
        const RESP: &str = "% no entries found\n";
        assert_eq!(cidr(RESP), None);
        assert!(countries(RESP).is_empty());
    }

    #[test]
    fn expand_is_idempotent() {
        assert_eq!(expand("192.168.0.0/16"), "192.168.0.0/16");
        assert_eq!(expand("179.6/16"), "179.6.0.0/16");
        assert_eq!(expand("179.6.0/16"), "179.6.0.0/16");
        // a bare number is not a truncated dotted quad
        assert_eq!(expand("179/8"), "");
    }

    #[test]
    fn expand_declines_ipv6() {
        assert_eq!(expand("2a00:1450/32"), "");
    }

    #[test]
    fn range_contains_both_ends() {
        let network = network_from_range("192.168.12.0", "192.168.12.255").unwrap();
        let network: Ipv4Network = network.parse().unwrap();
        assert!(network.contains("192.168.12.0".parse().unwrap()));
        assert!(network.contains("192.168.12.255".parse().unwrap()));
    }

    #[test]
    fn uneven_range_still_covered() {
        // Not a power-of-two span, the enclosing block must widen
        let network = network_from_range("10.0.1.0", "10.0.4.255").unwrap();
        assert_eq!(network, "10.0.0.0/21");
    }

    #[test]
    fn range_rejects_mixed_families() {
        assert_eq!(network_from_range("192.168.0.0", "2a00::1"), None);
    }

    #[test]
    fn range_rejects_whole_address_space() {
        assert_eq!(network_from_range("0.0.0.0", "255.255.255.255"), None);
    }

    #[test]
    fn registrant_country_counted_once() {
        const RESP: &str = "Registrant Country: PA\nblablah\nRegistrant Country: BB\n";
        assert_eq!(countries(RESP), ["PA", "BB"]);
    }

    #[test]
    fn country_case_is_normalized() {
        assert_eq!(countries("country: se \n"), ["SE"]);
        assert_eq!(countries("Country: SE\n"), ["SE"]);
    }

    #[test]
    fn last_country_is_most_specific() {
        const RESP: &str = "\
Registrar: Example Registrar Inc.\r
Registrar Country: US\r
Registrant Name: Registration Private\r
Registrant Country: SE\r
";
        let found = countries(RESP);
        assert_eq!(found, ["US", "SE"]);
        assert_eq!(found.last().map(String::as_str), Some("SE"));
    }
}
