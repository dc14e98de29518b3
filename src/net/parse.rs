//! CIDR string parsing, global-routability filtering, and free-text
//! extraction.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnetwork::IpNetwork;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::net::range::collapse;

/// Counts produced while parsing a batch of raw CIDR strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseCounts {
    pub total: usize,
    pub malformed: usize,
    pub non_global: usize,
    pub total_final: usize,
}

/// Result of parsing and collapsing a batch of raw CIDR strings.
#[derive(Debug, Clone, Default)]
pub struct ParsedCidrs {
    pub counts: ParseCounts,
    pub ipv4: Vec<IpNetwork>,
    pub ipv6: Vec<IpNetwork>,
}

impl ParsedCidrs {
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }

    pub fn all(&self) -> Vec<IpNetwork> {
        self.ipv4.iter().chain(self.ipv6.iter()).copied().collect()
    }
}

/// Parses a batch of raw CIDR strings.
///
/// Each string is parsed loosely (host bits are masked to the network
/// address, matching `ip_network(s, strict=False)`). Malformed entries are
/// counted and skipped; if `only_global` is set, non-globally-routable
/// prefixes are counted and skipped too. The surviving prefixes are split by
/// version and collapsed to their minimal cover.
pub fn parse_raw(cidrs: &[String], only_global: bool) -> ParsedCidrs {
    let mut counts = ParseCounts::default();
    let mut ipv4 = Vec::new();
    let mut ipv6 = Vec::new();

    for raw in cidrs {
        counts.total += 1;
        match parse_loose(raw) {
            Some(net) => {
                if only_global && !is_global(net) {
                    counts.non_global += 1;
                    continue;
                }
                match net {
                    IpNetwork::V4(_) => ipv4.push(net),
                    IpNetwork::V6(_) => ipv6.push(net),
                }
            }
            None => counts.malformed += 1,
        }
    }

    collapse(&mut ipv4);
    collapse(&mut ipv6);
    counts.total_final = ipv4.len() + ipv6.len();

    ParsedCidrs { counts, ipv4, ipv6 }
}

/// Parses one CIDR string, masking host bits to zero rather than rejecting
/// the input ("loose"/non-strict parsing, e.g. `10.0.0.5/24` -> `10.0.0.0/24`).
fn parse_loose(raw: &str) -> Option<IpNetwork> {
    let net: IpNetwork = raw.trim().parse().ok()?;
    Some(match net {
        IpNetwork::V4(n) => IpNetwork::V4(
            ipnetwork::Ipv4Network::new(n.network(), n.prefix()).ok()?,
        ),
        IpNetwork::V6(n) => IpNetwork::V6(
            ipnetwork::Ipv6Network::new(n.network(), n.prefix()).ok()?,
        ),
    })
}

static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[0-9]{1,3}\.){3}[0-9]{1,3}(?:/[0-9]{1,2})?").unwrap());
static IPV6_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Fa-f0-9:]+:[A-Fa-f0-9]*(?:/[0-9]{1,3})?").unwrap());

/// Extracts CIDR-shaped tokens from free text and parses each one.
///
/// Uses two permissive regexes to find candidate tokens, then feeds each
/// to the strict parser below, silently dropping tokens that fail to
/// parse. The IPv6 regex is deliberately over-eager: it will match strings
/// like `fasd::dsf:bf` that then fail to parse as a valid network and are
/// dropped here.
pub fn parse_raw_free_text(text: &str, only_global: bool) -> ParsedCidrs {
    let mut tokens: Vec<String> = IPV4_RE.find_iter(text).map(|m| m.as_str().to_string()).collect();
    tokens.extend(IPV6_RE.find_iter(text).map(|m| m.as_str().to_string()));
    parse_raw(&tokens, only_global)
}

/// Whether an `IpNetwork`'s base address is globally routable.
///
/// A network is "global" here if its network address is global; mirrors
/// `ipaddress.IPv4Network.is_global` / `IPv6Network.is_global` from the
/// Python standard library, which the source system relies on directly.
pub fn is_global(net: IpNetwork) -> bool {
    match net.network() {
        IpAddr::V4(addr) => is_global_v4(addr),
        IpAddr::V6(addr) => is_global_v6(addr),
    }
}

fn is_global_v4(addr: Ipv4Addr) -> bool {
    if addr.is_private()
        || addr.is_loopback()
        || addr.is_link_local()
        || addr.is_multicast()
        || addr.is_broadcast()
        || addr.is_unspecified()
        || addr.is_documentation()
    {
        return false;
    }
    // 0.0.0.0/8 "this network" and 192.0.0.0/24 IETF protocol assignments,
    // not covered by the std helpers above.
    let octets = addr.octets();
    if octets[0] == 0 {
        return false;
    }
    if octets[0] == 192 && octets[1] == 0 && octets[2] == 0 {
        return false;
    }
    true
}

fn is_global_v6(addr: Ipv6Addr) -> bool {
    if addr.is_loopback() || addr.is_unspecified() || addr.is_multicast() {
        return false;
    }
    let segments = addr.segments();
    // fc00::/7 - unique local addresses (ULA)
    if (segments[0] & 0xfe00) == 0xfc00 {
        return false;
    }
    // fe80::/10 - link-local
    if (segments[0] & 0xffc0) == 0xfe80 {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_raw_masks_host_bits() {
        let parsed = parse_raw(&strs(&["10.0.0.5/24"]), true);
        assert_eq!(parsed.ipv4, vec!["10.0.0.0/24".parse::<IpNetwork>().unwrap()]);
    }

    #[test]
    fn parse_raw_counts_malformed() {
        let parsed = parse_raw(&strs(&["not-a-cidr", "23.23.23.23/32"]), true);
        assert_eq!(parsed.counts.malformed, 1);
        assert_eq!(parsed.counts.total, 2);
        assert_eq!(parsed.ipv4.len(), 1);
    }

    #[test]
    fn parse_raw_filters_non_global_when_requested() {
        let parsed = parse_raw(&strs(&["192.168.1.0/24", "8.8.8.0/24"]), true);
        assert_eq!(parsed.counts.non_global, 1);
        assert_eq!(parsed.ipv4, vec!["8.8.8.0/24".parse::<IpNetwork>().unwrap()]);
    }

    #[test]
    fn parse_raw_keeps_non_global_when_disabled() {
        // Deletes must accept previously-stored non-global addresses.
        let parsed = parse_raw(&strs(&["192.168.1.0/24"]), false);
        assert_eq!(parsed.counts.non_global, 0);
        assert_eq!(parsed.ipv4.len(), 1);
    }

    #[test]
    fn free_text_extraction_drops_malformed_and_non_global_tokens() {
        let text = "hello 1.1.1.1/33 23.23.23.23/32 13.14.15.16/24 2c0f:fb50::/128 fasd::dsf:bf";
        let parsed = parse_raw_free_text(text, true);
        let mut all: Vec<String> = parsed.all().iter().map(|n| n.to_string()).collect();
        all.sort();
        assert_eq!(
            all,
            vec![
                "13.14.15.0/24".to_string(),
                "23.23.23.23/32".to_string(),
                "2c0f:fb50::/128".to_string(),
            ]
        );
    }
}
