//! Integer-interval algebra over IPv4/IPv6 address ranges.
//!
//! Every CIDR is represented internally as a closed `[lo, hi]` interval of
//! 128-bit integers (IPv4 addresses are simply values `< 2^32`). This is the
//! representation the rest of the engine subtracts and summarises over;
//! parsing to/from `IpNetwork` happens at the edges, in `net::parse`.

use ipnetwork::IpNetwork;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Which address family a range belongs to. Ranges of different versions are
/// never compared or subtracted from one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    V4,
    V6,
}

/// A closed interval `[lo, hi]` of addresses, plus the IP version it came
/// from (needed because a bare `u128` doesn't know whether to summarise back
/// into `/0..32` or `/0..128` prefixes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub lo: u128,
    pub hi: u128,
    pub version: Version,
}

impl Range {
    pub fn new(lo: u128, hi: u128, version: Version) -> Self {
        debug_assert!(lo <= hi, "range lower bound must not exceed upper bound");
        Range { lo, hi, version }
    }

    pub fn from_network(net: IpNetwork) -> Self {
        match net {
            IpNetwork::V4(net) => {
                let lo = u32::from(net.network()) as u128;
                let hi = u32::from(net.broadcast()) as u128;
                Range::new(lo, hi, Version::V4)
            }
            IpNetwork::V6(net) => {
                let lo = u128::from(net.network());
                let hi = u128::from(net.broadcast());
                Range::new(lo, hi, Version::V6)
            }
        }
    }

    fn max_bits(self) -> u32 {
        match self.version {
            Version::V4 => 32,
            Version::V6 => 128,
        }
    }

    /// The minimal CIDR cover of this range (delegates to [`summarise`]).
    pub fn summarise(self) -> Vec<IpNetwork> {
        summarise(self.lo, self.hi, self.version)
    }
}

/// Computes `base \ excl` (set subtraction) for two ranges of the same
/// version, returning 0, 1, or 2 resulting ranges: 0 if `excl` fully
/// covers `base`, 2 if it falls strictly inside `base`, 1 otherwise.
pub fn subtract(base: Range, excl: Range) -> Vec<Range> {
    debug_assert_eq!(base.version, excl.version);

    if base.hi < excl.lo || base.lo > excl.hi {
        // disjoint
        return vec![base];
    }

    if excl.lo <= base.lo && excl.hi >= base.hi {
        // excl fully covers base
        return vec![];
    }

    if excl.lo <= base.lo {
        // excl overlaps the left edge only
        return vec![Range::new(excl.hi + 1, base.hi, base.version)];
    }

    if excl.hi >= base.hi {
        // excl overlaps the right edge only
        return vec![Range::new(base.lo, excl.lo - 1, base.version)];
    }

    // excl strictly inside base: splits it in two
    vec![
        Range::new(base.lo, excl.lo - 1, base.version),
        Range::new(excl.hi + 1, base.hi, base.version),
    ]
}

/// The minimal set of aligned CIDR blocks covering `[lo, hi]`.
///
/// Standard greedy algorithm: at each step, take the largest power-of-two
/// block starting at `lo` that both (a) is aligned to `lo` and (b) doesn't
/// overrun `hi`, emit it, and advance `lo` past it.
pub fn summarise(mut lo: u128, hi: u128, version: Version) -> Vec<IpNetwork> {
    let max_bits = match version {
        Version::V4 => 32,
        Version::V6 => 128,
    };
    let mut out = Vec::new();

    loop {
        // Largest block size allowed by alignment of `lo`.
        let align_bits = if lo == 0 {
            max_bits
        } else {
            lo.trailing_zeros().min(max_bits)
        };
        let span = hi - lo;

        // Largest block size that still fits below `hi`. `block_mask(bits)`
        // is `2^bits - 1`; for `bits == 128` that value would overflow a
        // u128, but it only arises for `lo == 0` summarising the entire
        // IPv6 space, handled as a direct fit against `span`.
        let mut size_bits = align_bits;
        while size_bits > 0 && !fits(size_bits, span) {
            size_bits -= 1;
        }

        let prefix_len = max_bits - size_bits;
        out.push(network_from(lo, prefix_len, version));

        if size_bits == max_bits {
            // This single block covers the whole remaining range; advancing
            // `lo` past it would overflow, and there is nothing left to do.
            break;
        }
        let block = 1u128 << size_bits;
        match lo.checked_add(block) {
            Some(next) if next <= hi => lo = next,
            // Either the block just emitted reached `hi` exactly, or (only
            // possible when `hi == u128::MAX`) advancing past it would
            // overflow. Both mean nothing is left to cover.
            _ => break,
        }
    }

    out
}

/// Whether a `2^bits`-sized, aligned block fits within `span + 1` addresses.
fn fits(bits: u32, span: u128) -> bool {
    if bits >= 128 {
        true // 2^128 addresses always "fits" an IPv6 range; only reachable at lo == 0
    } else {
        (1u128 << bits) - 1 <= span
    }
}

fn network_from(addr: u128, prefix_len: u32, version: Version) -> IpNetwork {
    match version {
        Version::V4 => {
            let ip = Ipv4Addr::from(addr as u32);
            IpNetwork::V4(ipnetwork::Ipv4Network::new(ip, prefix_len as u8).expect("valid ipv4 prefix"))
        }
        Version::V6 => {
            let ip = Ipv6Addr::from(addr);
            IpNetwork::V6(ipnetwork::Ipv6Network::new(ip, prefix_len as u8).expect("valid ipv6 prefix"))
        }
    }
}

/// Excludes every range in `exclusions` from `cidr`, iteratively subdividing
/// the running set, then returns the minimal CIDR cover of what's left.
///
/// Mirrors `address_exclude_many` in the Python source: only exclusions of
/// the same IP version as `cidr` are considered; the loop bails out early
/// once the running set is empty.
pub fn exclude_many(cidr: IpNetwork, exclusions: &[IpNetwork]) -> Vec<IpNetwork> {
    let base = Range::from_network(cidr);
    let mut ranges = vec![base];

    for excl in exclusions {
        let excl_range = Range::from_network(*excl);
        if excl_range.version != base.version {
            continue;
        }
        let mut next = Vec::with_capacity(ranges.len());
        for r in &ranges {
            next.extend(subtract(*r, excl_range));
        }
        ranges = next;
        if ranges.is_empty() {
            break;
        }
    }

    let mut out: Vec<IpNetwork> = ranges
        .into_iter()
        .flat_map(|r| summarise(r.lo, r.hi, r.version))
        .collect();
    collapse(&mut out);
    out
}

/// Collapses a set of same-or-mixed-version CIDRs into their minimal cover,
/// in place. Networks that are subnets of another network in the set (or
/// adjacent and mergeable) are combined.
pub fn collapse(nets: &mut Vec<IpNetwork>) {
    if nets.len() <= 1 {
        return;
    }

    let mut v4 = Vec::new();
    let mut v6 = Vec::new();
    for n in nets.drain(..) {
        match n {
            IpNetwork::V4(_) => v4.push(Range::from_network(n)),
            IpNetwork::V6(_) => v6.push(Range::from_network(n)),
        }
    }

    nets.extend(collapse_ranges(v4, Version::V4));
    nets.extend(collapse_ranges(v6, Version::V6));
}

fn collapse_ranges(mut ranges: Vec<Range>, version: Version) -> Vec<IpNetwork> {
    if ranges.is_empty() {
        return Vec::new();
    }
    ranges.sort_by_key(|r| (r.lo, r.hi));

    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    for r in ranges {
        if let Some(last) = merged.last_mut() {
            if r.lo <= last.hi || r.lo == last.hi + 1 {
                last.hi = last.hi.max(r.hi);
                continue;
            }
        }
        merged.push(r);
    }

    merged
        .into_iter()
        .flat_map(|r| summarise(r.lo, r.hi, version))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> IpNetwork {
        s.parse().unwrap()
    }

    #[test]
    fn subtract_disjoint_returns_base() {
        let base = Range::from_network(net("10.0.0.0/24"));
        let excl = Range::from_network(net("11.0.0.0/24"));
        assert_eq!(subtract(base, excl), vec![base]);
    }

    #[test]
    fn subtract_full_cover_returns_empty() {
        let base = Range::from_network(net("10.0.1.0/24"));
        let excl = Range::from_network(net("10.0.0.0/16"));
        assert!(subtract(base, excl).is_empty());
    }

    #[test]
    fn subtract_left_edge_overlap() {
        let base = Range::from_network(net("10.0.0.0/24"));
        let excl = Range::from_network(net("10.0.0.0/25"));
        let out = subtract(base, excl);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].lo, base.lo + 128);
        assert_eq!(out[0].hi, base.hi);
    }

    #[test]
    fn subtract_right_edge_overlap() {
        let base = Range::from_network(net("10.0.0.0/24"));
        let excl = Range::from_network(net("10.0.0.128/25"));
        let out = subtract(base, excl);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].lo, base.lo);
        assert_eq!(out[0].hi, base.lo + 127);
    }

    #[test]
    fn subtract_strictly_inside_splits_in_two() {
        let base = Range::from_network(net("66.66.1.0/24"));
        let excl = Range::from_network(net("66.66.1.0/26"));
        let out = subtract(base, excl);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn exclude_many_empty_exclusions_is_identity() {
        let cidr = net("10.0.0.0/24");
        let out = exclude_many(cidr, &[]);
        assert_eq!(out, vec![cidr]);
    }

    #[test]
    fn exclude_many_self_exclusion_is_empty() {
        let cidr = net("10.0.0.0/24");
        let out = exclude_many(cidr, &[cidr]);
        assert!(out.is_empty());
    }

    #[test]
    fn exclude_many_splits_into_minimal_cover() {
        let cidr = net("66.66.1.0/24");
        let exclusion = net("66.66.1.0/26");
        let mut out = exclude_many(cidr, &[exclusion]);
        out.sort_by_key(|n| n.to_string());
        let strs: Vec<String> = out.iter().map(|n| n.to_string()).collect();
        assert_eq!(strs, vec!["66.66.1.128/25".to_string(), "66.66.1.64/26".to_string()]);
    }

    #[test]
    fn exclude_many_deny_fully_masked_by_safe() {
        let cidr = net("13.1.1.0/24");
        let safe = net("13.1.0.0/16");
        assert!(exclude_many(cidr, &[safe]).is_empty());
    }

    #[test]
    fn summarise_single_host_v4() {
        let out = summarise(167772160, 167772160, Version::V4); // 10.0.0.0/32
        assert_eq!(out, vec![net("10.0.0.0/32")]);
    }

    #[test]
    fn summarise_whole_v4_space_is_slash_zero() {
        let out = summarise(0, u32::MAX as u128, Version::V4);
        assert_eq!(out, vec![net("0.0.0.0/0")]);
    }

    #[test]
    fn summarise_ipv6_single_host() {
        let r = Range::from_network(net("2c0f:fb50::/128"));
        assert_eq!(summarise(r.lo, r.hi, Version::V6), vec![net("2c0f:fb50::/128")]);
    }

    #[test]
    fn summarise_upper_half_of_ipv6_space_does_not_overflow() {
        let r = Range::from_network(net("8000::/1"));
        assert_eq!(r.hi, u128::MAX);
        let out = summarise(r.lo, r.hi, Version::V6);
        assert_eq!(out, vec![net("8000::/1")]);
    }

    #[test]
    fn collapse_merges_adjacent_and_nested() {
        let mut nets = vec![net("13.1.0.0/16"), net("13.1.1.33/32")];
        collapse(&mut nets);
        assert_eq!(nets, vec![net("13.1.0.0/16")]);
    }
}
