//! Outbound URL deny-list, checked immediately before every source fetch.

use std::net::{Ipv4Addr, Ipv6Addr};

use reqwest::Url;

/// Returns `true` only for http(s) URLs whose host is not loopback,
/// unspecified, private or link-local. Unparseable URLs are rejected.
#[must_use]
pub fn is_allowed(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw.trim()) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    // The parser normalizes numeric hosts to dotted quads and brackets IPv6.
    if let Some(v6) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        return v6.parse::<Ipv6Addr>().is_ok_and(is_public_v6);
    }
    match host.parse::<Ipv4Addr>() {
        Ok(v4) => is_public_v4(v4),
        Err(_) => is_public_name(host),
    }
}

fn is_public_name(name: &str) -> bool {
    let name = name.trim_end_matches('.').to_ascii_lowercase();
    !(name.is_empty() || name == "localhost" || name.ends_with(".localhost"))
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    !(ip.is_loopback() || ip.is_unspecified() || ip.is_private() || ip.is_link_local())
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return is_public_v4(mapped);
    }
    let first = ip.segments()[0];
    let link_local = first & 0xffc0 == 0xfe80;
    let unique_local = first & 0xfe00 == 0xfc00;
    !(ip.is_loopback() || ip.is_unspecified() || link_local || unique_local)
}
