//! Host matching rules for proxy bypass and deny lists
//!
//! Rules are comma-separated entries:
//! * `*` matches every host
//! * an IP address matches that address, optionally with a `/prefix` subnet
//! * anything else is a domain that matches itself and all subdomains; a
//!   leading dot is optional (`example.com` and `.example.com` are equivalent)

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostRule {
    Any,
    Subnet(IpAddr, u8),
    Domain(String),
}

/// Parsed list of host rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostRules {
    rules: Vec<HostRule>,
}

impl HostRules {
    /// Parses a comma-separated rule list. Blank entries are skipped.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        let rules = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(parse_rule)
            .collect();
        Self { rules }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check whether `host` (a hostname or IP literal) matches any rule.
    #[must_use]
    pub fn matches(&self, host: &str) -> bool {
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host)
            .trim_end_matches('.')
            .to_ascii_lowercase();
        let ip = host.parse::<IpAddr>().ok();

        self.rules.iter().any(|rule| match rule {
            HostRule::Any => true,
            HostRule::Subnet(network, prefix_len) => {
                ip.is_some_and(|ip| ip_in_subnet(ip, *network, *prefix_len))
            }
            HostRule::Domain(domain) => {
                host == *domain
                    || host
                        .strip_suffix(domain.as_str())
                        .is_some_and(|rest| rest.ends_with('.'))
            }
        })
    }
}

fn parse_rule(entry: &str) -> HostRule {
    if entry == "*" {
        return HostRule::Any;
    }
    if let Some((network, prefix_len)) = parse_cidr_pattern(entry) {
        return HostRule::Subnet(network, prefix_len);
    }
    if let Ok(ip) = entry.parse::<IpAddr>() {
        let full = if ip.is_ipv4() { 32 } else { 128 };
        return HostRule::Subnet(ip, full);
    }
    HostRule::Domain(entry.trim_start_matches('.').to_ascii_lowercase())
}

/// Parse a CIDR pattern (e.g., "192.168.1.0/24" or "2001:db8::/32")
fn parse_cidr_pattern(pattern: &str) -> Option<(IpAddr, u8)> {
    let (network_str, prefix_str) = pattern.split_once('/')?;
    let network_addr = network_str.parse::<IpAddr>().ok()?;
    let prefix_len = prefix_str.parse::<u8>().ok()?;

    let max_prefix = match network_addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };

    (prefix_len <= max_prefix).then_some((network_addr, prefix_len))
}

fn ip_in_subnet(ip: IpAddr, network: IpAddr, prefix_len: u8) -> bool {
    match (ip, network) {
        (IpAddr::V4(ip_v4), IpAddr::V4(net_v4)) => ipv4_in_subnet(ip_v4, net_v4, prefix_len),
        (IpAddr::V6(ip_v6), IpAddr::V6(net_v6)) => ipv6_in_subnet(ip_v6, net_v6, prefix_len),
        _ => false,
    }
}

fn ipv4_in_subnet(ip: Ipv4Addr, network: Ipv4Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let mask = u32::MAX << (32 - u32::from(prefix_len));
    (u32::from(ip) & mask) == (u32::from(network) & mask)
}

fn ipv6_in_subnet(ip: Ipv6Addr, network: Ipv6Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let mask = u128::MAX << (128 - u32::from(prefix_len));
    (u128::from(ip) & mask) == (u128::from(network) & mask)
}

/// Destinations that skip the proxy and connect directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoProxy {
    rules: HostRules,
}

impl NoProxy {
    /// Reads `NO_PROXY`, falling back to `no_proxy`. `None` when unset or blank.
    #[must_use]
    pub fn from_env() -> Option<NoProxy> {
        let raw = super::url_handling::env_value("NO_PROXY", |name| std::env::var(name).ok())?;
        Self::from_string(&raw)
    }

    /// Parses a `no_proxy` style list. `None` when it holds no rules.
    #[must_use]
    pub fn from_string(no_proxy_list: &str) -> Option<Self> {
        let rules = HostRules::parse(no_proxy_list);
        (!rules.is_empty()).then_some(NoProxy { rules })
    }

    /// Check if a host should bypass the proxy.
    #[must_use]
    pub fn matches(&self, host: &str) -> bool {
        self.rules.matches(host)
    }
}
