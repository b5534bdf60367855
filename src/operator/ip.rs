//! IP and CIDR matching.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use super::{MatchOperator, Matched};
use crate::error::{Result, WafError};

#[derive(Debug, Clone, Copy)]
struct Network {
    addr: IpAddr,
    prefix_len: u8,
}

impl Network {
    fn parse(spec: &str) -> Result<Self> {
        match spec.split_once('/') {
            Some((addr, prefix)) => {
                let addr = IpAddr::from_str(addr)
                    .map_err(|_| WafError::InvalidCidr(spec.to_string()))?;
                let prefix_len: u8 = prefix
                    .parse()
                    .map_err(|_| WafError::InvalidCidr(spec.to_string()))?;
                let max = match addr {
                    IpAddr::V4(_) => 32,
                    IpAddr::V6(_) => 128,
                };
                if prefix_len > max {
                    return Err(WafError::InvalidCidr(spec.to_string()));
                }
                Ok(Self { addr, prefix_len })
            }
            None => {
                let addr = IpAddr::from_str(spec)
                    .map_err(|_| WafError::InvalidIpAddress(spec.to_string()))?;
                let prefix_len = match addr {
                    IpAddr::V4(_) => 32,
                    IpAddr::V6(_) => 128,
                };
                Ok(Self { addr, prefix_len })
            }
        }
    }

    fn contains(&self, ip: IpAddr) -> bool {
        match (ip, self.addr) {
            (IpAddr::V4(ip), IpAddr::V4(net)) => ipv4_in_network(ip, net, self.prefix_len),
            (IpAddr::V6(ip), IpAddr::V6(net)) => ipv6_in_network(ip, net, self.prefix_len),
            _ => false,
        }
    }
}

fn ipv4_in_network(ip: Ipv4Addr, network: Ipv4Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let mask = !((1u32 << (32 - prefix_len)) - 1);
    (u32::from(ip) & mask) == (u32::from(network) & mask)
}

fn ipv6_in_network(ip: Ipv6Addr, network: Ipv6Addr, prefix_len: u8) -> bool {
    let ip = ip.octets();
    let network = network.octets();
    let full_bytes = (prefix_len / 8) as usize;
    let remaining_bits = prefix_len % 8;

    if ip[..full_bytes] != network[..full_bytes] {
        return false;
    }
    if remaining_bits > 0 && full_bytes < 16 {
        let mask = 0xFFu8 << (8 - remaining_bits);
        return (ip[full_bytes] & mask) == (network[full_bytes] & mask);
    }
    true
}

/// Matches when the candidate parses as an IP address contained in any of
/// the configured addresses or CIDR ranges.
#[derive(Debug, Clone)]
pub struct IpMatch {
    networks: Vec<Network>,
}

impl IpMatch {
    /// Each entry is either a plain address (`"192.168.0.1"`) or CIDR
    /// notation (`"10.0.0.0/8"`, `"2001:db8::/32"`).
    pub fn new<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        let networks = specs
            .iter()
            .map(|s| Network::parse(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { networks })
    }
}

impl MatchOperator for IpMatch {
    fn name(&self) -> &'static str {
        "ip_match"
    }

    fn evaluate(&self, candidate: &str) -> Option<Matched> {
        let ip = IpAddr::from_str(candidate).ok()?;
        self.networks
            .iter()
            .any(|n| n.contains(ip))
            .then(|| Matched::new(candidate))
    }
}
