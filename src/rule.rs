use std::net::IpAddr;

use ipnet::IpNet;

use crate::context::RequestContext;
use crate::error::ConfigError;
use crate::forwarder::Forwarder;

/// An ordered set of CIDR subnets bound to one [`Forwarder`] (§4.2).
/// Immutable after config load.
#[derive(Clone, Debug)]
pub struct Rule {
    subnets: Vec<IpNet>,
    forwarder: Forwarder,
}

impl Rule {
    /// Parses `subnets` as CIDR strings. Fails on the first malformed
    /// entry, or if `subnets` is empty (§3 Invariants: a Rule always has
    /// at least one subnet).
    pub fn new(subnets: &[String], forwarder: Forwarder) -> Result<Self, ConfigError> {
        if subnets.is_empty() {
            return Err(ConfigError::EmptyRuleSubnets);
        }

        let mut parsed = Vec::with_capacity(subnets.len());
        for (index, subnet) in subnets.iter().enumerate() {
            let net: IpNet = subnet
                .parse()
                .map_err(|source| ConfigError::InvalidSubnet {
                    index,
                    subnet: subnet.clone(),
                    source,
                })?;
            parsed.push(net);
        }

        Ok(Self {
            subnets: parsed,
            forwarder,
        })
    }

    /// True iff any subnet contains `ip`. IPv4 and IPv6 are compared in
    /// their native family; a v4-mapped v6 address is canonicalized to v4
    /// first so it matches v4 subnets.
    pub fn matches(&self, ip: IpAddr) -> bool {
        let ip = canonicalize(ip);
        self.subnets.iter().any(|subnet| subnet.contains(&ip))
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }

    pub fn enrich(&self, ctx: &mut RequestContext) {
        self.forwarder.enrich(ctx);
    }
}

fn canonicalize(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_rule(subnets: &[&str]) -> Rule {
        let subnets: Vec<String> = subnets.iter().map(|s| s.to_string()).collect();
        Rule::new(&subnets, Forwarder::Direct).unwrap()
    }

    #[test]
    fn matches_ipv4_in_subnet() {
        let rule = direct_rule(&["10.0.0.0/8"]);
        assert!(rule.matches("10.1.2.3".parse().unwrap()));
        assert!(!rule.matches("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn matches_any_of_multiple_subnets() {
        let rule = direct_rule(&["10.0.0.0/8", "192.168.0.0/16"]);
        assert!(rule.matches("192.168.5.5".parse().unwrap()));
        assert!(rule.matches("10.9.9.9".parse().unwrap()));
        assert!(!rule.matches("172.16.0.1".parse().unwrap()));
    }

    #[test]
    fn matches_ipv6_natively() {
        let rule = direct_rule(&["fd00::/8"]);
        assert!(rule.matches("fd00::1".parse().unwrap()));
        assert!(!rule.matches("fe80::1".parse().unwrap()));
    }

    #[test]
    fn v4_mapped_v6_matches_v4_subnet() {
        let rule = direct_rule(&["10.0.0.0/8"]);
        let mapped: IpAddr = "::ffff:10.1.2.3".parse().unwrap();
        assert!(rule.matches(mapped));
    }

    #[test]
    fn malformed_cidr_is_a_config_error() {
        let err = Rule::new(&["not-a-cidr".to_string()], Forwarder::Direct).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSubnet { index: 0, .. }));
    }

    #[test]
    fn empty_subnets_is_a_config_error() {
        let err = Rule::new(&[], Forwarder::Direct).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRuleSubnets));
    }
}
