use crate::addr::AddrSpec;
use crate::config::Configuration;
use crate::context::RequestContext;
use crate::forwarder::Forwarder;

/// Walks the configured rules in order and selects a [`Forwarder`] for a
/// request's destination (§4.3). Reads only the immutable `Configuration`,
/// so it's safe to call concurrently from every connection task without
/// locking.
pub struct Picker<'a> {
    config: &'a Configuration,
}

impl<'a> Picker<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Attaches `client_addr` and `matching_rule_id` to `ctx`, enriches
    /// `ctx` with the selected forwarder's identity, and returns that
    /// forwarder. First match wins; no match falls back to the default
    /// forwarder with `matching_rule_id = None`.
    pub fn pick(&self, dest: &AddrSpec, remote_addr: &AddrSpec, ctx: &mut RequestContext) -> &'a Forwarder {
        ctx.client_addr = Some(remote_addr.clone());

        if let Some(ip) = dest.ip {
            for (index, rule) in self.config.rules.iter().enumerate() {
                if rule.matches(ip) {
                    ctx.matching_rule_id = Some(index);
                    rule.enrich(ctx);
                    return rule.forwarder();
                }
            }
        }

        ctx.matching_rule_id = None;
        self.config.default_forwarder.enrich(ctx);
        &self.config.default_forwarder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn config_with(rules: Vec<Rule>, default: Forwarder) -> Configuration {
        Configuration {
            bind: "127.0.0.1:0".parse().unwrap(),
            rules,
            default_forwarder: default,
            loglevel: crate::config::LogLevel::Info,
            logformat: crate::config::LogFormat::Text,
            in_bucket: None,
            out_bucket: None,
        }
    }

    fn rule(subnet: &str, forwarder: Forwarder) -> Rule {
        Rule::new(&[subnet.to_string()], forwarder).unwrap()
    }

    #[test]
    fn first_match_wins() {
        let config = config_with(
            vec![
                rule("10.0.0.0/8", Forwarder::Direct),
                rule("10.1.0.0/16", Forwarder::socks5(Some("upstream:1080")).unwrap()),
            ],
            Forwarder::Direct,
        );
        let picker = Picker::new(&config);

        let mut ctx = RequestContext::new();
        let dest = AddrSpec::from_ip("10.1.2.3".parse().unwrap(), 80);
        let remote = AddrSpec::from_ip("127.0.0.1".parse().unwrap(), 55555);
        let fwd = picker.pick(&dest, &remote, &mut ctx);

        assert_eq!(ctx.matching_rule_id, Some(0));
        assert!(matches!(fwd, Forwarder::Direct));
    }

    #[test]
    fn second_rule_matches_when_first_does_not() {
        let config = config_with(
            vec![
                rule("172.16.0.0/12", Forwarder::Direct),
                rule("10.0.0.0/8", Forwarder::socks5(Some("upstream:1080")).unwrap()),
            ],
            Forwarder::Direct,
        );
        let picker = Picker::new(&config);

        let mut ctx = RequestContext::new();
        let dest = AddrSpec::from_ip("10.1.2.3".parse().unwrap(), 80);
        let remote = AddrSpec::from_ip("127.0.0.1".parse().unwrap(), 55555);
        let fwd = picker.pick(&dest, &remote, &mut ctx);

        assert_eq!(ctx.matching_rule_id, Some(1));
        assert!(matches!(fwd, Forwarder::Socks5Upstream { .. }));
    }

    #[test]
    fn falls_back_to_default_when_nothing_matches() {
        let config = config_with(vec![rule("10.0.0.0/8", Forwarder::Direct)], Forwarder::Direct);
        let picker = Picker::new(&config);

        let mut ctx = RequestContext::new();
        let dest = AddrSpec::from_ip("8.8.8.8".parse().unwrap(), 53);
        let remote = AddrSpec::from_ip("127.0.0.1".parse().unwrap(), 55555);
        picker.pick(&dest, &remote, &mut ctx);

        assert_eq!(ctx.matching_rule_id, None);
    }

    #[test]
    fn fqdn_only_destination_skips_rules() {
        let config = config_with(vec![rule("10.0.0.0/8", Forwarder::Direct)], Forwarder::Direct);
        let picker = Picker::new(&config);

        let mut ctx = RequestContext::new();
        let dest = AddrSpec::from_fqdn("example.com", 80);
        let remote = AddrSpec::from_ip("127.0.0.1".parse().unwrap(), 55555);
        picker.pick(&dest, &remote, &mut ctx);

        assert_eq!(ctx.matching_rule_id, None);
    }
}
