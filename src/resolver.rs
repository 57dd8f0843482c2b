use std::net::IpAddr;

use async_trait::async_trait;

/// Optional FQDN resolution hook invoked by the Policy stage (§4.4) when a
/// request carries an FQDN destination. The default `Configuration` leaves
/// this `None`, in which case resolution is skipped and the FQDN is
/// forwarded as-is (useful when the chosen [`crate::forwarder::Forwarder`]
/// can resolve it itself, e.g. an onward SOCKS5 proxy).
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, fqdn: &str) -> std::io::Result<IpAddr>;
}

/// Resolves through the operating system's default resolver
/// (`tokio::net::lookup_host`). This is the only resolver shipped (§1
/// Non-goals: no DNS resolver beyond the system default).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, fqdn: &str) -> std::io::Result<IpAddr> {
        // lookup_host needs a port to parse a full socket address; the
        // port is discarded, only the resolved IP is used.
        let mut addrs = tokio::net::lookup_host((fqdn, 0)).await?;
        addrs
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses returned"))
    }
}
