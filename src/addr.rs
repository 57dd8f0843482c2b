use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// A destination triple as carried by the SOCKS5 wire protocol: an IPv4,
/// IPv6, or FQDN host plus a port. On the wire, exactly one of `ip`/`fqdn`
/// is populated; after a resolver hook runs, both may be set (`fqdn` keeps
/// the original name, `ip` carries the resolved address used to dial).
///
/// Immutable once constructed — callers that need a rewritten destination
/// build a new `AddrSpec` rather than mutating this one (see
/// [`crate::rewriter::Rewriter`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddrSpec {
    pub fqdn: Option<String>,
    pub ip: Option<IpAddr>,
    pub port: u16,
}

impl AddrSpec {
    pub fn from_ip(ip: IpAddr, port: u16) -> Self {
        Self {
            fqdn: None,
            ip: Some(ip),
            port,
        }
    }

    pub fn from_fqdn(fqdn: impl Into<String>, port: u16) -> Self {
        Self {
            fqdn: Some(fqdn.into()),
            ip: None,
            port,
        }
    }

    pub fn from_socket_addr(addr: SocketAddr) -> Self {
        Self::from_ip(addr.ip(), addr.port())
    }

    /// `host:port` suitable for passing to a dialer. Prefers the resolved
    /// IP when present, since that's what a direct dial needs; falls back
    /// to the FQDN so an upstream SOCKS5 forwarder can resolve it itself.
    pub fn address(&self) -> String {
        match &self.ip {
            Some(ip) => format!("{}:{}", ip, self.port),
            None => format!("{}:{}", self.fqdn.as_deref().unwrap_or(""), self.port),
        }
    }

    pub fn to_socket_addr(&self) -> Option<SocketAddr> {
        self.ip.map(|ip| SocketAddr::new(ip, self.port))
    }
}

impl fmt::Display for AddrSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.fqdn, &self.ip) {
            (Some(fqdn), Some(ip)) => write!(f, "{} ({}):{}", fqdn, ip, self.port),
            (Some(fqdn), None) => write!(f, "{}:{}", fqdn, self.port),
            (None, Some(ip)) => write!(f, "{}:{}", ip, self.port),
            (None, None) => write!(f, ":{}", self.port),
        }
    }
}
