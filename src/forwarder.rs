use tokio::net::TcpStream;

use crate::context::{ProxyType, RequestContext};
use crate::error::ConfigError;
use crate::socks5::client;

/// An upstream dial strategy (§4.1). The set of strategies is closed and
/// known at config-load time, so this is a tagged enum rather than a
/// trait object — see SPEC_FULL.md §9 Design Notes.
#[derive(Clone, Debug)]
pub enum Forwarder {
    Direct,
    Socks5Upstream { address: String },
}

impl Forwarder {
    /// Builds a `direct` forwarder. Fails if an address was supplied —
    /// direct dials use whatever destination the caller passes to `dial`.
    pub fn direct(address: Option<&str>) -> Result<Self, ConfigError> {
        match address {
            None | Some("") => Ok(Self::Direct),
            Some(addr) => Err(ConfigError::DirectForwarderHasAddress(addr.to_string())),
        }
    }

    /// Builds a `socks5` forwarder pointed at `address`. Fails if the
    /// address is empty.
    pub fn socks5(address: Option<&str>) -> Result<Self, ConfigError> {
        match address {
            None | Some("") => Err(ConfigError::Socks5ForwarderMissingAddress),
            Some(addr) => Ok(Self::Socks5Upstream {
                address: addr.to_string(),
            }),
        }
    }

    pub fn from_type_and_address(kind: &str, address: Option<&str>) -> Result<Self, ConfigError> {
        match kind {
            "direct" => Self::direct(address),
            "socks5" => Self::socks5(address),
            other => Err(ConfigError::UnknownForwarderType(other.to_string())),
        }
    }

    /// Dials `addr` ("host:port") through this forwarder's strategy.
    pub async fn dial(&self, addr: &str) -> std::io::Result<TcpStream> {
        match self {
            Self::Direct => TcpStream::connect(addr).await,
            Self::Socks5Upstream { address } => {
                let dest = parse_host_port(addr)?;
                client::connect(address, &dest).await
            }
        }
    }

    /// Adds this forwarder's identity to the request context. Pure,
    /// non-blocking (§4.1).
    pub fn enrich(&self, ctx: &mut RequestContext) {
        match self {
            Self::Direct => {
                ctx.proxy_type = Some(ProxyType::Direct);
                ctx.proxy_address = None;
            }
            Self::Socks5Upstream { address } => {
                ctx.proxy_type = Some(ProxyType::Socks5);
                ctx.proxy_address = Some(address.clone());
            }
        }
    }
}

/// Splits a "host:port" string (which may carry an IPv4, IPv6, or FQDN
/// host) into an [`crate::addr::AddrSpec`] for the nested SOCKS5 client.
fn parse_host_port(addr: &str) -> std::io::Result<crate::addr::AddrSpec> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing port in address"))?;
    let port: u16 = port
        .parse()
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid port in address"))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<std::net::IpAddr>() {
        Ok(crate::addr::AddrSpec::from_ip(ip, port))
    } else {
        Ok(crate::addr::AddrSpec::from_fqdn(host, port))
    }
}
