//! Address-type encoding and the reply frame shared by the server-side
//! request parser (§4.4 RequestParse) and the nested SOCKS5 client used by
//! [`crate::forwarder::Forwarder::Socks5Upstream`].

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::addr::AddrSpec;
use crate::error::SocksError;

use super::reply::Socks5Reply;

const ATYP_IPV4: u8 = 0x01;
const ATYP_FQDN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Reads `ATYP` followed by the address and a big-endian port, per RFC 1928
/// §4. Used both for the client's DST.ADDR in a request and for a reply's
/// BND.ADDR.
pub async fn read_addr_spec<R: AsyncRead + Unpin>(reader: &mut R) -> Result<AddrSpec, SocksError> {
    let addr_type = reader.read_u8().await?;

    let spec = match addr_type {
        ATYP_IPV4 => {
            let mut octets = [0u8; 4];
            reader.read_exact(&mut octets).await?;
            let port = reader.read_u16().await?;
            AddrSpec::from_ip(IpAddr::V4(Ipv4Addr::from(octets)), port)
        }
        ATYP_IPV6 => {
            let mut octets = [0u8; 16];
            reader.read_exact(&mut octets).await?;
            let port = reader.read_u16().await?;
            AddrSpec::from_ip(IpAddr::V6(Ipv6Addr::from(octets)), port)
        }
        ATYP_FQDN => {
            let len = reader.read_u8().await? as usize;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf).await?;
            let fqdn = String::from_utf8(buf)?;
            let port = reader.read_u16().await?;
            AddrSpec::from_fqdn(fqdn, port)
        }
        other => return Err(SocksError::UnrecognizedAddrType(other)),
    };

    Ok(spec)
}

/// Encodes `addr` the way §4.4 "Reply frame construction" specifies: a v4
/// or v4-mapped-v6 IP is emitted as ATYP 0x01, any other IP as ATYP 0x04,
/// and an FQDN-only address as a length-prefixed ATYP 0x03.
fn encode_addr_body(addr: Option<&AddrSpec>) -> (u8, Vec<u8>, u16) {
    match addr {
        None => (ATYP_IPV4, vec![0, 0, 0, 0], 0),
        Some(addr) => match addr.ip {
            Some(IpAddr::V4(ip)) => (ATYP_IPV4, ip.octets().to_vec(), addr.port),
            Some(IpAddr::V6(ip)) => match ip.to_ipv4_mapped() {
                Some(v4) => (ATYP_IPV4, v4.octets().to_vec(), addr.port),
                None => (ATYP_IPV6, ip.octets().to_vec(), addr.port),
            },
            None => {
                let fqdn = addr.fqdn.as_deref().unwrap_or("");
                let mut body = vec![fqdn.len() as u8];
                body.extend_from_slice(fqdn.as_bytes());
                (ATYP_FQDN, body, addr.port)
            }
        },
    }
}

/// Writes a full SOCKS5 reply frame: `VER STATUS RSV ATYP ADDR PORT`.
pub async fn write_reply<W: AsyncWrite + Unpin>(
    writer: &mut W,
    reply: Socks5Reply,
    bound_addr: Option<&AddrSpec>,
) -> io::Result<()> {
    let (atyp, body, port) = encode_addr_body(bound_addr);

    let mut frame = Vec::with_capacity(6 + body.len());
    frame.push(0x05);
    frame.push(reply.into());
    frame.push(0x00);
    frame.push(atyp);
    frame.extend_from_slice(&body);
    frame.extend_from_slice(&port.to_be_bytes());

    writer.write_all(&frame).await
}
