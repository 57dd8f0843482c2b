//! The client side of a SOCKS5 CONNECT handshake, used by
//! [`crate::forwarder::Forwarder::Socks5Upstream`] to tunnel through an
//! onward proxy. No authentication is attempted (§4.1).

use std::io;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::addr::AddrSpec;

use super::reply::Socks5Reply;
use super::wire::read_addr_spec;

const NO_AUTH: u8 = 0x00;

/// Opens a TCP connection to `upstream_addr` and drives a CONNECT request
/// for `dest` through it. On success, the returned stream is the
/// established tunnel — writes go to `dest`, reads come from it.
pub async fn connect(upstream_addr: &str, dest: &AddrSpec) -> io::Result<TcpStream> {
    let mut stream = TcpStream::connect(upstream_addr).await?;

    // method negotiation: offer NO_AUTH only.
    stream.write_all(&[0x05, 0x01, NO_AUTH]).await?;

    let mut method_reply = [0u8; 2];
    stream.read_exact(&mut method_reply).await?;
    if method_reply[0] != 0x05 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "unexpected SOCKS version in method reply"));
    }
    if method_reply[1] != NO_AUTH {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            "upstream SOCKS5 server did not accept no-auth",
        ));
    }

    // request: CONNECT to dest.
    let mut request = vec![0x05, 0x01, 0x00];
    append_addr(&mut request, dest);
    stream.write_all(&request).await?;

    // reply.
    let mut header = [0u8; 3];
    stream.read_exact(&mut header).await?;
    if header[0] != 0x05 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "unexpected SOCKS version in reply"));
    }
    let reply = Socks5Reply::from(header[1]);
    // header[2] is the reserved byte, ignored.
    let _bound_addr = read_addr_spec(&mut stream).await.map_err(io::Error::other)?;

    match reply {
        Socks5Reply::Succeeded => Ok(stream),
        Socks5Reply::ConnectionRefused => Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")),
        Socks5Reply::NetworkUnreachable => Err(io::Error::new(io::ErrorKind::NetworkUnreachable, "network is unreachable")),
        Socks5Reply::HostUnreachable => Err(io::Error::new(io::ErrorKind::HostUnreachable, "host unreachable")),
        other => Err(io::Error::other(format!(
            "upstream SOCKS5 server rejected CONNECT with reply code {:?}",
            u8::from(other)
        ))),
    }
}

fn append_addr(buf: &mut Vec<u8>, dest: &AddrSpec) {
    // Reuses write_reply's encoding via a throwaway buffer would require an
    // async writer; the request's DST.ADDR is encoded the same way a
    // reply's BND.ADDR is, so build it inline instead.
    match (&dest.ip, &dest.fqdn) {
        (Some(std::net::IpAddr::V4(ip)), _) => {
            buf.push(0x01);
            buf.extend_from_slice(&ip.octets());
        }
        (Some(std::net::IpAddr::V6(ip)), _) => {
            buf.push(0x04);
            buf.extend_from_slice(&ip.octets());
        }
        (None, Some(fqdn)) => {
            buf.push(0x03);
            buf.push(fqdn.len() as u8);
            buf.extend_from_slice(fqdn.as_bytes());
        }
        (None, None) => {
            buf.push(0x01);
            buf.extend_from_slice(&[0, 0, 0, 0]);
        }
    }
    buf.extend_from_slice(&dest.port.to_be_bytes());
}
