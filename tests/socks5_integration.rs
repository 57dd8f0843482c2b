//! End-to-end scenarios against a real `Server` bound to a loopback socket,
//! exercising the accept loop, the wire protocol, and the proxy engine
//! together rather than any one module in isolation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use socks5_gateway::config::{Configuration, LogFormat, LogLevel};
use socks5_gateway::forwarder::Forwarder;
use socks5_gateway::rule::Rule;
use socks5_gateway::server::Server;

fn config(rules: Vec<Rule>, default_forwarder: Forwarder) -> Configuration {
    Configuration {
        bind: "127.0.0.1:0".parse().unwrap(),
        rules,
        default_forwarder,
        loglevel: LogLevel::Info,
        logformat: LogFormat::Text,
        in_bucket: None,
        out_bucket: None,
    }
}

async fn spawn_server(cfg: Configuration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(Arc::new(cfg));
    tokio::spawn(server.serve(listener));
    addr
}

/// Runs an echo server: accepts one connection, copies whatever it reads
/// straight back until the peer closes.
async fn spawn_echo_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                if stream.write_all(&buf[..n]).await.is_err() {
                    break;
                }
            }
        }
    });
    addr
}

/// A minimal server-side SOCKS5 stub standing in for an onward proxy: it
/// accepts exactly one connection, negotiates NO_AUTH, accepts one CONNECT
/// request (replying success with its own bound address), and then echoes
/// the tunnel's bytes back — it never dials anywhere else itself.
async fn spawn_fake_socks5_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut stream, _)) = listener.accept().await {
            let mut method_req = [0u8; 3];
            stream.read_exact(&mut method_req).await.unwrap();
            stream.write_all(&[0x05, 0x00]).await.unwrap();

            let mut header = [0u8; 4];
            stream.read_exact(&mut header).await.unwrap();
            match header[3] {
                0x01 => {
                    let mut rest = [0u8; 6];
                    stream.read_exact(&mut rest).await.unwrap();
                }
                0x04 => {
                    let mut rest = [0u8; 18];
                    stream.read_exact(&mut rest).await.unwrap();
                }
                0x03 => {
                    let len = stream.read_u8().await.unwrap();
                    let mut rest = vec![0u8; len as usize + 2];
                    stream.read_exact(&mut rest).await.unwrap();
                }
                _ => panic!("unexpected address type from nested client"),
            }

            stream.write_all(&[0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await.unwrap();

            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                if stream.write_all(&buf[..n]).await.is_err() {
                    break;
                }
            }
        }
    });
    addr
}

async fn negotiate(stream: &mut TcpStream) {
    stream.write_all(&[0x05, 0x01, 0x00]).await.unwrap();
    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x00]);
}

fn connect_request(ip: Ipv4Addr, port: u16) -> Vec<u8> {
    let mut frame = vec![0x05, 0x01, 0x00, 0x01];
    frame.extend_from_slice(&ip.octets());
    frame.extend_from_slice(&port.to_be_bytes());
    frame
}

fn bind_request(ip: Ipv4Addr, port: u16) -> Vec<u8> {
    let mut frame = vec![0x05, 0x02, 0x00, 0x01];
    frame.extend_from_slice(&ip.octets());
    frame.extend_from_slice(&port.to_be_bytes());
    frame
}

async fn read_reply_header(stream: &mut TcpStream) -> [u8; 4] {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.unwrap();
    // drain the bound address + port that follows.
    match header[3] {
        0x01 => {
            let mut rest = [0u8; 6];
            stream.read_exact(&mut rest).await.unwrap();
        }
        0x04 => {
            let mut rest = [0u8; 18];
            stream.read_exact(&mut rest).await.unwrap();
        }
        0x03 => {
            let len = stream.read_u8().await.unwrap();
            let mut rest = vec![0u8; len as usize + 2];
            stream.read_exact(&mut rest).await.unwrap();
        }
        _ => {}
    }
    header
}

#[tokio::test]
async fn s1_direct_passthrough_echoes_bytes() {
    let echo_addr = spawn_echo_server().await;

    let server_addr = spawn_server(config(vec![], Forwarder::Direct)).await;

    let mut client = TcpStream::connect(server_addr).await.unwrap();
    negotiate(&mut client).await;

    let (IpAddr::V4(echo_ip), echo_port) = (echo_addr.ip(), echo_addr.port()) else {
        panic!("expected an IPv4 echo address");
    };
    client.write_all(&connect_request(echo_ip, echo_port)).await.unwrap();

    let header = read_reply_header(&mut client).await;
    assert_eq!(header[1], 0x00, "expected succeeded reply");

    client.write_all(b"ping").await.unwrap();
    let mut buf = [0u8; 4];
    client.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"ping");
}

#[tokio::test]
async fn s2_rule_match_dispatches_through_nested_socks5() {
    let upstream_addr = spawn_fake_socks5_upstream().await;

    let rule = Rule::new(
        &["127.0.0.0/8".to_string()],
        Forwarder::socks5(Some(&upstream_addr.to_string())).unwrap(),
    )
    .unwrap();
    let server_addr = spawn_server(config(vec![rule], Forwarder::Direct)).await;

    let mut client = TcpStream::connect(server_addr).await.unwrap();
    negotiate(&mut client).await;

    // The destination need not be reachable directly — the matched rule
    // routes through `upstream_addr`, which never dials it itself.
    client
        .write_all(&connect_request(Ipv4Addr::new(127, 0, 0, 9), 9999))
        .await
        .unwrap();

    let header = read_reply_header(&mut client).await;
    assert_eq!(header[1], 0x00, "expected succeeded reply via the nested upstream");

    client.write_all(b"hello").await.unwrap();
    let mut buf = [0u8; 5];
    client.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"hello");
}

#[tokio::test]
async fn s4_refused_upstream_reports_connection_refused() {
    // Bind then immediately drop to obtain a port nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = listener.local_addr().unwrap();
    drop(listener);

    let server_addr = spawn_server(config(vec![], Forwarder::Direct)).await;

    let mut client = TcpStream::connect(server_addr).await.unwrap();
    negotiate(&mut client).await;

    let IpAddr::V4(dead_ip) = dead_addr.ip() else {
        panic!("expected an IPv4 address");
    };
    client.write_all(&connect_request(dead_ip, dead_addr.port())).await.unwrap();

    let header = read_reply_header(&mut client).await;
    assert_eq!(header[1], 0x05, "expected connectionRefused reply code");
}

#[tokio::test]
async fn s5_bind_command_is_not_supported() {
    let server_addr = spawn_server(config(vec![], Forwarder::Direct)).await;

    let mut client = TcpStream::connect(server_addr).await.unwrap();
    negotiate(&mut client).await;

    client.write_all(&bind_request(Ipv4Addr::LOCALHOST, 1234)).await.unwrap();

    let header = read_reply_header(&mut client).await;
    assert_eq!(header[1], 0x07, "expected commandNotSupported reply code");

    // the connection should now be closed, not entering the proxy phase.
    let mut buf = [0u8; 1];
    let n = client.read(&mut buf).await.unwrap_or(0);
    assert_eq!(n, 0);
}

#[tokio::test]
async fn s6_malformed_address_type_is_rejected() {
    let server_addr = spawn_server(config(vec![], Forwarder::Direct)).await;

    let mut client = TcpStream::connect(server_addr).await.unwrap();
    negotiate(&mut client).await;

    // ATYP 0x02 is not a valid SOCKS5 address type.
    client.write_all(&[0x05, 0x01, 0x00, 0x02]).await.unwrap();

    let mut header = [0u8; 4];
    client.read_exact(&mut header).await.unwrap();
    assert_eq!(header[1], 0x08, "expected addrTypeNotSupported reply code");
}

#[tokio::test]
async fn unacceptable_method_closes_the_connection() {
    let server_addr = spawn_server(config(vec![], Forwarder::Direct)).await;

    let mut client = TcpStream::connect(server_addr).await.unwrap();
    // offer only GSSAPI, which this gateway never accepts.
    client.write_all(&[0x05, 0x01, 0x01]).await.unwrap();

    let mut reply = [0u8; 2];
    client.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0xff]);

    let mut buf = [0u8; 1];
    let n = tokio::time::timeout(Duration::from_millis(200), client.read(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(n, 0);
}
