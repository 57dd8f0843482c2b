use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::addr::AddrSpec;
use crate::config::Configuration;
use crate::context::RequestContext;
use crate::error::SocksError;
use crate::finalizer::{Finalizer, LoggingFinalizer};
use crate::picker::Picker;
use crate::policy::PolicyGate;
use crate::proxy;
use crate::request::Request;
use crate::resolver::Resolver;
use crate::rewriter::Rewriter;
use crate::socks5::command::Socks5Command;
use crate::socks5::method::Socks5Method;
use crate::socks5::reply::{classify_dial_error, Socks5Reply};
use crate::socks5::wire::{read_addr_spec, write_reply};

/// The connection state machine of §4.4: accept, negotiate, parse,
/// resolve/rewrite/allow, dial, reply, proxy, finalize. One `Server`
/// instance is shared (via `Arc`) across every accepted connection; it
/// holds no per-connection state.
pub struct Server {
    config: Arc<Configuration>,
    resolver: Option<Arc<dyn Resolver>>,
    rewriter: Option<Arc<dyn Rewriter>>,
    policy: Option<Arc<dyn PolicyGate>>,
    finalizer: Arc<dyn Finalizer>,
}

impl Server {
    pub fn new(config: Arc<Configuration>) -> Self {
        Self {
            config,
            resolver: None,
            rewriter: None,
            policy: None,
            finalizer: Arc::new(LoggingFinalizer),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_rewriter(mut self, rewriter: Arc<dyn Rewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn PolicyGate>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_finalizer(mut self, finalizer: Arc<dyn Finalizer>) -> Self {
        self.finalizer = finalizer;
        self
    }

    /// Binds and accepts connections until `ctrl_c` fires. Each accepted
    /// connection runs on its own task; a connection-level error is logged
    /// and never propagates to the accept loop.
    pub async fn run(self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind).await?;
        tracing::info!(bind = %self.config.bind, "listening for connections");
        self.serve(listener).await
    }

    /// Accepts connections on an already-bound `listener` until `ctrl_c`
    /// fires. Split out from [`Server::run`] so tests can bind an
    /// ephemeral port and still observe its address before serving.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let server = Arc::new(self);
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    let server = Arc::clone(&server);
                    tokio::spawn(async move {
                        if let Err(err) = server.handle_connection(stream, peer).await {
                            tracing::warn!(error = %err, peer = %peer, "connection terminated with an error");
                        }
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    return Ok(());
                }
            }
        }
    }

    async fn handle_connection(&self, mut client: TcpStream, peer: SocketAddr) -> Result<(), SocksError> {
        negotiate_method(&mut client).await?;

        let (command, mut dest_addr) = match read_request(&mut client).await {
            Ok(parsed) => parsed,
            Err(SocksError::UnrecognizedAddrType(_)) => {
                write_reply(&mut client, Socks5Reply::AddrTypeNotSupported, None).await?;
                return Ok(());
            }
            Err(SocksError::InvalidCommand(_)) => {
                write_reply(&mut client, Socks5Reply::CommandNotSupported, None).await?;
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        if command != Socks5Command::Connect {
            write_reply(&mut client, Socks5Reply::CommandNotSupported, None).await?;
            return Ok(());
        }

        let remote_addr = AddrSpec::from_socket_addr(peer);
        let mut resolved = false;

        if let Some(resolver) = &self.resolver {
            if dest_addr.ip.is_none() {
                if let Some(fqdn) = dest_addr.fqdn.clone() {
                    match resolver.resolve(&fqdn).await {
                        Ok(ip) => {
                            dest_addr.ip = Some(ip);
                            resolved = true;
                        }
                        Err(_) => {
                            write_reply(&mut client, Socks5Reply::HostUnreachable, None).await?;
                            return Ok(());
                        }
                    }
                }
            }
        }

        let mut request = Request::new(command, remote_addr.clone(), dest_addr);
        if resolved {
            request.mark_resolved();
        }
        let mut ctx = RequestContext::new();

        if let Some(rewriter) = &self.rewriter {
            request.real_dest_addr = rewriter.rewrite(&request, &mut ctx);
        }

        if let Some(policy) = &self.policy {
            if !policy.allow(&request, &mut ctx).await {
                write_reply(&mut client, Socks5Reply::RuleFailure, None).await?;
                return Ok(());
            }
        }

        let forwarder = Picker::new(&self.config).pick(&request.real_dest_addr, &remote_addr, &mut ctx).clone();

        let target = match forwarder.dial(&request.real_dest_addr.address()).await {
            Ok(target) => target,
            Err(err) => {
                let reply = classify_dial_error(&err);
                let _ = write_reply(&mut client, reply, None).await;
                return Ok(());
            }
        };
        request.mark_connected();

        let bound = target.local_addr().ok().map(AddrSpec::from_socket_addr);
        write_reply(&mut client, Socks5Reply::Succeeded, bound.as_ref()).await?;

        let in_bucket = self.config.in_bucket.as_deref();
        let out_bucket = self.config.out_bucket.as_deref();

        let (req_bytes, resp_bytes, result) =
            proxy::run(client, target, &mut request.buf_in[..], &mut request.buf_out[..], in_bucket, out_bucket).await;

        request.req_bytes = req_bytes;
        request.resp_bytes = resp_bytes;
        request.mark_finished();

        self.finalizer.finalize(&request, &ctx);

        result.map_err(SocksError::from)
    }
}

/// RFC 1928 §3: VER NMETHODS METHODS, replying with the chosen method or
/// `0xFF` when none are acceptable. Only `NO AUTHENTICATION REQUIRED` is
/// supported (§1 Non-goals: no username/password authentication).
async fn negotiate_method(stream: &mut TcpStream) -> Result<(), SocksError> {
    let version = stream.read_u8().await?;
    if version != 0x05 {
        return Err(SocksError::UnsupportedVersion(version));
    }

    let nmethods = stream.read_u8().await?;
    let mut methods = vec![0u8; nmethods as usize];
    stream.read_exact(&mut methods).await?;

    let offered: Vec<Socks5Method> = methods.into_iter().map(Socks5Method::from).collect();
    if offered.contains(&Socks5Method::NoAuth) {
        stream.write_all(&[0x05, Socks5Method::NoAuth.into()]).await?;
        Ok(())
    } else {
        stream.write_all(&[0x05, Socks5Method::Unacceptable.into()]).await?;
        Err(SocksError::NoAcceptableMethod)
    }
}

/// RFC 1928 §4: VER CMD RSV ATYP DST.ADDR DST.PORT.
async fn read_request(stream: &mut TcpStream) -> Result<(Socks5Command, AddrSpec), SocksError> {
    let version = stream.read_u8().await?;
    if version != 0x05 {
        return Err(SocksError::UnsupportedVersion(version));
    }

    let command = Socks5Command::try_from(stream.read_u8().await?)?;
    let _reserved = stream.read_u8().await?;
    let dest = read_addr_spec(stream).await?;

    Ok((command, dest))
}
