use std::time::Instant;

use crate::addr::AddrSpec;
use crate::socks5::command::Socks5Command;

pub const PROXY_BUFFER_LENGTH: usize = 32 * 1024;

/// A per-connection record created once the handshake and request frame
/// are fully parsed (§3). Timestamps are each assigned exactly once, in
/// order (`start ≤ resolve ≤ connect ≤ finish`); byte counters are only
/// meaningful after both proxy legs have reported.
pub struct Request {
    pub version: u8,
    pub command: Socks5Command,
    pub remote_addr: AddrSpec,
    pub dest_addr: AddrSpec,
    pub real_dest_addr: AddrSpec,

    pub start: Instant,
    pub resolve: Option<Instant>,
    pub connect: Option<Instant>,
    pub finish: Option<Instant>,

    pub req_bytes: u64,
    pub resp_bytes: u64,

    pub buf_in: Box<[u8; PROXY_BUFFER_LENGTH]>,
    pub buf_out: Box<[u8; PROXY_BUFFER_LENGTH]>,
}

impl Request {
    pub fn new(command: Socks5Command, remote_addr: AddrSpec, dest_addr: AddrSpec) -> Self {
        let real_dest_addr = dest_addr.clone();
        Self {
            version: 0x05,
            command,
            remote_addr,
            dest_addr,
            real_dest_addr,
            start: Instant::now(),
            resolve: None,
            connect: None,
            finish: None,
            req_bytes: 0,
            resp_bytes: 0,
            buf_in: Box::new([0u8; PROXY_BUFFER_LENGTH]),
            buf_out: Box::new([0u8; PROXY_BUFFER_LENGTH]),
        }
    }

    pub fn mark_resolved(&mut self) {
        self.resolve = Some(Instant::now());
    }

    pub fn mark_connected(&mut self) {
        self.connect = Some(Instant::now());
    }

    pub fn mark_finished(&mut self) {
        self.finish = Some(Instant::now());
    }
}
