/// X'00' succeeded
/// X'01' general SOCKS server failure
/// X'02' connection not allowed by ruleset
/// X'03' Network unreachable
/// X'04' Host unreachable
/// X'05' Connection refused
/// X'06' TTL expired
/// X'07' Command not supported
/// X'08' Address type not supported
/// X'09' to X'FF' unassigned
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Socks5Reply {
    Succeeded,
    ServerFailure,
    RuleFailure,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    CommandNotSupported,
    AddrTypeNotSupported,
    Unassigned(u8),
}

impl From<u8> for Socks5Reply {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::Succeeded,
            0x01 => Self::ServerFailure,
            0x02 => Self::RuleFailure,
            0x03 => Self::NetworkUnreachable,
            0x04 => Self::HostUnreachable,
            0x05 => Self::ConnectionRefused,
            0x06 => Self::TtlExpired,
            0x07 => Self::CommandNotSupported,
            0x08 => Self::AddrTypeNotSupported,
            val => Self::Unassigned(val),
        }
    }
}

impl From<Socks5Reply> for u8 {
    fn from(reply: Socks5Reply) -> Self {
        match reply {
            Socks5Reply::Succeeded => 0x00,
            Socks5Reply::ServerFailure => 0x01,
            Socks5Reply::RuleFailure => 0x02,
            Socks5Reply::NetworkUnreachable => 0x03,
            Socks5Reply::HostUnreachable => 0x04,
            Socks5Reply::ConnectionRefused => 0x05,
            Socks5Reply::TtlExpired => 0x06,
            Socks5Reply::CommandNotSupported => 0x07,
            Socks5Reply::AddrTypeNotSupported => 0x08,
            Socks5Reply::Unassigned(val) => val,
        }
    }
}

/// Classifies a failed outbound dial into the reply code the client should
/// see, per §4.4 Dial. `std::io::ErrorKind` is checked first since it's
/// already normalized by the standard library; the message-substring
/// fallback only fires for the rare error that degrades to `Other`.
pub fn classify_dial_error(err: &std::io::Error) -> Socks5Reply {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::ConnectionRefused => return Socks5Reply::ConnectionRefused,
        ErrorKind::NetworkUnreachable => return Socks5Reply::NetworkUnreachable,
        ErrorKind::HostUnreachable => return Socks5Reply::HostUnreachable,
        _ => {}
    }

    let msg = err.to_string();
    if msg.contains("refused") {
        Socks5Reply::ConnectionRefused
    } else if msg.contains("network is unreachable") {
        Socks5Reply::NetworkUnreachable
    } else {
        Socks5Reply::HostUnreachable
    }
}
