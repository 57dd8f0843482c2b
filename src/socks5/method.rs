/// Authentication method identifiers negotiated in the first SOCKS5
/// exchange (RFC 1928 §3).
///
/// o  X'00' NO AUTHENTICATION REQUIRED
/// o  X'01' GSSAPI
/// o  X'02' USERNAME/PASSWORD
/// o  X'03' to X'7F' IANA ASSIGNED
/// o  X'80' to X'FE' RESERVED FOR PRIVATE METHODS
/// o  X'FF' NO ACCEPTABLE METHODS
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Socks5Method {
    NoAuth,
    UserPass,
    Other(u8),
    Unacceptable,
}

impl From<u8> for Socks5Method {
    fn from(value: u8) -> Self {
        match value {
            0x00 => Self::NoAuth,
            0x02 => Self::UserPass,
            0xff => Self::Unacceptable,
            other => Self::Other(other),
        }
    }
}

impl From<Socks5Method> for u8 {
    fn from(method: Socks5Method) -> Self {
        match method {
            Socks5Method::NoAuth => 0x00,
            Socks5Method::UserPass => 0x02,
            Socks5Method::Unacceptable => 0xff,
            Socks5Method::Other(value) => value,
        }
    }
}
