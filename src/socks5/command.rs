use crate::error::SocksError;

/// CONNECT X'01'
/// BIND X'02'
/// UDP ASSOCIATE X'03'
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Socks5Command {
    Connect = 0x01,
    Bind = 0x02,
    Associate = 0x03,
}

impl TryFrom<u8> for Socks5Command {
    type Error = SocksError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Connect),
            0x02 => Ok(Self::Bind),
            0x03 => Ok(Self::Associate),
            val => Err(SocksError::InvalidCommand(val)),
        }
    }
}

impl From<Socks5Command> for u8 {
    fn from(command: Socks5Command) -> Self {
        command as u8
    }
}
