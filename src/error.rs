use std::path::PathBuf;

/// Errors raised while loading and validating the configuration file.
///
/// Every variant here is fatal: the process logs it and exits before the
/// accept loop ever starts (see [`crate::config::Configuration::load`]).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("defaultForwarder must be specified in configuration file")]
    MissingDefaultForwarder,

    #[error("unknown forwarder type: {0:?}")]
    UnknownForwarderType(String),

    #[error("direct forwarder must not specify an address, got {0:?}")]
    DirectForwarderHasAddress(String),

    #[error("socks5 forwarder requires a non-empty address")]
    Socks5ForwarderMissingAddress,

    #[error("rule #{index}: invalid subnet {subnet:?}: {source}")]
    InvalidSubnet {
        index: usize,
        subnet: String,
        #[source]
        source: ipnet::AddrParseError,
    },

    #[error("a rule must specify at least one subnet")]
    EmptyRuleSubnets,

    #[error("rule #{index} forwarder: {source}")]
    InvalidRuleForwarder {
        index: usize,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("defaultForwarder: {source}")]
    InvalidDefaultForwarder {
        #[source]
        source: Box<ConfigError>,
    },

    #[error("rule #{rule_index}: {source}")]
    InvalidRule {
        rule_index: usize,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("invalid bind address {address:?}: {source}")]
    InvalidBindAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Wire-level errors from the SOCKS5 state machine: truncated frames,
/// version mismatches, and malformed request fields.
///
/// None of these carry a reply code of their own — the caller (the
/// server-side state machine in [`crate::server`], or the nested client
/// handshake in [`crate::socks5::client`]) decides what, if anything, to
/// send back before closing.
#[derive(Debug, thiserror::Error)]
pub enum SocksError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unsupported SOCKS version {0}")]
    UnsupportedVersion(u8),

    #[error("no acceptable authentication method offered")]
    NoAcceptableMethod,

    #[error("username/password authentication failed")]
    AuthenticationFailed,

    #[error("invalid command byte {0}")]
    InvalidCommand(u8),

    #[error("unrecognized address type {0}")]
    UnrecognizedAddrType(u8),

    #[error("converting bytes to a utf-8 string: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("upstream SOCKS5 server rejected the request with reply code {0}")]
    UpstreamRejected(u8),
}
