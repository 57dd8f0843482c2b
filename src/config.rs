use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::forwarder::Forwarder;
use crate::ratelimit::TokenBucket;
use crate::rule::Rule;

/// Mirrors `tracing`'s severity levels; `loglevel` in the config file picks
/// the baseline and each `-v` CLI flag bumps it one step, per §6.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    /// Raises verbosity by `steps`, clamped at `trace` (never wraps back
    /// around to `error`).
    pub fn bumped(self, steps: u8) -> Self {
        const ORDER: [LogLevel; 5] = [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug, LogLevel::Trace];
        let current = ORDER.iter().position(|l| *l == self).unwrap_or(2);
        let bumped = (current + steps as usize).min(ORDER.len() - 1);
        ORDER[bumped]
    }

    pub fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Text
    }
}

#[derive(Debug, Deserialize)]
struct ForwarderConfig {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RuleConfig {
    subnets: Vec<String>,
    forwarder: ForwarderConfig,
}

#[derive(Debug, Deserialize)]
struct RawConfiguration {
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default)]
    loglevel: LogLevel,
    #[serde(default)]
    logformat: LogFormat,
    #[serde(rename = "defaultForwarder")]
    default_forwarder: Option<ForwarderConfig>,
    #[serde(default)]
    rules: Vec<RuleConfig>,
}

fn default_bind() -> String {
    "127.0.0.1:5757".to_string()
}

/// The fully validated, immutable configuration (§3). Lives for process
/// lifetime behind an `Arc`, shared by every connection task without
/// locking.
#[derive(Debug)]
pub struct Configuration {
    pub bind: SocketAddr,
    pub rules: Vec<Rule>,
    pub default_forwarder: Forwarder,
    pub loglevel: LogLevel,
    pub logformat: LogFormat,

    /// Per-direction token buckets (§4.5 Rate limiting). Not part of the
    /// YAML schema — these are set programmatically by embedders, never
    /// parsed from `config.yaml`.
    pub in_bucket: Option<Arc<TokenBucket>>,
    pub out_bucket: Option<Arc<TokenBucket>>,
}

impl Configuration {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw: RawConfiguration = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfiguration) -> Result<Self, ConfigError> {
        let bind = raw.bind.parse().map_err(|source| ConfigError::InvalidBindAddress {
            address: raw.bind.clone(),
            source,
        })?;

        let default_cfg = raw.default_forwarder.ok_or(ConfigError::MissingDefaultForwarder)?;
        let default_forwarder = build_forwarder(&default_cfg)
            .map_err(|source| ConfigError::InvalidDefaultForwarder { source: Box::new(source) })?;

        let mut rules = Vec::with_capacity(raw.rules.len());
        for (rule_index, rule_cfg) in raw.rules.into_iter().enumerate() {
            let rule = build_rule(rule_cfg)
                .map_err(|source| ConfigError::InvalidRule { rule_index, source: Box::new(source) })?;
            rules.push(rule);
        }

        Ok(Self {
            bind,
            rules,
            default_forwarder,
            loglevel: raw.loglevel,
            logformat: raw.logformat,
            in_bucket: None,
            out_bucket: None,
        })
    }
}

fn build_forwarder(cfg: &ForwarderConfig) -> Result<Forwarder, ConfigError> {
    Forwarder::from_type_and_address(&cfg.kind, cfg.address.as_deref())
}

fn build_rule(cfg: RuleConfig) -> Result<Rule, ConfigError> {
    let forwarder = build_forwarder(&cfg.forwarder)?;
    Rule::new(&cfg.subnets, forwarder)
}
