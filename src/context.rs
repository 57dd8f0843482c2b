use std::collections::HashMap;

use crate::addr::AddrSpec;

/// The identity a [`crate::forwarder::Forwarder`] reports about itself,
/// attached to the [`RequestContext`] by `enrich`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProxyType {
    Direct,
    Socks5,
}

impl ProxyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Socks5 => "socks5",
        }
    }
}

/// Per-request metadata threaded through the request lifecycle: an
/// explicit struct rather than the stringly-typed key/value envelope the
/// original implementation used (see SPEC_FULL.md §9 Design Notes).
///
/// Populated incrementally: the Picker sets `client_addr` and
/// `matching_rule_id`; the selected Forwarder's `enrich` sets `proxy_type`
/// and `proxy_address`. The Finalizer reads the completed context once
/// both proxy legs have reported.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    pub client_addr: Option<AddrSpec>,
    pub matching_rule_id: Option<usize>,
    pub proxy_type: Option<ProxyType>,
    pub proxy_address: Option<String>,

    /// Free-form slots for resolver/rewriter/policy hooks to stash their
    /// own metadata, keyed by a hook-chosen static name. The four fields
    /// above are the only ones the built-in `LoggingFinalizer` reads.
    extensions: HashMap<&'static str, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The wire/log representation of `matching_rule_id`: a valid rule
    /// index, or -1 for "no rule matched, used the default forwarder".
    pub fn matching_rule_id_for_log(&self) -> i64 {
        match self.matching_rule_id {
            Some(id) => id as i64,
            None => -1,
        }
    }

    /// Stashes a hook-supplied value under `key`, overwriting any previous
    /// value for the same key.
    pub fn set_extension(&mut self, key: &'static str, value: impl Into<String>) {
        self.extensions.insert(key, value.into());
    }

    pub fn extension(&self, key: &'static str) -> Option<&str> {
        self.extensions.get(key).map(String::as_str)
    }
}
