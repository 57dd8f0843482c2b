use crate::context::RequestContext;
use crate::request::Request;

/// Invoked once per connection after both proxy legs have terminated
/// (§4.6). Receives the completed [`Request`] and [`RequestContext`];
/// never returns an error since a finalizer failure must not affect the
/// already-closed connection.
pub trait Finalizer: Send + Sync {
    fn finalize(&self, request: &Request, ctx: &RequestContext);
}

/// The default finalizer: emits a single structured `tracing` event
/// summarizing the connection, mirroring the fields the original
/// implementation logged per closed session.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingFinalizer;

impl Finalizer for LoggingFinalizer {
    fn finalize(&self, request: &Request, ctx: &RequestContext) {
        tracing::info!(
            client = %ctx.client_addr.as_ref().map(|a| a.to_string()).unwrap_or_default(),
            destination = %request.dest_addr,
            real_destination = %request.real_dest_addr,
            matching_rule_id = ctx.matching_rule_id_for_log(),
            proxy_type = ctx.proxy_type.map(|p| p.as_str()).unwrap_or("unknown"),
            proxy_address = %ctx.proxy_address.as_deref().unwrap_or(""),
            request_bytes = request.req_bytes,
            response_bytes = request.resp_bytes,
            "connection closed",
        );
    }
}
