use crate::addr::AddrSpec;
use crate::context::RequestContext;
use crate::request::Request;

/// Optional hook that transparently rewrites a request's destination
/// (§4.4 Policy). When absent, `real_dest_addr` equals `dest_addr`. Takes
/// the context by mutable reference so a rewriter can stash its own
/// extension metadata alongside the recognized fields.
pub trait Rewriter: Send + Sync {
    fn rewrite(&self, request: &Request, ctx: &mut RequestContext) -> AddrSpec;
}
