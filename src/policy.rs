use async_trait::async_trait;

use crate::context::RequestContext;
use crate::request::Request;

/// Optional allow/deny gate evaluated just before dialing (§4.4 Policy).
/// Returning `false` sends `ruleFailure` and terminates the connection.
/// When absent, every request is allowed.
#[async_trait]
pub trait PolicyGate: Send + Sync {
    async fn allow(&self, request: &Request, ctx: &mut RequestContext) -> bool;
}
