//! Invokes the handler a turn was routed to.

use crate::connection::DispatchMode;
use crate::error::DispatchError;
use crate::router::Route;
use parley_conversation::{Msg, RespMsg};
use tracing::{debug, error, instrument};

/// Sends a turn to its routed handler and returns the reply.
///
/// No route yields an empty reply; the caller decides what to tell the
/// user.
///
/// # Errors
///
/// Returns the handler's transport or reply error unchanged.
#[instrument(skip_all, fields(pkg = route.map(|r| r.package.name()), mode = ?route.map(|r| r.mode)))]
pub async fn invoke(route: Option<&Route>, msg: &Msg) -> Result<RespMsg, DispatchError> {
    let Some(route) = route else {
        debug!("no route, nothing to dispatch");
        return Ok(RespMsg::default());
    };

    debug!(route = %route.key, "sending input");
    match route.mode {
        DispatchMode::Run => debug!("first run"),
        DispatchMode::FollowUp => debug!("follow up"),
    }

    let reply = route
        .package
        .connection
        .call(route.mode, msg)
        .await
        .inspect_err(|e| error!(error = %e, "invalid response"))?;

    debug!(reply_len = reply.sentence.len(), "handler replied");
    Ok(reply)
}
