//! Inbound routing: interactions and prefixed text messages.
//!
//! Both routers evaluate one inbound item on the caller's task, run the access
//! checks in [`access`], and hand the bound executor to a spawned task. The
//! result of a route is a [`RouteOutcome`]; nothing the handler returns crosses
//! back into the router.

pub mod access;
pub mod interaction;
pub mod text;

pub use access::Rejection;
pub use interaction::InteractionRouter;
pub use text::{ArgValue, TextArgs, TextRouter};

use futures::future::join_all;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use tracing::{Instrument, debug, debug_span, error, trace};

use crate::error::GuardRejected;
use crate::handler::{Executor, Invocation};

/// How an inbound item was handled.
#[derive(Debug)]
pub enum RouteOutcome {
    /// Not addressed to the router (no prefix configured, or no prefix match).
    Ignored,
    /// No entry matches the derived key.
    NotFound,
    /// An access check failed; the handler was not called.
    Rejected(Rejection),
    /// The handlers are running on the returned tasks. A component id that
    /// matches both a component and a view spawns one task for each.
    Dispatched(Vec<JoinHandle<()>>),
}

impl RouteOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    /// Waits for every dispatched handler to finish. Other outcomes return
    /// at once.
    pub async fn join(self) {
        if let Self::Dispatched(handles) = self {
            for result in join_all(handles).await {
                if let Err(e) = result {
                    error!(error = %e, "Handler task panicked");
                }
            }
        }
    }
}

/// Runs `executor` on a new task, logging its failure.
///
/// A [`GuardRejected`] error is a silent skip, logged at `debug`.
pub(crate) fn spawn_handler(key: String, executor: Executor, invocation: Invocation) -> JoinHandle<()> {
    let span = debug_span!("handler", kind = invocation.kind_name(), key = %key);
    tokio::spawn(
        async move {
            match executor.oneshot(invocation).await {
                Ok(()) => trace!("Handler completed"),
                Err(e) if e.is::<GuardRejected>() => debug!(reason = %e, "Handler skipped"),
                Err(e) => error!(error = %e, "Handler returned an error"),
            }
        }
        .instrument(span),
    )
}
