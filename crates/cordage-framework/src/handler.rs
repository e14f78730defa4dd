//! The input every handler receives, and the executor type that runs it.
//!
//! Each registry entry stores an [`Executor`]: a type-erased, cloneable tower
//! service from [`Invocation`] to `()`. Guards and other cross-cutting
//! concerns are ordinary tower layers stacked around it.

use std::sync::Arc;

use cordage_core::{GatewayEvent, Interaction, Message, Snowflake};
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use tower::BoxError;
use tower::util::BoxCloneSyncService;

use crate::error::InvocationMismatch;
use crate::router::text::TextArgs;

/// Type-erased handler service.
pub type Executor = BoxCloneSyncService<Invocation, (), BoxError>;

/// What a handler method returns.
pub type HandlerResult = Result<(), BoxError>;

/// One call into a handler.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// A slash command or subcommand.
    Command(Arc<Interaction>),
    /// An autocomplete request.
    AutoComplete(Arc<Interaction>),
    /// A button, select menu or modal submit, with the arguments parsed from
    /// its custom id (leading key excluded).
    Component {
        interaction: Arc<Interaction>,
        args: Vec<String>,
    },
    /// A gateway event.
    Event(Arc<GatewayEvent>),
    /// A prefixed text command with its parsed arguments.
    Text {
        message: Arc<Message>,
        args: TextArgs,
    },
}

impl Invocation {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Command(_) => "command",
            Self::AutoComplete(_) => "auto_complete",
            Self::Component { .. } => "component",
            Self::Event(_) => "event",
            Self::Text { .. } => "text",
        }
    }

    /// The interaction behind a command, autocomplete or component call.
    pub fn interaction(&self) -> Option<&Interaction> {
        match self {
            Self::Command(i) | Self::AutoComplete(i) => Some(i),
            Self::Component { interaction, .. } => Some(interaction),
            _ => None,
        }
    }

    /// The user who triggered the call. Events have none.
    pub fn user_id(&self) -> Option<Snowflake> {
        match self {
            Self::Text { message, .. } => Some(message.author.id),
            Self::Event(_) => None,
            _ => self.interaction().map(|i| i.user.id),
        }
    }
}

/// A ready future failing with [`InvocationMismatch`].
pub(crate) fn mismatch(
    method: &'static str,
    expected: &'static str,
    got: &Invocation,
) -> BoxFuture<'static, HandlerResult> {
    let err = InvocationMismatch {
        method,
        expected,
        got: got.kind_name(),
    };
    future::ready(Err(err.into())).boxed()
}
