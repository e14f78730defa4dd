//! Error types for the Cordage framework.

use thiserror::Error;
use tower::BoxError;

/// Returned by a [`Guard`](crate::guard::Guard) layer when access is denied.
///
/// The routers recognise this error and skip the handler silently. All other
/// errors are treated as genuine failures.
#[derive(Debug, Clone, Error)]
#[error("invocation rejected by guard '{guard}'")]
pub struct GuardRejected {
    /// Type name of the guard that said no.
    pub guard: &'static str,
}

/// A handler was invoked with an input of the wrong kind.
#[derive(Debug, Clone, Error)]
#[error("method '{method}' expects a {expected} invocation, got {got}")]
pub struct InvocationMismatch {
    pub method: &'static str,
    pub expected: &'static str,
    pub got: &'static str,
}

/// Errors raised while collecting one module or view.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The source carries no module tag.
    #[error("'{type_name}' is not tagged as a module")]
    NotAModule { type_name: &'static str },

    /// The factory failed to build the instance.
    #[error("failed to instantiate module '{module}': {source}")]
    Instantiate {
        module: String,
        #[source]
        source: BoxError,
    },

    /// The module's `on_load` hook failed.
    #[error("module '{module}' failed to load: {source}")]
    Load {
        module: String,
        #[source]
        source: BoxError,
    },

    /// A tagged method could not be bound to the instance.
    #[error("method '{method}' of module '{module}' could not be bound")]
    Bind { module: String, method: &'static str },
}

/// Errors raised by module enable/disable.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// No module matches the given key.
    #[error("module not found: {0}")]
    ModuleNotFound(String),

    /// The enable or disable hook failed; the module state is unchanged.
    #[error("{hook} hook of module '{module}' failed: {source}")]
    Hook {
        module: String,
        hook: &'static str,
        #[source]
        source: BoxError,
    },
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors raised when scheduling a job.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JobError {
    /// An interval job must have a non-zero period.
    #[error("job '{0}' has a zero interval")]
    ZeroInterval(String),
}
