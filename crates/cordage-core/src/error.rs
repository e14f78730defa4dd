//! Error types shared across the Cordage crates.
//!
//! Framework-level errors (collection, lifecycle, guard rejection) live in
//! `cordage-framework`; this module only covers the platform boundary.

use thiserror::Error;

/// Type-erased error used by handlers and resolvers.
///
/// Identical to `tower::BoxError`, so handler services and core callbacks can
/// exchange errors without conversion.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Remote API Errors
// =============================================================================

/// Errors returned by the remote command API and the gateway.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The gateway is not connected.
    #[error("gateway is not connected")]
    NotConnected,

    /// The platform rejected the call because of rate limiting.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited {
        /// Delay suggested by the platform.
        retry_after_ms: u64,
    },

    /// The platform answered with a non-success status.
    #[error("HTTP error ({status}): {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the platform.
        message: String,
    },

    /// Failed to serialize or deserialize a payload.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Creates an HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a free-form error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for remote API calls.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Client Errors
// =============================================================================

/// Errors raised while bringing a bot client online.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// No token is configured for the bot.
    #[error("no token configured for bot '{bot}'")]
    MissingToken {
        /// Bot name.
        bot: String,
    },

    /// The bot is disabled in configuration.
    #[error("bot '{bot}' is disabled")]
    Disabled {
        /// Bot name.
        bot: String,
    },

    /// The gateway refused the login.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
