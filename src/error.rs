//! Error types for the connection pool.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use wspool::{Context, Pool, Result, WsConnector};
//! use wspool::websocket::exchange_text;
//!
//! async fn example(pool: &Pool<WsConnector>) -> Result<()> {
//!     let reply = pool
//!         .submit(&Context::new(), |ws| Box::pin(exchange_text(ws, "ping")))
//!         .await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::ConnectFailed`], [`Error::Connection`], [`Error::Closed`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`] |
//! | Caller | [`Error::Cancelled`], [`Error::DeadlineExceeded`] |
//! | Pool | [`Error::PoolClosed`], [`Error::WorkPanicked`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Custom`] |
//!
//! # Abnormal Close
//!
//! [`Error::is_abnormal_close`] is the classification the pool uses to
//! discard its connection after a unit of work fails. Every other error
//! leaves the connection open for the next caller.

// ============================================================================
// Imports
// ============================================================================

use std::error::Error as StdError;
use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::error::ProtocolError;

// ============================================================================
// Constants
// ============================================================================

/// Close code sent by a peer that is going away (RFC 6455, 1001).
///
/// A close with this code is an expected shutdown, not an abnormal close.
pub const CLOSE_GOING_AWAY: u16 = 1001;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when pool or connector configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The connector failed to produce a connection.
    ///
    /// The connection slot stays empty; the next call tries again.
    #[error("failed to open new connection: {source}")]
    ConnectFailed {
        /// The connector's own error.
        source: Box<Error>,
    },

    /// Connection could not be established or used.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The peer sent a close frame.
    #[error("Connection closed by peer: code={code}, reason={reason:?}")]
    Closed {
        /// Close code from the frame (1005 when the frame carried none).
        code: u16,
        /// Close reason from the frame.
        reason: String,
    },

    /// Transport ended without a close frame.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected message.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // Caller Errors
    // ========================================================================
    /// The caller's context was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// The caller's context deadline passed.
    #[error("Deadline exceeded after {timeout_ms}ms")]
    DeadlineExceeded {
        /// Milliseconds allowed by the deadline.
        timeout_ms: u64,
    },

    // ========================================================================
    // Pool Errors
    // ========================================================================
    /// The pool's actor is no longer running.
    #[error("Pool closed")]
    PoolClosed,

    /// A unit of work panicked.
    ///
    /// The connection it was using is discarded; the pool keeps serving.
    #[error("Unit of work panicked: {message}")]
    WorkPanicked {
        /// Panic payload, when it was a string.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Application error raised by a unit of work.
    #[error("{0}")]
    Custom(#[from] Box<dyn StdError + Send + Sync>),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wraps a connector failure.
    #[inline]
    pub fn connect_failed(source: Error) -> Self {
        Self::ConnectFailed {
            source: Box::new(source),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a peer-close error.
    #[inline]
    pub fn closed(code: u16, reason: impl Into<String>) -> Self {
        Self::Closed {
            code,
            reason: reason.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a deadline exceeded error.
    #[inline]
    pub fn deadline_exceeded(timeout_ms: u64) -> Self {
        Self::DeadlineExceeded { timeout_ms }
    }

    /// Creates a panicked-work error.
    #[inline]
    pub fn work_panicked(message: impl Into<String>) -> Self {
        Self::WorkPanicked {
            message: message.into(),
        }
    }

    /// Wraps an arbitrary application error.
    #[inline]
    pub fn other(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Custom(err.into())
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the transport behind this error is unusable.
    ///
    /// A close frame counts unless its code is [`CLOSE_GOING_AWAY`].
    #[must_use]
    pub fn is_abnormal_close(&self) -> bool {
        match self {
            Self::Closed { code, .. } => *code != CLOSE_GOING_AWAY,
            Self::ConnectionClosed => true,
            Self::WebSocket(err) => matches!(
                err,
                WsError::ConnectionClosed
                    | WsError::AlreadyClosed
                    | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake)
            ),
            _ => false,
        }
    }

    /// Returns `true` if the caller gave up (cancellation or deadline).
    #[inline]
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. }
                | Self::Connection { .. }
                | Self::Closed { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
