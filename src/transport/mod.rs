//! Transport seams of the pool.
//!
//! The pool never speaks a wire protocol itself. It only needs two things
//! from the transport:
//!
//! - a [`Connector`] that opens a fresh connection on demand
//! - a [`Connection`] that knows how to close itself gracefully
//!
//! # Connection Lifecycle
//!
//! 1. `Connector::connect` - Open a connection (handshake, auth)
//! 2. Units of work borrow `&mut Connection` one at a time
//! 3. [`teardown`] - Send a close notification, then close the transport
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `teardown` | Best-effort graceful close |
//! | `websocket` | WebSocket connector and message helpers |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// Best-effort graceful close.
pub mod teardown;

/// WebSocket connector and message helpers.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use teardown::teardown;
pub use websocket::WsConnector;

// ============================================================================
// Connector
// ============================================================================

/// Produces new live connections for a pool.
///
/// Implementations should give up when `ctx` is done, where the transport
/// allows it.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connection type produced by this connector.
    type Conn: Connection;

    /// Opens a new connection.
    ///
    /// # Errors
    ///
    /// Any error; the pool reports it to the caller wrapped in
    /// [`Error::ConnectFailed`](crate::Error::ConnectFailed).
    async fn connect(&self, ctx: &Context) -> Result<Self::Conn>;
}

// ============================================================================
// Connection
// ============================================================================

/// Graceful-close surface of a pooled connection.
#[async_trait]
pub trait Connection: Send + Sized + 'static {
    /// Sends a protocol-level close notification to the peer.
    async fn send_close(&mut self) -> Result<()>;

    /// Closes the underlying transport.
    async fn shutdown(self) -> Result<()>;
}
